//! Error and outcome types.
//!
//! There is no user-facing exception model on the device: invalid input is
//! guard-and-drop (the function returns a neutral value and mutates
//! nothing), and persistent-store failures degrade to defaults. The types
//! here exist so the fallible paths stay typed and testable on the host.
//! All variants are `Copy` so they can be passed around without allocation.

use core::fmt;

/// Why a stored settings image was rejected at load time.
///
/// The four variants correspond to the four validation levels applied in
/// order by [`crate::store::load`]; the first failing level short-circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// The magic word at the base of the image did not match.
    BadMagic,
    /// The schema version byte did not match the current layout version.
    SchemaMismatch { stored: u8 },
    /// The XOR checksum over the settings bytes did not match.
    ChecksumMismatch,
    /// A settings field was at or above its exclusive upper bound.
    FieldOutOfRange { field: u8 },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => write!(f, "magic word mismatch"),
            Self::SchemaMismatch { stored } => {
                write!(f, "schema version mismatch (stored {stored})")
            }
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::FieldOutOfRange { field } => {
                write!(f, "settings field {field} out of range")
            }
        }
    }
}

/// How the startup sequence completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// Settings were loaded from EEPROM and passed all validation levels.
    Loaded,
    /// The stored image was missing or invalid; defaults are in effect.
    Defaults,
    /// Both buttons were held from cold boot; the store was cleared and
    /// defaults were written back.
    FactoryReset,
}

impl fmt::Display for StartupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded => write!(f, "settings loaded"),
            Self::Defaults => write!(f, "defaults in effect"),
            Self::FactoryReset => write!(f, "factory reset performed"),
        }
    }
}

//! Settings persistence.
//!
//! EEPROM layout (all addresses fixed, words little-endian):
//!
//! | Offset | Size | Content                              |
//! |-------:|-----:|--------------------------------------|
//! | 0x00   | 2    | Magic word 0x474B ("GK")             |
//! | 0x02   | 1    | Schema version                       |
//! | 0x03   | 8    | Settings record                      |
//! | 0x10   | 1    | XOR checksum over the settings bytes |
//!
//! Loading validates in four short-circuiting levels: magic, schema,
//! checksum, then per-field range. Any failure is reported to the startup
//! path, which falls back to defaults; nothing here panics or retries.
//! Saving relies on the HAL's update semantics, so rewriting an unchanged
//! record costs no EEPROM wear.

use log::warn;

use crate::config::Settings;
use crate::error::SettingsError;
use crate::hal::Hal;

pub const MAGIC_ADDR: u16 = 0x00;
pub const SCHEMA_ADDR: u16 = 0x02;
pub const SETTINGS_ADDR: u16 = 0x03;
pub const CHECKSUM_ADDR: u16 = 0x10;

/// "GK" in ASCII.
pub const MAGIC: u16 = 0x474B;

/// Bump when the settings record layout changes.
/// Version 2: per-mode configuration indices.
pub const SCHEMA_VERSION: u8 = 2;

/// Write magic, schema, record and checksum.
pub fn save(hal: &mut impl Hal, settings: &Settings) {
    hal.eeprom_write_word(MAGIC_ADDR, MAGIC);
    hal.eeprom_write_byte(SCHEMA_ADDR, SCHEMA_VERSION);

    let bytes = settings.to_bytes();
    for (i, b) in bytes.iter().enumerate() {
        hal.eeprom_write_byte(SETTINGS_ADDR + i as u16, *b);
    }

    hal.eeprom_write_byte(CHECKSUM_ADDR, settings.checksum());
}

/// Validate and load the stored record.
pub fn load(hal: &impl Hal) -> Result<Settings, SettingsError> {
    // Level 1: magic word.
    if hal.eeprom_read_word(MAGIC_ADDR) != MAGIC {
        return Err(SettingsError::BadMagic);
    }

    // Level 2: schema version. A mismatch could attempt migration here;
    // for now it is treated as invalid.
    let schema = hal.eeprom_read_byte(SCHEMA_ADDR);
    if schema != SCHEMA_VERSION {
        return Err(SettingsError::SchemaMismatch { stored: schema });
    }

    // Level 3: checksum over the raw bytes.
    let mut bytes = [0u8; Settings::SIZE];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = hal.eeprom_read_byte(SETTINGS_ADDR + i as u16);
    }
    let settings = Settings::from_bytes(bytes);
    if hal.eeprom_read_byte(CHECKSUM_ADDR) != settings.checksum() {
        return Err(SettingsError::ChecksumMismatch);
    }

    // Level 4: per-field range.
    if let Err(field) = settings.validate() {
        warn!("settings field {field} out of range");
        return Err(SettingsError::FieldOutOfRange { field });
    }

    Ok(settings)
}

/// Invalidate the stored image by erasing the magic word.
pub fn clear(hal: &mut impl Hal) {
    hal.eeprom_write_word(MAGIC_ADDR, 0xFFFF);
}

//! Persistent settings record and mode configuration tables.
//!
//! The tables map the small indices stored in EEPROM to runtime values.
//! All of them are immutable and can live in flash on the target; the
//! indices themselves are what persists (see [`crate::store`] for the
//! on-wire image).

use crate::modes::Mode;

/// Trigger pulse durations in milliseconds, indexed by
/// [`Settings::trigger_pulse_idx`].
pub const TRIGGER_PULSE_VALUES: [u16; 4] = [10, 50, 100, 1];

/// Clock divider ratios, indexed by [`Settings::divide_divisor_idx`].
pub const DIVIDE_DIVISOR_VALUES: [u8; 4] = [2, 4, 8, 24];

/// Cycle periods in milliseconds (60000 / BPM), indexed by
/// [`Settings::cycle_tempo_idx`].
pub const CYCLE_PERIOD_VALUES: [u16; 5] = [1000, 750, 600, 500, 375];

/// BPM display values matching [`CYCLE_PERIOD_VALUES`] (UI feedback only).
pub const CYCLE_BPM_VALUES: [u8; 5] = [60, 80, 100, 120, 160];

/// Fixed output pulse length for divide and cycle pulses.
pub const OUTPUT_PULSE_MS: u16 = 10;

/// Which input transitions arm the trigger pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerEdge {
    Rising = 0,
    Falling = 1,
    Both = 2,
}

impl TriggerEdge {
    pub const COUNT: u8 = 3;

    pub fn from_index(idx: u8) -> Self {
        match idx {
            0 => Self::Rising,
            1 => Self::Falling,
            2 => Self::Both,
            _ => {
                debug_assert!(false, "invalid trigger edge index: {idx}");
                Self::Rising
            }
        }
    }
}

/// Which input transition flips the toggle output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ToggleEdge {
    Rising = 0,
    Falling = 1,
}

impl ToggleEdge {
    pub const COUNT: u8 = 2;

    pub fn from_index(idx: u8) -> Self {
        match idx {
            1 => Self::Falling,
            _ => Self::Rising,
        }
    }
}

/// Whether button A acts as a manual gate trigger in gate mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GateButtonMode {
    Off = 0,
    Manual = 1,
}

impl GateButtonMode {
    pub const COUNT: u8 = 2;
}

/// The persistent settings record.
///
/// Eight bytes, stored verbatim in EEPROM behind a magic word, schema
/// version and XOR checksum. Each field is a small index into one of the
/// tables above; `reserved` pads the record to its fixed size and carries
/// no meaning yet.
///
/// When the layout changes, bump [`crate::store::SCHEMA_VERSION`] and keep
/// [`Settings::FIELD_LIMITS`] in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Active mode ordinal (see [`Mode`]).
    pub mode: u8,
    /// Trigger pulse length index into [`TRIGGER_PULSE_VALUES`].
    pub trigger_pulse_idx: u8,
    /// Trigger edge index (see [`TriggerEdge`]).
    pub trigger_edge: u8,
    /// Divide ratio index into [`DIVIDE_DIVISOR_VALUES`].
    pub divide_divisor_idx: u8,
    /// Cycle tempo index into [`CYCLE_PERIOD_VALUES`].
    pub cycle_tempo_idx: u8,
    /// Toggle edge index (see [`ToggleEdge`]).
    pub toggle_edge: u8,
    /// Gate-mode button A behavior (see [`GateButtonMode`]).
    pub gate_a_mode: u8,
    /// Future expansion; never validated.
    pub reserved: u8,
}

impl Settings {
    /// Size of the packed record in bytes.
    pub const SIZE: usize = 8;

    /// Exclusive upper bound per field, in field order.
    /// A limit of 0 means the field is not validated.
    pub const FIELD_LIMITS: [u8; Self::SIZE] = [
        Mode::COUNT,
        TRIGGER_PULSE_VALUES.len() as u8,
        TriggerEdge::COUNT,
        DIVIDE_DIVISOR_VALUES.len() as u8,
        CYCLE_PERIOD_VALUES.len() as u8,
        ToggleEdge::COUNT,
        GateButtonMode::COUNT,
        0,
    ];

    /// Pack the record into its EEPROM byte order.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        [
            self.mode,
            self.trigger_pulse_idx,
            self.trigger_edge,
            self.divide_divisor_idx,
            self.cycle_tempo_idx,
            self.toggle_edge,
            self.gate_a_mode,
            self.reserved,
        ]
    }

    /// Unpack a record from its EEPROM byte order. No validation here;
    /// see [`Settings::validate`].
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self {
            mode: bytes[0],
            trigger_pulse_idx: bytes[1],
            trigger_edge: bytes[2],
            divide_divisor_idx: bytes[3],
            cycle_tempo_idx: bytes[4],
            toggle_edge: bytes[5],
            gate_a_mode: bytes[6],
            reserved: bytes[7],
        }
    }

    /// XOR checksum over the packed bytes.
    pub fn checksum(&self) -> u8 {
        self.to_bytes().iter().fold(0, |acc, b| acc ^ b)
    }

    /// Index of the first field at or above its limit, if any.
    pub fn validate(&self) -> Result<(), u8> {
        let bytes = self.to_bytes();
        for (i, (&value, &limit)) in bytes.iter().zip(Self::FIELD_LIMITS.iter()).enumerate() {
            if limit > 0 && value >= limit {
                return Err(i as u8);
            }
        }
        Ok(())
    }

    // -- Typed accessors used by the mode handlers --

    pub fn trigger_pulse_ms(&self) -> u16 {
        TRIGGER_PULSE_VALUES[self.trigger_pulse_idx as usize % TRIGGER_PULSE_VALUES.len()]
    }

    pub fn trigger_edge(&self) -> TriggerEdge {
        TriggerEdge::from_index(self.trigger_edge)
    }

    pub fn divide_divisor(&self) -> u8 {
        DIVIDE_DIVISOR_VALUES[self.divide_divisor_idx as usize % DIVIDE_DIVISOR_VALUES.len()]
    }

    pub fn cycle_period_ms(&self) -> u16 {
        CYCLE_PERIOD_VALUES[self.cycle_tempo_idx as usize % CYCLE_PERIOD_VALUES.len()]
    }

    pub fn toggle_edge(&self) -> ToggleEdge {
        ToggleEdge::from_index(self.toggle_edge)
    }

    pub fn gate_a_manual(&self) -> bool {
        self.gate_a_mode == GateButtonMode::Manual as u8
    }
}

impl Default for Settings {
    /// All indices zero: gate mode, 10 ms pulse, rising edges, /2 divide,
    /// 60 BPM cycle, button A disabled.
    fn default() -> Self {
        Self::from_bytes([0; Self::SIZE])
    }
}

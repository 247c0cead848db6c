//! Signal-processing modes.
//!
//! Each mode transforms the per-tick input bit into the output bit:
//!
//! | Mode    | Transform                                          |
//! |---------|----------------------------------------------------|
//! | Gate    | Output follows input                               |
//! | Trigger | Configured input edge starts a fixed-length pulse  |
//! | Toggle  | Configured input edge flips the output             |
//! | Divide  | Every Nth rising edge emits a short pulse          |
//! | Cycle   | Free-running clock, toggles every half period      |
//!
//! Only one mode is live at a time, so per-mode state shares memory
//! through the [`ModeContext`] tagged union. The coordinator re-seeds the
//! union from settings whenever the mode or its governing setting changes,
//! which means every mode except gate starts with its output low.

use crate::config::{Settings, ToggleEdge, TriggerEdge, OUTPUT_PULSE_MS};

/// Mode ordinals. Persisted in the settings record, so the discriminants
/// are part of the EEPROM schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    Gate = 0,
    Trigger = 1,
    Toggle = 2,
    Divide = 3,
    Cycle = 4,
}

impl Mode {
    pub const COUNT: u8 = 5;

    /// Convert a stored ordinal back to a mode. Falls back to gate on an
    /// out-of-range value (settings are validated at load, so this only
    /// fires on programming errors).
    pub fn from_index(idx: u8) -> Self {
        match idx {
            0 => Self::Gate,
            1 => Self::Trigger,
            2 => Self::Toggle,
            3 => Self::Divide,
            4 => Self::Cycle,
            _ => {
                debug_assert!(false, "invalid mode index: {idx}");
                Self::Gate
            }
        }
    }

    /// The next mode in the cycle order (wraps).
    pub fn next(self) -> Self {
        Self::from_index((self as u8 + 1) % Self::COUNT)
    }
}

/// Per-mode state. One variant live at a time; memory is reused on mode
/// change. The output bit stored in the active variant is the canonical
/// current output.
#[derive(Debug, Clone)]
pub enum ModeContext {
    Gate {
        output: bool,
    },
    Trigger {
        output: bool,
        last_input: bool,
        pulse_start: u32,
        pulse_ms: u16,
        edge: TriggerEdge,
    },
    Toggle {
        output: bool,
        last_input: bool,
        edge: ToggleEdge,
    },
    Divide {
        output: bool,
        last_input: bool,
        counter: u8,
        divisor: u8,
        pulse_start: u32,
    },
    Cycle {
        output: bool,
        running: bool,
        last_toggle: u32,
        period_ms: u16,
        phase: u8,
    },
}

impl ModeContext {
    /// Seed a fresh context for `mode` from the settings record.
    pub fn for_mode(mode: Mode, settings: &Settings) -> Self {
        match mode {
            Mode::Gate => Self::Gate { output: false },
            Mode::Trigger => Self::Trigger {
                output: false,
                last_input: false,
                pulse_start: 0,
                pulse_ms: settings.trigger_pulse_ms(),
                edge: settings.trigger_edge(),
            },
            Mode::Toggle => Self::Toggle {
                output: false,
                last_input: false,
                edge: settings.toggle_edge(),
            },
            Mode::Divide => Self::Divide {
                output: false,
                last_input: false,
                counter: 0,
                divisor: settings.divide_divisor(),
                pulse_start: 0,
            },
            Mode::Cycle => Self::Cycle {
                output: false,
                running: false,
                last_toggle: 0,
                period_ms: settings.cycle_period_ms(),
                phase: 0,
            },
        }
    }

    /// The mode this context belongs to.
    pub fn mode(&self) -> Mode {
        match self {
            Self::Gate { .. } => Mode::Gate,
            Self::Trigger { .. } => Mode::Trigger,
            Self::Toggle { .. } => Mode::Toggle,
            Self::Divide { .. } => Mode::Divide,
            Self::Cycle { .. } => Mode::Cycle,
        }
    }

    /// Run one tick of the active mode. Returns the new output bit.
    pub fn process(&mut self, input: bool, now: u32) -> bool {
        match self {
            Self::Gate { output } => {
                *output = input;
                *output
            }

            Self::Trigger {
                output,
                last_input,
                pulse_start,
                pulse_ms,
                edge,
            } => {
                let armed = match edge {
                    TriggerEdge::Rising => input && !*last_input,
                    TriggerEdge::Falling => !input && *last_input,
                    TriggerEdge::Both => input != *last_input,
                };
                // Retriggering while the pulse is still high is ignored;
                // the pulse is never extended.
                if armed && !*output {
                    *output = true;
                    *pulse_start = now;
                }
                if *output && now.wrapping_sub(*pulse_start) >= *pulse_ms as u32 {
                    *output = false;
                }
                *last_input = input;
                *output
            }

            Self::Toggle {
                output,
                last_input,
                edge,
            } => {
                let flip = match edge {
                    ToggleEdge::Rising => input && !*last_input,
                    ToggleEdge::Falling => !input && *last_input,
                };
                if flip {
                    *output = !*output;
                }
                *last_input = input;
                *output
            }

            Self::Divide {
                output,
                last_input,
                counter,
                divisor,
                pulse_start,
            } => {
                if input && !*last_input {
                    *counter += 1;
                    if *counter >= *divisor {
                        *counter = 0;
                        if !*output {
                            *output = true;
                            *pulse_start = now;
                        }
                    }
                }
                if *output && now.wrapping_sub(*pulse_start) >= OUTPUT_PULSE_MS as u32 {
                    *output = false;
                }
                *last_input = input;
                *output
            }

            Self::Cycle {
                output,
                running,
                last_toggle,
                period_ms,
                phase,
            } => {
                // Input is ignored; the clock free-runs from first tick.
                if !*running {
                    *running = true;
                    *last_toggle = now;
                }
                let half = (*period_ms as u32 / 2).max(1);
                if now.wrapping_sub(*last_toggle) >= half {
                    *output = !*output;
                    *last_toggle = now;
                }
                let elapsed = now.wrapping_sub(*last_toggle);
                *phase = ((elapsed * 255) / half).min(255) as u8;
                *output
            }
        }
    }

    /// The canonical current output bit.
    pub fn output(&self) -> bool {
        match self {
            Self::Gate { output }
            | Self::Trigger { output, .. }
            | Self::Toggle { output, .. }
            | Self::Divide { output, .. }
            | Self::Cycle { output, .. } => *output,
        }
    }

    /// Activity-LED brightness for this tick. Binary for most modes;
    /// cycle fades from full to dark across the high half-period so the
    /// indicator breathes with the clock.
    pub fn activity_brightness(&self) -> u8 {
        match self {
            Self::Cycle { output, phase, .. } => {
                if *output {
                    255u8.saturating_sub(*phase)
                } else {
                    0
                }
            }
            other => {
                if other.output() {
                    255
                } else {
                    0
                }
            }
        }
    }
}

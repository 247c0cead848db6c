//! CV input with software Schmitt-trigger hysteresis.
//!
//! Converts 8-bit ADC readings (0-255 mapping 0-5 V) into a digital level.
//! The level flips low→high only when the sample exceeds the high
//! threshold and high→low only when it drops below the low threshold; the
//! band in between (1 V wide by default) retains the current level and
//! absorbs noise. An ADC timeout reads back as mid-scale (HAL contract),
//! which sits inside the default band and therefore holds the level.

/// Default low→high threshold: 2.5 V on the 0-5 V range.
pub const DEFAULT_HIGH_THRESHOLD: u8 = 128;
/// Default high→low threshold: 1.5 V on the 0-5 V range.
pub const DEFAULT_LOW_THRESHOLD: u8 = 77;

#[derive(Debug, Clone)]
pub struct CvInput {
    high_threshold: u8,
    low_threshold: u8,
    last_adc_value: u8,
    current_state: bool,
}

impl CvInput {
    pub fn new() -> Self {
        Self::with_thresholds(DEFAULT_HIGH_THRESHOLD, DEFAULT_LOW_THRESHOLD)
    }

    /// Custom thresholds. The core never assumes the band is symmetric;
    /// callers must keep `low < high`.
    pub fn with_thresholds(high: u8, low: u8) -> Self {
        debug_assert!(low < high, "hysteresis band inverted");
        Self {
            high_threshold: high,
            low_threshold: low,
            last_adc_value: 0,
            current_state: false,
        }
    }

    /// Apply hysteresis to a new sample and return the digital level.
    pub fn update(&mut self, adc_value: u8) -> bool {
        self.last_adc_value = adc_value;

        if self.current_state {
            if adc_value < self.low_threshold {
                self.current_state = false;
            }
        } else if adc_value > self.high_threshold {
            self.current_state = true;
        }

        self.current_state
    }

    pub fn state(&self) -> bool {
        self.current_state
    }

    /// Most recent raw sample, for diagnostics.
    pub fn last_adc_value(&self) -> u8 {
        self.last_adc_value
    }
}

impl Default for CvInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Diagnostic conversion: 255 counts = 5000 mV.
pub fn adc_to_millivolts(adc_value: u8) -> u16 {
    ((adc_value as u32 * 5000) / 255) as u16
}

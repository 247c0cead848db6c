//! Hardware abstraction port.
//!
//! The [`Hal`] trait is the narrow capability set the core consumes:
//! digital pins, a millisecond timer, the non-volatile byte store, one ADC
//! channel, and the watchdog. Production builds implement it over the MCU
//! registers; the test suite and simulator use [`MockHal`].
//!
//! Contract notes an implementation must honor:
//!
//! - Buttons are active-low; the core inverts the raw sample itself.
//! - `millis` is a monotonic u32 that wraps after ~49 days. All core
//!   timing is relative differencing, so the wrap is harmless.
//! - `adc_read` returns the mid-scale value 128 when the conversion times
//!   out. Mid-scale sits inside the CV hysteresis band for the default
//!   thresholds, so a transient fault holds the current digital level.
//! - EEPROM word access is little-endian (low byte at the lower address).
//! - Byte writes must skip the physical write when the stored value
//!   already matches, so re-saving unchanged settings causes zero wear.
//! - `wdt_enable` selects a short (~250 ms) timeout; the tick loop must
//!   call `wdt_reset` every iteration.

/// Default ADC channel for the CV input.
pub const CV_ADC_CHANNEL: u8 = 3;

/// Value `adc_read` must return when the conversion times out.
pub const ADC_TIMEOUT_VALUE: u8 = 128;

pub trait Hal {
    /// Maximum valid pin number, for sanity checks during init.
    fn max_pin(&self) -> u8;

    /// Primary button (menu/mode), active-low.
    fn button_a_pin(&self) -> u8;
    /// Secondary button (value/action), active-low.
    fn button_b_pin(&self) -> u8;
    /// Signal output; also drives the output LED through a buffer.
    fn sig_out_pin(&self) -> u8;

    /// Configure pin directions and pull-ups.
    fn init(&mut self);
    fn set_pin(&mut self, pin: u8);
    fn clear_pin(&mut self, pin: u8);
    fn toggle_pin(&mut self, pin: u8);
    /// Raw electrical level; `true` = high.
    fn read_pin(&self, pin: u8) -> bool;

    fn init_timer(&mut self);
    /// Milliseconds since boot, wrapping.
    fn millis(&self) -> u32;
    /// Blocking delay. Only the startup sequence uses this.
    fn delay_ms(&mut self, ms: u32);

    fn eeprom_read_byte(&self, addr: u16) -> u8;
    fn eeprom_write_byte(&mut self, addr: u16, value: u8);
    fn eeprom_read_word(&self, addr: u16) -> u16;
    fn eeprom_write_word(&mut self, addr: u16, value: u16);

    /// Read an 8-bit sample from the given ADC channel.
    fn adc_read(&mut self, channel: u8) -> u8;

    fn wdt_enable(&mut self);
    fn wdt_reset(&mut self);
    fn wdt_disable(&mut self);
}

// ---------------------------------------------------------------------------
// In-memory HAL for host tests and the simulator
// ---------------------------------------------------------------------------

/// Number of pins the mock models (PB0..PB5 on the reference hardware).
pub const MOCK_PIN_COUNT: usize = 6;

const MOCK_EEPROM_SIZE: usize = 32;

/// In-memory [`Hal`] backend.
///
/// Pins idle high (external pull-ups), EEPROM starts erased (0xFF), the
/// ADC returns a settable value (default mid-scale), and time advances
/// only when the test asks for it. `delay_ms` advances the clock so the
/// blocking startup paths terminate under test.
pub struct MockHal {
    /// Electrical pin levels; index = pin number.
    pub levels: [bool; MOCK_PIN_COUNT],
    /// Count of `toggle_pin` calls per pin (factory-reset feedback).
    pub toggles: [u16; MOCK_PIN_COUNT],
    pub eeprom: [u8; MOCK_EEPROM_SIZE],
    /// Count of physical EEPROM byte writes (wear accounting).
    pub eeprom_writes: u32,
    /// Next value returned by `adc_read`.
    pub adc_value: u8,
    /// When false, `millis` is frozen (simulates a dead Timer0 ISR).
    pub timer_running: bool,
    pub wdt_enabled: bool,
    pub wdt_resets: u32,
    now: u32,
}

impl MockHal {
    pub fn new() -> Self {
        Self {
            levels: [true; MOCK_PIN_COUNT],
            toggles: [0; MOCK_PIN_COUNT],
            eeprom: [0xFF; MOCK_EEPROM_SIZE],
            eeprom_writes: 0,
            adc_value: ADC_TIMEOUT_VALUE,
            timer_running: true,
            wdt_enabled: false,
            wdt_resets: 0,
            now: 0,
        }
    }

    /// Advance the virtual clock without running any core code.
    pub fn advance_time(&mut self, ms: u32) {
        if self.timer_running {
            self.now = self.now.wrapping_add(ms);
        }
    }

    /// Reset the virtual clock to zero (test isolation).
    pub fn reset_time(&mut self) {
        self.now = 0;
    }

    /// Drive button A: `true` = pressed (pin pulled low).
    pub fn press_a(&mut self, pressed: bool) {
        self.levels[BUTTON_A_PIN as usize] = !pressed;
    }

    /// Drive button B: `true` = pressed (pin pulled low).
    pub fn press_b(&mut self, pressed: bool) {
        self.levels[BUTTON_B_PIN as usize] = !pressed;
    }
}

impl Default for MockHal {
    fn default() -> Self {
        Self::new()
    }
}

/// Pin assignments of the reference hardware.
pub const BUTTON_A_PIN: u8 = 2;
pub const BUTTON_B_PIN: u8 = 4;
pub const SIG_OUT_PIN: u8 = 1;

impl Hal for MockHal {
    fn max_pin(&self) -> u8 {
        (MOCK_PIN_COUNT - 1) as u8
    }

    fn button_a_pin(&self) -> u8 {
        BUTTON_A_PIN
    }

    fn button_b_pin(&self) -> u8 {
        BUTTON_B_PIN
    }

    fn sig_out_pin(&self) -> u8 {
        SIG_OUT_PIN
    }

    fn init(&mut self) {
        // Output pin starts low; button inputs idle high on pull-ups.
        self.levels[SIG_OUT_PIN as usize] = false;
    }

    fn set_pin(&mut self, pin: u8) {
        if let Some(level) = self.levels.get_mut(pin as usize) {
            *level = true;
        }
    }

    fn clear_pin(&mut self, pin: u8) {
        if let Some(level) = self.levels.get_mut(pin as usize) {
            *level = false;
        }
    }

    fn toggle_pin(&mut self, pin: u8) {
        if let Some(level) = self.levels.get_mut(pin as usize) {
            *level = !*level;
            self.toggles[pin as usize] = self.toggles[pin as usize].saturating_add(1);
        }
    }

    fn read_pin(&self, pin: u8) -> bool {
        self.levels.get(pin as usize).copied().unwrap_or(false)
    }

    fn init_timer(&mut self) {}

    fn millis(&self) -> u32 {
        self.now
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance_time(ms);
    }

    fn eeprom_read_byte(&self, addr: u16) -> u8 {
        self.eeprom.get(addr as usize).copied().unwrap_or(0xFF)
    }

    fn eeprom_write_byte(&mut self, addr: u16, value: u8) {
        if let Some(cell) = self.eeprom.get_mut(addr as usize) {
            // Update semantics: identical values cost no write cycle.
            if *cell != value {
                *cell = value;
                self.eeprom_writes += 1;
            }
        }
    }

    fn eeprom_read_word(&self, addr: u16) -> u16 {
        let lo = self.eeprom_read_byte(addr) as u16;
        let hi = self.eeprom_read_byte(addr + 1) as u16;
        lo | (hi << 8)
    }

    fn eeprom_write_word(&mut self, addr: u16, value: u16) {
        self.eeprom_write_byte(addr, (value & 0xFF) as u8);
        self.eeprom_write_byte(addr + 1, (value >> 8) as u8);
    }

    fn adc_read(&mut self, _channel: u8) -> u8 {
        self.adc_value
    }

    fn wdt_enable(&mut self) {
        self.wdt_enabled = true;
    }

    fn wdt_reset(&mut self) {
        self.wdt_resets += 1;
    }

    fn wdt_disable(&mut self) {
        self.wdt_enabled = false;
    }
}

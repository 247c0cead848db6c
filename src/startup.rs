//! Startup sequence.
//!
//! Runs exactly once before the tick loop:
//!
//! 1. Initialize the HAL (pins, timer, ADC) and sanity-check pin numbers.
//! 2. Factory reset if both buttons are held from cold boot.
//! 3. Load settings, falling back to defaults on any validation failure.
//! 4. Build the coordinator, apply the persisted mode, start the FSMs.
//! 5. Build the LED feedback controller.
//! 6. Enable the watchdog. From here on the tick loop owns `wdt_reset`.
//!
//! The factory-reset poll is the only blocking code in the crate. It is
//! bounded twice over: it first verifies the millisecond timer actually
//! advances, and the poll loop carries an iteration cap so a timer that
//! dies mid-poll cannot hang the device.

use log::{info, warn};

use crate::config::Settings;
use crate::coordinator::Coordinator;
use crate::error::StartupOutcome;
use crate::hal::Hal;
use crate::led::LedController;
use crate::store;

/// How long both buttons must be held to trigger a factory reset.
pub const RESET_HOLD_MS: u32 = 3000;
/// Poll interval while waiting out the hold.
pub const RESET_POLL_MS: u32 = 50;
/// Feedback LED toggle interval while the reset is pending.
pub const RESET_BLINK_MS: u32 = 100;
/// Hard cap on poll iterations, independent of the timer.
pub const RESET_MAX_ITERATIONS: u16 = (RESET_HOLD_MS / RESET_POLL_MS) as u16 + 20;

/// Blink count for the "defaults in effect" cue (shown twice).
const DEFAULTS_BLINK_COUNT: u8 = 2;

/// Full bring-up. Returns `None` only if the HAL reports a nonsensical
/// pin configuration; in that case nothing has been mutated.
pub fn initialize(hal: &mut impl Hal) -> Option<(Coordinator, LedController, StartupOutcome)> {
    hal.init();
    hal.init_timer();

    let max = hal.max_pin();
    if hal.button_a_pin() > max || hal.button_b_pin() > max || hal.sig_out_pin() > max {
        warn!("pin configuration out of range");
        return None;
    }

    let (settings, outcome) = load_or_default(hal);
    info!("startup: {outcome}");

    let mut coordinator = Coordinator::new(hal, settings)?;
    coordinator.set_mode(crate::modes::Mode::from_index(settings.mode));
    coordinator.start(hal);

    let leds = LedController::new();

    hal.wdt_enable();

    Some((coordinator, leds, outcome))
}

/// Factory-reset check plus validated load. Split out from
/// [`initialize`] so the persistence path is testable in isolation.
pub fn load_or_default(hal: &mut impl Hal) -> (Settings, StartupOutcome) {
    if check_factory_reset(hal) {
        store::clear(hal);
        let defaults = Settings::default();
        store::save(hal, &defaults);

        // Read the magic back to confirm the write. On failure the device
        // stays up on the in-RAM defaults and the next boot re-enters the
        // defaults path, which is the correct degraded behavior.
        if hal.eeprom_read_word(store::MAGIC_ADDR) != store::MAGIC {
            warn!("EEPROM write-back verification failed");
            for _ in 0..10 {
                hal.toggle_pin(hal.sig_out_pin());
                hal.delay_ms(50);
            }
            hal.clear_pin(hal.sig_out_pin());
        }

        return (defaults, StartupOutcome::FactoryReset);
    }

    match store::load(hal) {
        Ok(settings) => (settings, StartupOutcome::Loaded),
        Err(e) => {
            warn!("stored settings rejected ({e}), using defaults");
            defaults_feedback(hal);
            (Settings::default(), StartupOutcome::Defaults)
        }
    }
}

/// True if both buttons were held from cold boot for the full hold time.
///
/// Polls with visual feedback, aborting as soon as either button is
/// released. Bails out early if the millisecond timer is not advancing.
pub fn check_factory_reset(hal: &mut impl Hal) -> bool {
    // Timer sanity: if the timer ISR is dead, millis() never moves and
    // the poll below could spin forever on elapsed-time alone.
    let t1 = hal.millis();
    hal.delay_ms(10);
    let t2 = hal.millis();
    if t2 <= t1 {
        warn!("millisecond timer not advancing, skipping reset check");
        return false;
    }

    // Active-low: a high pin means the button is released.
    if hal.read_pin(hal.button_a_pin()) || hal.read_pin(hal.button_b_pin()) {
        return false;
    }

    let start = hal.millis();
    let mut last_blink = start;
    let mut iterations: u16 = 0;

    while hal.millis().wrapping_sub(start) < RESET_HOLD_MS && iterations < RESET_MAX_ITERATIONS {
        if hal.millis().wrapping_sub(last_blink) >= RESET_BLINK_MS {
            hal.toggle_pin(hal.sig_out_pin());
            last_blink = hal.millis();
        }

        if hal.read_pin(hal.button_a_pin()) || hal.read_pin(hal.button_b_pin()) {
            hal.clear_pin(hal.sig_out_pin());
            return false;
        }

        hal.delay_ms(RESET_POLL_MS);
        iterations += 1;
    }

    // Held long enough: solid confirmation blink.
    hal.set_pin(hal.sig_out_pin());
    hal.delay_ms(500);
    hal.clear_pin(hal.sig_out_pin());
    info!("factory reset requested");
    true
}

/// Double pair of short blinks: the stored image was invalid and defaults
/// are in effect.
fn defaults_feedback(hal: &mut impl Hal) {
    for _ in 0..2 {
        for _ in 0..DEFAULTS_BLINK_COUNT {
            hal.set_pin(hal.sig_out_pin());
            hal.delay_ms(100);
            hal.clear_pin(hal.sig_out_pin());
            hal.delay_ms(100);
        }
        hal.delay_ms(200);
    }
}

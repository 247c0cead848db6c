//! Shared helpers: boot a system on a mock HAL and run the tick loop.

use gatekeeper::config::Settings;
use gatekeeper::coordinator::Coordinator;
use gatekeeper::error::StartupOutcome;
use gatekeeper::hal::{Hal, MockHal};
use gatekeeper::led::LedController;
use gatekeeper::{startup, store};

pub struct System {
    pub hal: MockHal,
    pub coordinator: Coordinator,
    pub leds: LedController,
    pub outcome: StartupOutcome,
}

/// Run the full startup sequence on an erased EEPROM.
pub fn boot_empty() -> System {
    boot_with_hal(MockHal::new())
}

/// Persist `settings`, then run the full startup sequence.
pub fn boot_with_settings(settings: Settings) -> System {
    let mut hal = MockHal::new();
    store::save(&mut hal, &settings);
    boot_with_hal(hal)
}

pub fn boot_with_hal(mut hal: MockHal) -> System {
    let (coordinator, leds, outcome) =
        startup::initialize(&mut hal).expect("mock HAL pin configuration is valid");
    System {
        hal,
        coordinator,
        leds,
        outcome,
    }
}

impl System {
    /// One loop iteration: coordinator, LEDs, watchdog, then 1 ms passes.
    /// Returns the two indicator colors for this tick.
    pub fn tick(&mut self) -> ((u8, u8, u8), (u8, u8, u8)) {
        self.coordinator.update(&mut self.hal);
        let fb = self.coordinator.led_feedback();
        let colors = self.leds.update(&fb, self.hal.millis());
        self.hal.wdt_reset();
        self.hal.advance_time(1);
        colors
    }

    /// Tick until the virtual clock reaches `until` (exclusive).
    pub fn run_until(&mut self, until: u32) {
        while self.hal.millis() < until {
            let _ = self.tick();
        }
    }

    /// Tick for `ms` more milliseconds.
    pub fn run_for(&mut self, ms: u32) {
        let until = self.hal.millis() + ms;
        self.run_until(until);
    }

    pub fn now(&self) -> u32 {
        self.hal.millis()
    }

    /// Drive the menu-toggle gesture (A, then B to its hold threshold),
    /// then release both buttons.
    pub fn enter_menu(&mut self) {
        self.hal.press_a(true);
        self.run_for(100);
        self.hal.press_b(true);
        self.run_for(600);
        assert!(self.coordinator.in_menu(), "menu-toggle gesture must enter menu");
        self.hal.press_b(false);
        self.run_for(50);
        self.hal.press_a(false);
        self.run_for(50);
    }

    /// Tap a button for 50 ms.
    pub fn tap_a(&mut self) {
        self.hal.press_a(true);
        self.run_for(50);
        self.hal.press_a(false);
        self.run_for(50);
    }

    pub fn tap_b(&mut self) {
        self.hal.press_b(true);
        self.run_for(50);
        self.hal.press_b(false);
        self.run_for(50);
    }

    /// Hold A solo past the hold threshold, then release.
    pub fn hold_a(&mut self) {
        self.hal.press_a(true);
        self.run_for(600);
        self.hal.press_a(false);
        self.run_for(50);
    }
}

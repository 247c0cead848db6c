//! Cold boot, persistence and factory-reset scenarios.

use crate::support::{boot_empty, boot_with_settings};
use gatekeeper::config::Settings;
use gatekeeper::coordinator::{MenuPage, TopState};
use gatekeeper::error::StartupOutcome;
use gatekeeper::hal::{Hal, MockHal};
use gatekeeper::modes::Mode;
use gatekeeper::{startup, store};

// ── Cold boot with an empty store ─────────────────────────────

#[test]
fn cold_boot_empty_store_runs_on_defaults() {
    let mut sys = boot_empty();

    assert_eq!(sys.outcome, StartupOutcome::Defaults);
    assert_eq!(sys.coordinator.mode(), Mode::Gate);
    assert_eq!(sys.coordinator.top_state(), TopState::Perform);
    assert!(!sys.coordinator.output());

    // Ten quiet ticks: output stays low, mode LED solid green, activity
    // LED dark.
    for _ in 0..10 {
        let (mode_rgb, activity_rgb) = sys.tick();
        assert!(!sys.coordinator.output());
        assert_eq!(mode_rgb, (0, 255, 0));
        assert_eq!(activity_rgb, (0, 0, 0));
    }
}

#[test]
fn cold_boot_enables_watchdog() {
    let sys = boot_empty();
    assert!(sys.hal.wdt_enabled);
}

#[test]
fn tick_loop_feeds_watchdog_every_iteration() {
    let mut sys = boot_empty();
    let before = sys.hal.wdt_resets;
    sys.run_for(25);
    assert!(sys.hal.wdt_resets >= before + 25);
}

// ── Persistence round trip through a reboot ───────────────────

#[test]
fn persisted_mode_survives_reboot() {
    let stored = Settings {
        mode: Mode::Divide as u8,
        divide_divisor_idx: 2,
        ..Default::default()
    };
    let sys = boot_with_settings(stored);
    assert_eq!(sys.outcome, StartupOutcome::Loaded);
    assert_eq!(sys.coordinator.mode(), Mode::Divide);
    assert_eq!(sys.coordinator.settings().divide_divisor_idx, 2);
}

#[test]
fn corrupt_image_falls_back_to_defaults() {
    let mut hal = MockHal::new();
    store::save(
        &mut hal,
        &Settings {
            mode: 2,
            ..Default::default()
        },
    );
    // Flip one settings byte without fixing the checksum.
    hal.eeprom[0x04] ^= 0xFF;

    let sys = crate::support::boot_with_hal(hal);
    assert_eq!(sys.outcome, StartupOutcome::Defaults);
    assert_eq!(sys.coordinator.mode(), Mode::Gate);
}

// ── Menu entry and exit with save ─────────────────────────────

#[test]
fn menu_round_trip_persists_settings() {
    let mut sys = boot_empty();
    sys.run_for(100);

    // A down, then B down, B crosses its hold threshold: menu opens at
    // the gate page (mode is gate).
    sys.hal.press_a(true);
    sys.run_for(100);
    sys.hal.press_b(true);
    sys.run_for(600);
    assert_eq!(sys.coordinator.top_state(), TopState::Menu);
    assert_eq!(sys.coordinator.page(), MenuPage::GateCv);

    // Release both; nothing else happens.
    sys.hal.press_b(false);
    sys.run_for(100);
    sys.hal.press_a(false);
    sys.run_for(100);
    assert_eq!(sys.coordinator.top_state(), TopState::Menu);

    // Solo A hold exits the menu and persists.
    sys.hal.press_a(true);
    sys.run_for(600);
    assert_eq!(sys.coordinator.top_state(), TopState::Perform);
    sys.hal.press_a(false);
    sys.run_for(50);

    // Release must not have advanced the mode.
    assert_eq!(sys.coordinator.mode(), Mode::Gate);

    // The image is on disk: magic, schema, record, checksum.
    let loaded = store::load(&sys.hal).expect("image valid after menu exit");
    assert_eq!(&loaded, sys.coordinator.settings());
    // Defaults XOR to zero.
    assert_eq!(sys.hal.eeprom[0x10], 0x00);
}

#[test]
fn value_changed_in_menu_is_saved_on_exit() {
    let mut sys = boot_empty();
    sys.run_for(100);
    sys.enter_menu();
    assert_eq!(sys.coordinator.page(), MenuPage::GateCv);

    sys.tap_b(); // gate_a_mode 0 -> 1
    sys.hold_a(); // exit menu, persist

    let loaded = store::load(&sys.hal).unwrap();
    assert_eq!(loaded.gate_a_mode, 1);
}

// ── Factory reset from cold boot ──────────────────────────────

#[test]
fn factory_reset_clears_settings_and_rewrites_magic() {
    let mut hal = MockHal::new();
    store::save(
        &mut hal,
        &Settings {
            mode: 4,
            cycle_tempo_idx: 3,
            ..Default::default()
        },
    );

    hal.press_a(true);
    hal.press_b(true);
    let (coordinator, _leds, outcome) = startup::initialize(&mut hal).unwrap();

    assert_eq!(outcome, StartupOutcome::FactoryReset);
    assert_eq!(coordinator.mode(), Mode::Gate);
    assert_eq!(hal.eeprom_read_word(0x00), 0x474B);
    assert_eq!(&hal.eeprom[0x03..0x0B], &[0u8; 8]);
}

#[test]
fn releasing_a_button_aborts_factory_reset() {
    let mut hal = MockHal::new();
    let stored = Settings {
        mode: 1,
        ..Default::default()
    };
    store::save(&mut hal, &stored);

    // Only A is held: no reset, stored settings load normally.
    hal.press_a(true);
    let (coordinator, _leds, outcome) = startup::initialize(&mut hal).unwrap();
    assert_eq!(outcome, StartupOutcome::Loaded);
    assert_eq!(coordinator.mode(), Mode::Trigger);
}

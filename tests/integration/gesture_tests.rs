//! Gesture boundary behavior through the full pipeline.

use crate::support::boot_empty;
use gatekeeper::coordinator::{MenuPage, TopState};
use gatekeeper::modes::Mode;

// ── Mode cycling ──────────────────────────────────────────────

#[test]
fn solo_hold_cycles_through_all_five_modes() {
    let mut sys = boot_empty();
    sys.run_for(100);

    let expected = [
        Mode::Trigger,
        Mode::Toggle,
        Mode::Divide,
        Mode::Cycle,
        Mode::Gate,
    ];
    for mode in expected {
        sys.hold_a();
        assert_eq!(sys.coordinator.mode(), mode);
    }
}

#[test]
fn mode_changes_only_on_release_not_at_hold_threshold() {
    let mut sys = boot_empty();
    sys.run_for(100);

    sys.hal.press_a(true);
    sys.run_for(800); // well past the hold threshold
    assert_eq!(sys.coordinator.mode(), Mode::Gate);
    sys.hal.press_a(false);
    sys.run_for(50);
    assert_eq!(sys.coordinator.mode(), Mode::Trigger);
}

#[test]
fn short_tap_does_not_change_mode_in_perform() {
    let mut sys = boot_empty();
    sys.run_for(100);
    sys.tap_a();
    assert_eq!(sys.coordinator.mode(), Mode::Gate);
    assert_eq!(sys.coordinator.top_state(), TopState::Perform);
}

// ── Menu toggle ordering ──────────────────────────────────────

#[test]
fn a_before_b_enters_menu_when_b_reaches_hold() {
    let mut sys = boot_empty();
    sys.run_for(100);

    sys.hal.press_a(true);
    sys.run_for(10);
    sys.hal.press_b(true);

    // Just before B's hold boundary: still performing.
    sys.run_for(499);
    assert_eq!(sys.coordinator.top_state(), TopState::Perform);
    // At the boundary tick the compound fires.
    sys.run_for(3);
    assert_eq!(sys.coordinator.top_state(), TopState::Menu);
}

#[test]
fn b_before_a_never_enters_menu() {
    let mut sys = boot_empty();
    sys.run_for(100);

    sys.hal.press_b(true);
    sys.run_for(10);
    sys.hal.press_a(true);
    sys.run_for(1000);
    assert_eq!(sys.coordinator.top_state(), TopState::Perform);

    sys.hal.press_a(false);
    sys.hal.press_b(false);
    sys.run_for(50);
    assert_eq!(sys.coordinator.top_state(), TopState::Perform);
}

#[test]
fn b_touch_during_a_hold_cancels_mode_change() {
    let mut sys = boot_empty();
    sys.run_for(100);

    sys.hal.press_a(true);
    sys.run_for(600); // A hold latched (solo)
    sys.hal.press_b(true);
    sys.run_for(50); // B tapped during the hold
    sys.hal.press_b(false);
    sys.run_for(50);
    sys.hal.press_a(false);
    sys.run_for(50);

    assert_eq!(sys.coordinator.mode(), Mode::Gate, "gesture was cancelled");
}

#[test]
fn menu_toggle_gesture_also_exits_menu() {
    let mut sys = boot_empty();
    sys.run_for(100);
    sys.enter_menu();
    assert_eq!(sys.coordinator.top_state(), TopState::Menu);

    sys.hal.press_a(true);
    sys.run_for(100);
    sys.hal.press_b(true);
    sys.run_for(600);
    assert_eq!(sys.coordinator.top_state(), TopState::Perform);

    sys.hal.press_b(false);
    sys.hal.press_a(false);
    sys.run_for(50);
    // Neither release may disturb the mode.
    assert_eq!(sys.coordinator.mode(), Mode::Gate);
}

// ── Menu navigation ring ──────────────────────────────────────

#[test]
fn page_ring_wraps_after_eight_taps() {
    let mut sys = boot_empty();
    sys.run_for(100);
    sys.enter_menu();
    let start = sys.coordinator.page();

    for _ in 0..MenuPage::COUNT {
        sys.tap_a();
    }
    assert_eq!(sys.coordinator.page(), start);
}

#[test]
fn menu_entry_page_tracks_active_mode() {
    let mut sys = boot_empty();
    sys.run_for(100);

    // Advance to trigger mode, then open the menu.
    sys.hold_a();
    assert_eq!(sys.coordinator.mode(), Mode::Trigger);
    sys.enter_menu();
    assert_eq!(sys.coordinator.page(), MenuPage::TriggerBehavior);
}

#[test]
fn value_cycling_wraps_at_field_bound() {
    let mut sys = boot_empty();
    sys.run_for(100);
    sys.enter_menu();
    assert_eq!(sys.coordinator.page(), MenuPage::GateCv);

    // gate_a_mode has two values; two taps return to the start.
    sys.tap_b();
    assert_eq!(sys.coordinator.settings().gate_a_mode, 1);
    sys.tap_b();
    assert_eq!(sys.coordinator.settings().gate_a_mode, 0);
}

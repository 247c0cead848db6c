//! Mode handler behavior through the full pipeline.

use crate::support::{boot_empty, boot_with_settings};
use gatekeeper::config::Settings;
use gatekeeper::modes::Mode;

// ── CV hysteresis ─────────────────────────────────────────────

#[test]
fn cv_hysteresis_sweep() {
    let mut sys = boot_empty();
    sys.run_for(10);

    let samples = [100u8, 120, 128, 129, 80, 78, 77, 76, 128];
    let expected = [false, false, false, true, true, true, true, false, false];

    for (sample, want) in samples.iter().zip(expected.iter()) {
        sys.hal.adc_value = *sample;
        let _ = sys.tick();
        assert_eq!(
            sys.coordinator.cv_state(),
            *want,
            "digital level after sample {sample}"
        );
    }
}

#[test]
fn gate_mode_follows_cv() {
    let mut sys = boot_empty();
    sys.run_for(10);

    sys.hal.adc_value = 200;
    sys.run_for(2);
    assert!(sys.coordinator.output());

    sys.hal.adc_value = 50;
    sys.run_for(2);
    assert!(!sys.coordinator.output());
}

// ── Trigger pulses ────────────────────────────────────────────

#[test]
fn trigger_pulse_is_exactly_ten_ms_regardless_of_input() {
    let mut sys = boot_with_settings(Settings {
        mode: Mode::Trigger as u8,
        ..Default::default()
    });
    sys.run_for(10);

    // Input rises now, falls 2 ms later; the pulse must run its full
    // 10 ms on its own.
    let t0 = sys.now();
    sys.hal.press_b(true);
    for _ in 0..2 {
        let _ = sys.tick();
        assert!(sys.coordinator.output());
    }
    sys.hal.press_b(false);
    while sys.now() < t0 + 10 {
        let _ = sys.tick();
        assert!(sys.coordinator.output(), "high through tick {}", sys.now());
    }
    let _ = sys.tick();
    assert!(!sys.coordinator.output(), "low from tick {}", sys.now());
}

#[test]
fn trigger_retrigger_during_pulse_is_ignored() {
    let mut sys = boot_with_settings(Settings {
        mode: Mode::Trigger as u8,
        ..Default::default()
    });
    sys.run_for(10);

    let t0 = sys.now();
    sys.hal.press_b(true);
    sys.run_for(3);
    sys.hal.press_b(false);
    sys.run_for(2);
    sys.hal.press_b(true); // second edge at t0 + 5, pulse still high
    sys.run_for(4);
    assert!(sys.coordinator.output());
    sys.run_until(t0 + 10);
    let _ = sys.tick();
    assert!(
        !sys.coordinator.output(),
        "pulse from the first edge must not be extended"
    );
}

// ── Toggle ────────────────────────────────────────────────────

#[test]
fn toggle_flips_once_per_press() {
    let mut sys = boot_with_settings(Settings {
        mode: Mode::Toggle as u8,
        ..Default::default()
    });
    sys.run_for(10);

    sys.tap_b();
    assert!(sys.coordinator.output());
    sys.tap_b();
    assert!(!sys.coordinator.output());
    sys.tap_b();
    assert!(sys.coordinator.output());
}

// ── Divide ────────────────────────────────────────────────────

#[test]
fn divide_by_two_pulses_every_second_edge() {
    let mut sys = boot_with_settings(Settings {
        mode: Mode::Divide as u8,
        ..Default::default()
    });
    sys.run_for(10);

    // First rising edge: no pulse.
    sys.hal.adc_value = 200;
    sys.run_for(2);
    assert!(!sys.coordinator.output());
    sys.hal.adc_value = 50;
    sys.run_for(20);

    // Second rising edge: pulse.
    sys.hal.adc_value = 200;
    sys.run_for(2);
    assert!(sys.coordinator.output());
}

#[test]
fn divide_by_24_end_to_end() {
    let mut sys = boot_with_settings(Settings {
        mode: Mode::Divide as u8,
        divide_divisor_idx: 3, // /24
        ..Default::default()
    });
    sys.run_for(10);

    let mut pulses = 0u32;
    for _ in 0..96 {
        let was_low = !sys.coordinator.output();
        sys.hal.adc_value = 200;
        sys.run_for(2);
        if was_low && sys.coordinator.output() {
            pulses += 1;
        }
        sys.run_for(18);
        sys.hal.adc_value = 50;
        sys.run_for(20);
    }
    assert_eq!(pulses, 4, "96 input edges divided by 24");
}

// ── Cycle ─────────────────────────────────────────────────────

#[test]
fn cycle_free_runs_at_60_bpm() {
    let mut sys = boot_with_settings(Settings {
        mode: Mode::Cycle as u8,
        ..Default::default()
    });

    // The clock arms on the first update; from there the output toggles
    // every half period (500 ms at 60 BPM).
    let _ = sys.tick();
    let t0 = sys.now() - 1;
    sys.run_until(t0 + 499);
    assert!(!sys.coordinator.output());
    sys.run_until(t0 + 501);
    assert!(sys.coordinator.output());
    sys.run_until(t0 + 1001);
    assert!(!sys.coordinator.output());
    sys.run_until(t0 + 1501);
    assert!(sys.coordinator.output());
}

#[test]
fn cycle_ignores_cv_input() {
    let mut sys = boot_with_settings(Settings {
        mode: Mode::Cycle as u8,
        ..Default::default()
    });
    let _ = sys.tick();
    let t0 = sys.now() - 1;

    sys.hal.adc_value = 200; // CV high the whole time
    sys.run_until(t0 + 499);
    assert!(!sys.coordinator.output(), "cycle does not follow CV");
}

#[test]
fn cycle_activity_led_fades_across_high_half() {
    let mut sys = boot_with_settings(Settings {
        mode: Mode::Cycle as u8,
        ..Default::default()
    });
    let _ = sys.tick();
    let t0 = sys.now() - 1;

    // Just after the first toggle the activity LED is at full white.
    sys.run_until(t0 + 500);
    let (_, bright) = sys.tick();
    // Mid half-period it has faded to roughly half.
    sys.run_until(t0 + 750);
    let (_, faded) = sys.tick();

    assert_eq!(bright, (255, 255, 255));
    assert!(faded.0 < 140 && faded.0 > 110, "faded to {faded:?}");
}

// ── Mode change resets handler state ──────────────────────────

#[test]
fn output_drops_low_when_leaving_toggle_mode() {
    let mut sys = boot_with_settings(Settings {
        mode: Mode::Toggle as u8,
        ..Default::default()
    });
    sys.run_for(10);

    sys.tap_b();
    assert!(sys.coordinator.output());

    // Advance to divide mode: fresh context starts low.
    sys.hold_a();
    assert_eq!(sys.coordinator.mode(), Mode::Divide);
    assert!(!sys.coordinator.output());
}

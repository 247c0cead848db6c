//! Debounced button input with edge detection.
//!
//! Edge-based debouncing: an edge is only accepted when at least
//! [`EDGE_DEBOUNCE_MS`] have passed since the previous edge of the same
//! direction, so bounce is never sampled as content and each press yields
//! a deterministic single-tick edge flag. The guard is per-edge, not
//! per-transition, so a clean release immediately after a clean press is
//! never suppressed by the same timer.

use crate::hal::Hal;
use crate::status;

/// Debounce guard per edge direction.
pub const EDGE_DEBOUNCE_MS: u32 = 5;

/// Raw pin state (inverted active-low sample).
pub const BTN_RAW: u8 = 1 << 0;
/// Debounced pressed state.
pub const BTN_PRESSED: u8 = 1 << 1;
/// Previous cycle's debounced state.
pub const BTN_LAST: u8 = 1 << 2;
/// Rising edge this cycle.
pub const BTN_RISE: u8 = 1 << 3;
/// Falling edge this cycle.
pub const BTN_FALL: u8 = 1 << 4;
/// Legacy 5-tap config gesture latch. The gesture was retired in favor of
/// the event-processor compound gestures; the bit is kept so status dumps
/// stay comparable across firmware revisions.
pub const BTN_CONFIG: u8 = 1 << 5;
/// Legacy hold-counting flag for the retired config gesture.
pub const BTN_COUNTING: u8 = 1 << 6;

/// Per-button state: pin binding, packed flags, last edge timestamps.
#[derive(Debug, Clone)]
pub struct Button {
    pin: u8,
    status: u8,
    last_rise_time: u32,
    last_fall_time: u32,
}

impl Button {
    /// Bind a button to a pin. Returns `None` if the pin number is outside
    /// the HAL's valid range.
    pub fn new(hal: &impl Hal, pin: u8) -> Option<Self> {
        if pin > hal.max_pin() {
            return None;
        }
        Some(Self {
            pin,
            status: 0,
            last_rise_time: 0,
            last_fall_time: 0,
        })
    }

    /// Clear all flags and edge timing.
    pub fn reset(&mut self) {
        self.status = 0;
        self.last_rise_time = 0;
        self.last_fall_time = 0;
    }

    /// Sample the pin and update debounced state and edge flags.
    /// Call once per tick.
    pub fn update(&mut self, hal: &impl Hal, now: u32) {
        // Active-low: pressed = pin low.
        status::put(&mut self.status, BTN_RAW, !hal.read_pin(self.pin));

        status::clr(&mut self.status, BTN_RISE | BTN_FALL);

        let raw = status::any(self.status, BTN_RAW);
        let last = status::any(self.status, BTN_LAST);

        if raw && !last && now.wrapping_sub(self.last_rise_time) >= EDGE_DEBOUNCE_MS {
            self.last_rise_time = now;
            status::set(&mut self.status, BTN_RISE | BTN_PRESSED);
        }

        if !raw && last && now.wrapping_sub(self.last_fall_time) >= EDGE_DEBOUNCE_MS {
            self.last_fall_time = now;
            status::set(&mut self.status, BTN_FALL);
            status::clr(&mut self.status, BTN_PRESSED);
        }

        let pressed = status::any(self.status, BTN_PRESSED);
        status::put(&mut self.status, BTN_LAST, pressed);
    }

    /// Debounced pressed state.
    pub fn is_pressed(&self) -> bool {
        status::any(self.status, BTN_PRESSED)
    }

    /// True only on the tick the press was accepted.
    pub fn rising_edge(&self) -> bool {
        status::any(self.status, BTN_RISE)
    }

    /// True only on the tick the release was accepted.
    pub fn falling_edge(&self) -> bool {
        status::any(self.status, BTN_FALL)
    }
}

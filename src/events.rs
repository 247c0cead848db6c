//! Semantic event recognition.
//!
//! Merges the conditioned button and CV states over time into at most one
//! [`Event`] per tick: presses, taps, releases, holds, CV edges, and the
//! two compound gestures.
//!
//! ## Gesture vocabulary
//!
//! | Gesture      | Input sequence                                  | Event        |
//! |--------------|-------------------------------------------------|--------------|
//! | A tap        | A pressed < 500 ms then released                | `ATap`       |
//! | B tap        | B pressed < 500 ms then released                | `BTap`       |
//! | A solo hold  | A held ≥ 500 ms, B never touched, then released | `ModeNext`   |
//! | B solo hold  | B held ≥ 500 ms without A holding               | `BHold` then plain `BRelease` |
//! | Menu toggle  | A pressed, then B pressed, B reaches hold       | `MenuToggle` |
//!
//! Two asymmetric constraints keep the compound gestures apart: the order
//! in which the holds are reached (A first + B reaching hold ⇒ menu
//! toggle), and whether B was touched at all during the A hold (untouched
//! at A release ⇒ mode next). The `COMPOUND_FIRED` and
//! `B_TOUCHED_DURING_A` flags stop each gesture from firing twice and stop
//! one gesture from degenerating into the other on release.
//!
//! `AHold` is only emitted for *solo* holds (B not pressed); the latch is
//! still set when B is down so the release decision stays correct. That
//! solo-only emission is what lets the menu-toggle gesture remain
//! distinguishable from a plain A hold.

use crate::status;

/// Hold threshold: a press this long or longer is a hold, shorter is a tap.
pub const HOLD_THRESHOLD_MS: u32 = 500;

// Status byte layout.
const EP_A_PRESSED: u8 = 1 << 0;
const EP_A_LAST: u8 = 1 << 1;
const EP_A_HOLD: u8 = 1 << 2;
const EP_B_PRESSED: u8 = 1 << 3;
const EP_B_LAST: u8 = 1 << 4;
const EP_B_HOLD: u8 = 1 << 5;
const EP_CV_STATE: u8 = 1 << 6;
const EP_CV_LAST: u8 = 1 << 7;

// Extended status byte.
const EP_COMPOUND_FIRED: u8 = 1 << 0;
const EP_B_TOUCHED_DURING_A: u8 = 1 << 1;

/// Semantic events, at most one per tick.
///
/// The discriminants double as FSM transition-table event ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    None = 0,

    // Performance events: fire on press for fast response.
    APress,
    BPress,
    CvRise,
    CvFall,

    // Configuration events: fire on release, deliberate.
    ATap,
    ARelease,
    BTap,
    BRelease,

    // Hold events: threshold reached while still pressed.
    AHold,
    BHold,

    // Compound gestures.
    MenuToggle,
    ModeNext,

    // Synthetic, injected by the coordinator.
    Timeout,
}

impl Event {
    /// Transition-table id.
    pub const fn id(self) -> u8 {
        self as u8
    }
}

/// Input bundle for one tick.
#[derive(Debug, Clone, Copy)]
pub struct EventInput {
    pub button_a: bool,
    pub button_b: bool,
    pub cv_in: bool,
    pub now: u32,
}

/// Event-processor state: two packed flag bytes plus the press timestamps
/// the hold and ordering decisions are made from.
#[derive(Debug, Clone, Default)]
pub struct EventProcessor {
    status: u8,
    ext_status: u8,
    a_press_time: u32,
    b_press_time: u32,
}

impl EventProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all flags and timestamps.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Process one tick of input. Returns at most one event.
    ///
    /// Priority when several become eligible in the same tick: button A
    /// transitions, then button B, then the compound promotion of a B hold
    /// to `MenuToggle`, then CV edges.
    pub fn update(&mut self, input: &EventInput) -> Event {
        let mut event = Event::None;
        let now = input.now;

        status::put(&mut self.status, EP_A_PRESSED, input.button_a);
        status::put(&mut self.status, EP_B_PRESSED, input.button_b);
        status::put(&mut self.status, EP_CV_STATE, input.cv_in);

        // === Button A ===
        let a_pressed = status::any(self.status, EP_A_PRESSED);
        let a_was_pressed = status::any(self.status, EP_A_LAST);

        if a_pressed && !a_was_pressed {
            self.a_press_time = now;
            status::clr(&mut self.status, EP_A_HOLD);
            status::clr(&mut self.ext_status, EP_B_TOUCHED_DURING_A);
            event = Event::APress;
        } else if !a_pressed && a_was_pressed {
            if !status::any(self.status, EP_A_HOLD) {
                event = Event::ATap;
            } else if !status::any(self.ext_status, EP_B_TOUCHED_DURING_A)
                && !status::any(self.ext_status, EP_COMPOUND_FIRED)
            {
                // Solo hold released: mode change in perform, menu exit in menu.
                event = Event::ModeNext;
            } else {
                event = Event::ARelease;
            }
            status::clr(&mut self.status, EP_A_HOLD);
        } else if a_pressed && !status::any(self.status, EP_A_HOLD) {
            if now.wrapping_sub(self.a_press_time) >= HOLD_THRESHOLD_MS {
                status::set(&mut self.status, EP_A_HOLD);
                if !status::any(self.status, EP_B_PRESSED) {
                    event = Event::AHold;
                }
            }
        }

        // === Button B ===
        let b_pressed = status::any(self.status, EP_B_PRESSED);
        let b_was_pressed = status::any(self.status, EP_B_LAST);
        let mut b_hold_reached = false;

        if b_pressed && !b_was_pressed {
            self.b_press_time = now;
            status::clr(&mut self.status, EP_B_HOLD);
            // B touching the latched A hold cancels the solo gesture.
            if status::any(self.status, EP_A_HOLD) {
                status::set(&mut self.ext_status, EP_B_TOUCHED_DURING_A);
            }
            if event == Event::None {
                event = Event::BPress;
            }
        } else if !b_pressed && b_was_pressed {
            if event == Event::None {
                event = if status::any(self.status, EP_B_HOLD) {
                    Event::BRelease
                } else {
                    Event::BTap
                };
            }
            status::clr(&mut self.status, EP_B_HOLD);
        } else if b_pressed && !status::any(self.status, EP_B_HOLD) {
            if now.wrapping_sub(self.b_press_time) >= HOLD_THRESHOLD_MS {
                status::set(&mut self.status, EP_B_HOLD);
                b_hold_reached = true;
                if event == Event::None {
                    event = Event::BHold;
                }
            }
        }

        // === Compound promotion ===
        // B reaching its hold threshold while A is still down, with A
        // pressed strictly first, becomes the menu toggle. Fires once per
        // gesture; the flag clears when both buttons are up.
        if !status::any(self.ext_status, EP_COMPOUND_FIRED)
            && b_hold_reached
            && status::any(self.status, EP_A_PRESSED)
            && self.a_press_time < self.b_press_time
        {
            event = Event::MenuToggle;
            status::set(&mut self.ext_status, EP_COMPOUND_FIRED);
        }

        if !a_pressed && !b_pressed {
            status::clr(&mut self.ext_status, EP_COMPOUND_FIRED);
        }

        // === CV edges (lowest priority) ===
        let cv_high = status::any(self.status, EP_CV_STATE);
        let cv_was_high = status::any(self.status, EP_CV_LAST);

        if event == Event::None {
            if cv_high && !cv_was_high {
                event = Event::CvRise;
            } else if !cv_high && cv_was_high {
                event = Event::CvFall;
            }
        }

        // === End-of-tick bookkeeping ===
        status::put(&mut self.status, EP_A_LAST, a_pressed);
        status::put(&mut self.status, EP_B_LAST, b_pressed);
        status::put(&mut self.status, EP_CV_LAST, cv_high);

        event
    }

    /// Mark the in-flight A hold as consumed so its release reports a
    /// plain `ARelease` instead of `ModeNext`. The coordinator calls this
    /// when the top FSM has already acted on the `AHold` (menu exit).
    pub fn consume_hold_gesture(&mut self) {
        status::set(&mut self.ext_status, EP_COMPOUND_FIRED);
    }

    pub fn a_pressed(&self) -> bool {
        status::any(self.status, EP_A_PRESSED)
    }

    pub fn b_pressed(&self) -> bool {
        status::any(self.status, EP_B_PRESSED)
    }

    pub fn a_holding(&self) -> bool {
        status::any(self.status, EP_A_HOLD)
    }

    pub fn b_holding(&self) -> bool {
        status::any(self.status, EP_B_HOLD)
    }
}

//! LED feedback controller.
//!
//! Translates the coordinator's per-tick [`LedFeedback`] descriptor into
//! two RGB values — the mode indicator and the activity indicator. The
//! core never touches the pixel chain itself; the rendering collaborator
//! transmits whatever this module returns.
//!
//! ## Display rules
//!
//! - Perform: mode LED solid in the mode color; activity LED shows the
//!   output at the brightness the mode handler supplies (cycle uses it
//!   for a smooth pulse).
//! - Menu: mode LED shows the current page color, blinking for the first
//!   page of a mode group and glowing for the second; activity LED
//!   encodes the setting's value index — 0 off, 1 solid, 2 blink,
//!   3+ glow, all in the page color.

use crate::modes::Mode;

/// Color as an `(R, G, B)` tuple, each 0-255.
pub type Rgb = (u8, u8, u8);

pub const BLINK_PERIOD_MS: u16 = 500;
pub const GLOW_PERIOD_MS: u16 = 1000;

/// Mode indicator colors, indexed by mode ordinal.
pub const MODE_COLORS: [Rgb; Mode::COUNT as usize] = [
    (0, 255, 0),   // gate - green
    (0, 128, 255), // trigger - cyan
    (255, 64, 0),  // toggle - orange
    (255, 0, 255), // divide - magenta
    (255, 255, 0), // cycle - yellow
];

/// Pages without an owning mode (global settings) use white.
pub const GLOBAL_COLOR: Rgb = (255, 255, 255);

/// Activity indicator base color.
pub const ACTIVITY_COLOR: Rgb = (255, 255, 255);

/// Owning mode per menu page; `Mode::COUNT` marks a global page.
const PAGE_MODE_MAP: [u8; 8] = [0, 1, 1, 2, 3, 4, 5, 5];

/// Pages rendered as glow instead of blink (the second page of a group).
const PAGE_GLOW: [bool; 8] = [false, false, true, false, false, false, false, true];

/// Per-tick descriptor produced by the coordinator.
#[derive(Debug, Clone, Copy)]
pub struct LedFeedback {
    pub mode_color: Rgb,
    pub activity_color: Rgb,
    pub activity_brightness: u8,
    pub mode: u8,
    pub page: u8,
    pub in_menu: bool,
    pub setting_value: u8,
    pub setting_count: u8,
}

/// Scale a color by `brightness / 255`.
pub fn scale(color: Rgb, brightness: u8) -> Rgb {
    let b = brightness as u16;
    (
        ((color.0 as u16 * b) / 255) as u8,
        ((color.1 as u16 * b) / 255) as u8,
        ((color.2 as u16 * b) / 255) as u8,
    )
}

/// Mode color lookup with a dark fallback for bad ordinals.
pub fn mode_color(mode: u8) -> Rgb {
    MODE_COLORS
        .get(mode as usize)
        .copied()
        .unwrap_or((0, 0, 0))
}

/// Page color: the owning mode's color, white for global pages, gray for
/// unknown ordinals.
pub fn page_color(page: u8) -> Rgb {
    match PAGE_MODE_MAP.get(page as usize) {
        Some(&m) if m < Mode::COUNT => mode_color(m),
        Some(_) => GLOBAL_COLOR,
        None => (128, 128, 128),
    }
}

// ---------------------------------------------------------------------------
// Animation engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnimationKind {
    Static,
    Blink,
    Glow,
}

/// One LED's animation state.
#[derive(Debug, Clone)]
struct Animation {
    kind: AnimationKind,
    base: Rgb,
    period_ms: u16,
    last_update: u32,
    on: bool,
}

impl Animation {
    fn off() -> Self {
        Self {
            kind: AnimationKind::Static,
            base: (0, 0, 0),
            period_ms: BLINK_PERIOD_MS,
            last_update: 0,
            on: true,
        }
    }

    fn set_static(&mut self, color: Rgb) {
        self.kind = AnimationKind::Static;
        self.base = color;
    }

    fn set(&mut self, kind: AnimationKind, color: Rgb, period_ms: u16) {
        self.kind = kind;
        self.base = color;
        self.period_ms = if period_ms > 0 {
            period_ms
        } else {
            BLINK_PERIOD_MS
        };
        self.on = true;
    }

    /// Advance to `now` and return the color to display.
    fn sample(&mut self, now: u32) -> Rgb {
        match self.kind {
            AnimationKind::Static => self.base,

            AnimationKind::Blink => {
                let half = (self.period_ms / 2) as u32;
                if now.wrapping_sub(self.last_update) >= half {
                    self.last_update = now;
                    self.on = !self.on;
                }
                if self.on {
                    self.base
                } else {
                    (0, 0, 0)
                }
            }

            AnimationKind::Glow => {
                // Triangle wave phase-locked to absolute time.
                let period = self.period_ms as u32;
                let phase = ((now % period) * 255 / period) as u8;
                let brightness = if phase < 128 {
                    phase * 2
                } else {
                    (255 - phase) * 2
                };
                scale(self.base, brightness)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Maps coordinator state to the two indicator colors, tracking menu
/// enter/exit and page changes so animations re-seed at the right moments.
pub struct LedController {
    mode_anim: Animation,
    activity_anim: Animation,
    in_menu: bool,
    current_mode: u8,
    current_page: u8,
    /// Menu value shown last tick; `None` forces a re-seed.
    last_setting_value: Option<u8>,
}

impl LedController {
    pub fn new() -> Self {
        let mut ctrl = Self {
            mode_anim: Animation::off(),
            activity_anim: Animation::off(),
            in_menu: false,
            current_mode: 0,
            current_page: 0,
            last_setting_value: None,
        };
        ctrl.mode_anim.set_static(mode_color(0));
        ctrl
    }

    /// Consume one descriptor and return `(mode_rgb, activity_rgb)`.
    pub fn update(&mut self, fb: &LedFeedback, now: u32) -> (Rgb, Rgb) {
        if fb.in_menu && !self.in_menu {
            self.enter_menu(fb.page);
        } else if !fb.in_menu && self.in_menu {
            self.exit_menu();
        }

        if !fb.in_menu && fb.mode != self.current_mode {
            self.set_mode(fb.mode);
        }
        if fb.in_menu && fb.page != self.current_page {
            self.set_page(fb.page);
        }

        let mode_rgb = self.mode_anim.sample(now);

        let activity_rgb = if !self.in_menu {
            self.activity_anim
                .set_static(scale(fb.activity_color, fb.activity_brightness));
            self.activity_anim.sample(now)
        } else {
            // Re-seed the value animation only when the value changes, so
            // a running blink/glow is not restarted every tick.
            if self.last_setting_value != Some(fb.setting_value) {
                self.last_setting_value = Some(fb.setting_value);
                let color = page_color(self.current_page);
                match fb.setting_value {
                    0 => self.activity_anim.set_static((0, 0, 0)),
                    1 => self.activity_anim.set_static(color),
                    2 => self
                        .activity_anim
                        .set(AnimationKind::Blink, color, BLINK_PERIOD_MS),
                    _ => self
                        .activity_anim
                        .set(AnimationKind::Glow, color, GLOW_PERIOD_MS),
                }
            }
            self.activity_anim.sample(now)
        };

        (mode_rgb, activity_rgb)
    }

    fn set_mode(&mut self, mode: u8) {
        self.current_mode = if mode < Mode::COUNT { mode } else { 0 };
        if !self.in_menu {
            self.mode_anim.set_static(mode_color(self.current_mode));
        }
    }

    fn enter_menu(&mut self, page: u8) {
        self.in_menu = true;
        self.last_setting_value = None;
        self.seed_page_animation(page);
    }

    fn exit_menu(&mut self) {
        self.in_menu = false;
        self.mode_anim.set_static(mode_color(self.current_mode));
    }

    fn set_page(&mut self, page: u8) {
        self.last_setting_value = None;
        self.seed_page_animation(page);
    }

    fn seed_page_animation(&mut self, page: u8) {
        self.current_page = if (page as usize) < PAGE_MODE_MAP.len() {
            page
        } else {
            0
        };
        let color = page_color(self.current_page);
        if PAGE_GLOW[self.current_page as usize] {
            self.mode_anim
                .set(AnimationKind::Glow, color, GLOW_PERIOD_MS);
        } else {
            self.mode_anim
                .set(AnimationKind::Blink, color, BLINK_PERIOD_MS);
        }
    }
}

impl Default for LedController {
    fn default() -> Self {
        Self::new()
    }
}

//! Application coordinator: the three-level FSM hierarchy and event routing.
//!
//! ```text
//!                  ┌──────────────────────────────┐
//!        Event ───▶│ top FSM   (Perform / Menu)   │ consumed? done
//!                  └──────────────┬───────────────┘
//!                      not consumed│
//!            in Perform ──────────┼────────── in Menu
//!                  ▼                               ▼
//!        ┌──────────────────┐          ┌─────────────────────┐
//!        │ mode FSM (5)     │          │ menu FSM (8 pages)  │
//!        │ ModeNext wildcard│          │ ATap / BTap wildcard│
//!        └──────────────────┘          └─────────────────────┘
//! ```
//!
//! The coordinator owns the FSMs, the input conditioners, the event
//! processor and the active mode context, and drives them all from a
//! single [`Coordinator::update`] call per tick. FSM tables hand back
//! action ids which are executed here, so every action sees the whole
//! coordinator consistently.

use log::{debug, info};

use crate::config::{
    GateButtonMode, Settings, ToggleEdge, TriggerEdge, CYCLE_PERIOD_VALUES,
    DIVIDE_DIVISOR_VALUES, TRIGGER_PULSE_VALUES,
};
use crate::events::{Event, EventInput, EventProcessor};
use crate::fsm::{Actions, Fsm, State, Transition, ANY_STATE, NO_TRANSITION};
use crate::hal::{Hal, CV_ADC_CHANNEL};
use crate::input::{Button, CvInput};
use crate::led::{self, LedFeedback};
use crate::modes::{Mode, ModeContext};
use crate::store;

/// Menu auto-exit after this much inactivity.
pub const MENU_TIMEOUT_MS: u32 = 60_000;

/// Top-level states: normal operation vs configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TopState {
    Perform = 0,
    Menu = 1,
}

/// Menu pages, in ring order. A tap on button A advances the ring; a tap
/// on button B cycles the value on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MenuPage {
    GateCv = 0,
    TriggerBehavior = 1,
    TriggerPulseLen = 2,
    ToggleBehavior = 3,
    DivideDivisor = 4,
    CyclePattern = 5,
    CvGlobal = 6,
    MenuTimeout = 7,
}

impl MenuPage {
    pub const COUNT: u8 = 8;

    pub fn from_index(idx: u8) -> Self {
        match idx {
            0 => Self::GateCv,
            1 => Self::TriggerBehavior,
            2 => Self::TriggerPulseLen,
            3 => Self::ToggleBehavior,
            4 => Self::DivideDivisor,
            5 => Self::CyclePattern,
            6 => Self::CvGlobal,
            7 => Self::MenuTimeout,
            _ => {
                debug_assert!(false, "invalid page index: {idx}");
                Self::GateCv
            }
        }
    }

    pub fn next(self) -> Self {
        Self::from_index((self as u8 + 1) % Self::COUNT)
    }

    /// Context-aware menu entry: jump to the first page relevant to the
    /// mode that was active when the menu opened.
    pub fn start_page_for(mode: Mode) -> Self {
        match mode {
            Mode::Gate => Self::GateCv,
            Mode::Trigger => Self::TriggerBehavior,
            Mode::Toggle => Self::ToggleBehavior,
            Mode::Divide => Self::DivideDivisor,
            Mode::Cycle => Self::CyclePattern,
        }
    }
}

/// Action ids referenced by the transition tables and executed by the
/// coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    EnterMenu,
    ExitMenu,
    NextMode,
    NextPage,
    CycleValue,
}

// ---------------------------------------------------------------------------
// Static tables
// ---------------------------------------------------------------------------

static TOP_STATES: [State<Action>; 2] = [
    State::plain(TopState::Perform as u8),
    State::plain(TopState::Menu as u8),
];

static TOP_TRANSITIONS: [Transition<Action>; 4] = [
    // The menu-toggle gesture both enters and leaves the menu.
    Transition {
        from: TopState::Perform as u8,
        event: Event::MenuToggle as u8,
        to: TopState::Menu as u8,
        action: Some(Action::EnterMenu),
    },
    Transition {
        from: TopState::Menu as u8,
        event: Event::MenuToggle as u8,
        to: TopState::Perform as u8,
        action: Some(Action::ExitMenu),
    },
    // Inactivity timeout leaves the menu.
    Transition {
        from: TopState::Menu as u8,
        event: Event::Timeout as u8,
        to: TopState::Perform as u8,
        action: Some(Action::ExitMenu),
    },
    // A solo A hold leaves the menu directly. In Perform the same gesture
    // runs to ModeNext on release instead; consuming the hold here keeps
    // the release from also advancing the mode.
    Transition {
        from: TopState::Menu as u8,
        event: Event::AHold as u8,
        to: TopState::Perform as u8,
        action: Some(Action::ExitMenu),
    },
];

static MODE_STATES: [State<Action>; Mode::COUNT as usize] = [
    State::plain(Mode::Gate as u8),
    State::plain(Mode::Trigger as u8),
    State::plain(Mode::Toggle as u8),
    State::plain(Mode::Divide as u8),
    State::plain(Mode::Cycle as u8),
];

static MODE_TRANSITIONS: [Transition<Action>; 1] = [Transition {
    from: ANY_STATE,
    event: Event::ModeNext as u8,
    to: NO_TRANSITION,
    action: Some(Action::NextMode),
}];

static MENU_STATES: [State<Action>; MenuPage::COUNT as usize] = [
    State::plain(MenuPage::GateCv as u8),
    State::plain(MenuPage::TriggerBehavior as u8),
    State::plain(MenuPage::TriggerPulseLen as u8),
    State::plain(MenuPage::ToggleBehavior as u8),
    State::plain(MenuPage::DivideDivisor as u8),
    State::plain(MenuPage::CyclePattern as u8),
    State::plain(MenuPage::CvGlobal as u8),
    State::plain(MenuPage::MenuTimeout as u8),
];

static MENU_TRANSITIONS: [Transition<Action>; 2] = [
    Transition {
        from: ANY_STATE,
        event: Event::ATap as u8,
        to: NO_TRANSITION,
        action: Some(Action::NextPage),
    },
    Transition {
        from: ANY_STATE,
        event: Event::BTap as u8,
        to: NO_TRANSITION,
        action: Some(Action::CycleValue),
    },
];

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

pub struct Coordinator {
    top_fsm: Fsm<Action>,
    mode_fsm: Fsm<Action>,
    menu_fsm: Fsm<Action>,

    events: EventProcessor,
    cv_input: CvInput,
    button_a: Button,
    button_b: Button,

    mode_ctx: ModeContext,
    settings: Settings,
    output_state: bool,

    /// Mode that was active when the menu opened.
    menu_entry_mode: Mode,
    menu_enter_time: u32,
    last_activity: u32,
}

impl Coordinator {
    /// Build a coordinator around the given settings record. Returns
    /// `None` if the HAL reports button pins outside its valid range.
    pub fn new(hal: &impl Hal, settings: Settings) -> Option<Self> {
        let button_a = Button::new(hal, hal.button_a_pin())?;
        let button_b = Button::new(hal, hal.button_b_pin())?;

        Some(Self {
            top_fsm: Fsm::new(&TOP_STATES, &TOP_TRANSITIONS, TopState::Perform as u8),
            mode_fsm: Fsm::new(&MODE_STATES, &MODE_TRANSITIONS, Mode::Gate as u8),
            menu_fsm: Fsm::new(&MENU_STATES, &MENU_TRANSITIONS, MenuPage::GateCv as u8),
            events: EventProcessor::new(),
            cv_input: CvInput::new(),
            button_a,
            button_b,
            mode_ctx: ModeContext::for_mode(Mode::Gate, &settings),
            settings,
            output_state: false,
            menu_entry_mode: Mode::Gate,
            menu_enter_time: 0,
            last_activity: 0,
        })
    }

    /// Activate the three FSMs. Call once after construction.
    pub fn start(&mut self, hal: &impl Hal) {
        let _ = self.top_fsm.start();
        let _ = self.mode_fsm.start();
        let _ = self.menu_fsm.start();
        self.last_activity = hal.millis();
    }

    /// One tick: sample inputs, recognize at most one event, route it,
    /// run the active mode handler, refresh the output bit.
    pub fn update(&mut self, hal: &mut impl Hal) {
        let now = hal.millis();

        let adc = hal.adc_read(CV_ADC_CHANNEL);
        let cv_state = self.cv_input.update(adc);

        self.button_a.update(hal, now);
        self.button_b.update(hal, now);

        let event = self.events.update(&EventInput {
            button_a: self.button_a.is_pressed(),
            button_b: self.button_b.is_pressed(),
            cv_in: cv_state,
            now,
        });

        if event != Event::None {
            let top_before = self.top_state();

            // Any activity while in the menu rearms the timeout.
            if top_before == TopState::Menu {
                self.last_activity = now;
            }

            let outcome = self.top_fsm.process(event.id());
            let handled = outcome.changed;
            if handled && event == Event::AHold {
                // Menu exit consumed the hold; its release must not
                // become a ModeNext in Perform.
                self.events.consume_hold_gesture();
            }
            self.run_actions(outcome.actions, hal);

            if !handled {
                let outcome = if top_before == TopState::Perform {
                    self.mode_fsm.process(event.id())
                } else {
                    self.menu_fsm.process(event.id())
                };
                self.run_actions(outcome.actions, hal);
            }
        }

        // Inactivity timeout: delivered as a synthetic event at the next
        // tick boundary past the deadline.
        if self.top_state() == TopState::Menu
            && now.wrapping_sub(self.last_activity) >= MENU_TIMEOUT_MS
        {
            debug!("menu timeout");
            let outcome = self.top_fsm.process(Event::Timeout.id());
            self.run_actions(outcome.actions, hal);
        }

        // Signal processing runs in both top states; only the button
        // contribution differs.
        let input_state = if self.top_state() == TopState::Perform {
            // B triggers unless A is down (a compound gesture may be in
            // flight); CV always passes through.
            let b_triggers = self.events.b_pressed() && !self.events.a_pressed();
            let mut state = cv_state || b_triggers;
            if self.mode() == Mode::Gate && self.settings.gate_a_manual() {
                state = state || self.events.a_pressed();
            }
            state
        } else {
            // Buttons are reserved for menu navigation.
            cv_state
        };

        self.output_state = self.mode_ctx.process(input_state, now);
    }

    fn run_actions(&mut self, actions: Actions<Action>, hal: &mut impl Hal) {
        for action in actions {
            self.run_action(action, hal);
        }
    }

    fn run_action(&mut self, action: Action, hal: &mut impl Hal) {
        match action {
            Action::EnterMenu => {
                self.menu_entry_mode = self.mode();
                self.menu_enter_time = hal.millis();
                self.last_activity = self.menu_enter_time;
                let page = MenuPage::start_page_for(self.menu_entry_mode);
                let _ = self.menu_fsm.set_state(page as u8);
                info!("menu entered at page {page:?}");
            }

            Action::ExitMenu => {
                self.settings.mode = self.mode() as u8;
                store::save(hal, &self.settings);
                info!("menu exited, settings saved");
            }

            Action::NextMode => {
                let next = self.mode().next();
                let _ = self.mode_fsm.set_state(next as u8);
                self.mode_ctx = ModeContext::for_mode(next, &self.settings);
                self.last_activity = hal.millis();
                info!("mode changed to {next:?}");
            }

            Action::NextPage => {
                let next = self.page().next();
                let _ = self.menu_fsm.set_state(next as u8);
                self.last_activity = hal.millis();
                debug!("menu page {next:?}");
            }

            Action::CycleValue => {
                self.cycle_current_value();
                self.last_activity = hal.millis();
            }
        }
    }

    /// Advance the setting owned by the current page, wrapping at its
    /// bound, and re-seed the mode context if the active mode is governed
    /// by that setting.
    fn cycle_current_value(&mut self) {
        let mode = self.mode();
        let mut reinit = false;

        match self.page() {
            MenuPage::GateCv => {
                self.settings.gate_a_mode =
                    (self.settings.gate_a_mode + 1) % GateButtonMode::COUNT;
                reinit = mode == Mode::Gate;
            }
            MenuPage::TriggerBehavior => {
                self.settings.trigger_edge = (self.settings.trigger_edge + 1) % TriggerEdge::COUNT;
                reinit = mode == Mode::Trigger;
            }
            MenuPage::TriggerPulseLen => {
                self.settings.trigger_pulse_idx =
                    (self.settings.trigger_pulse_idx + 1) % TRIGGER_PULSE_VALUES.len() as u8;
                reinit = mode == Mode::Trigger;
            }
            MenuPage::ToggleBehavior => {
                self.settings.toggle_edge = (self.settings.toggle_edge + 1) % ToggleEdge::COUNT;
                reinit = mode == Mode::Toggle;
            }
            MenuPage::DivideDivisor => {
                self.settings.divide_divisor_idx =
                    (self.settings.divide_divisor_idx + 1) % DIVIDE_DIVISOR_VALUES.len() as u8;
                reinit = mode == Mode::Divide;
            }
            MenuPage::CyclePattern => {
                self.settings.cycle_tempo_idx =
                    (self.settings.cycle_tempo_idx + 1) % CYCLE_PERIOD_VALUES.len() as u8;
                reinit = mode == Mode::Cycle;
            }
            // Global pages carry no cycling value yet.
            MenuPage::CvGlobal | MenuPage::MenuTimeout => {}
        }

        if reinit {
            self.mode_ctx = ModeContext::for_mode(mode, &self.settings);
        }
    }

    // -- Accessors --

    pub fn top_state(&self) -> TopState {
        if self.top_fsm.state() == TopState::Menu as u8 {
            TopState::Menu
        } else {
            TopState::Perform
        }
    }

    pub fn in_menu(&self) -> bool {
        self.top_state() == TopState::Menu
    }

    pub fn mode(&self) -> Mode {
        Mode::from_index(self.mode_fsm.state())
    }

    /// Force a mode (used at startup to apply the persisted record).
    pub fn set_mode(&mut self, mode: Mode) {
        let _ = self.mode_fsm.set_state(mode as u8);
        self.mode_ctx = ModeContext::for_mode(mode, &self.settings);
    }

    pub fn page(&self) -> MenuPage {
        MenuPage::from_index(self.menu_fsm.state())
    }

    pub fn output(&self) -> bool {
        self.output_state
    }

    pub fn cv_state(&self) -> bool {
        self.cv_input.state()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Per-tick descriptor for the LED feedback controller.
    pub fn led_feedback(&self) -> LedFeedback {
        let mode = self.mode();
        let page = self.page();

        let (setting_value, setting_count) = match page {
            MenuPage::GateCv => (self.settings.gate_a_mode, GateButtonMode::COUNT),
            MenuPage::TriggerBehavior => (self.settings.trigger_edge, TriggerEdge::COUNT),
            MenuPage::TriggerPulseLen => (
                self.settings.trigger_pulse_idx,
                TRIGGER_PULSE_VALUES.len() as u8,
            ),
            MenuPage::ToggleBehavior => (self.settings.toggle_edge, ToggleEdge::COUNT),
            MenuPage::DivideDivisor => (
                self.settings.divide_divisor_idx,
                DIVIDE_DIVISOR_VALUES.len() as u8,
            ),
            MenuPage::CyclePattern => (
                self.settings.cycle_tempo_idx,
                CYCLE_PERIOD_VALUES.len() as u8,
            ),
            MenuPage::CvGlobal | MenuPage::MenuTimeout => (0, 1),
        };

        LedFeedback {
            mode_color: led::mode_color(mode as u8),
            activity_color: led::ACTIVITY_COLOR,
            activity_brightness: self.mode_ctx.activity_brightness(),
            mode: mode as u8,
            page: page as u8,
            in_menu: self.in_menu(),
            setting_value,
            setting_count,
        }
    }
}

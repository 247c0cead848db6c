//! Table-driven finite state machine engine.
//!
//! A reusable engine instantiated three times by the coordinator (top,
//! mode, menu). States and transitions are declarative static tables;
//! behavior hangs off small action ids.
//!
//! ```text
//! Transition table          (from, event) ──▶ (to, action)
//!   ┌───────────┬─────────┬───────────────┬────────────┐
//!   │ from      │ event   │ to            │ action     │
//!   ├───────────┼─────────┼───────────────┼────────────┤
//!   │ Perform   │ MenuTog │ Menu          │ EnterMenu  │
//!   │ ANY_STATE │ ModeNext│ NO_TRANSITION │ NextMode   │
//!   └───────────┴─────────┴───────────────┴────────────┘
//! ```
//!
//! ## Action dispatch
//!
//! Actions do not run inside the engine. Each engine operation returns the
//! action ids to execute, already ordered (exit → transition → enter), and
//! the owner runs them against itself. That preserves the classic embedded
//! contract — actions see a consistent "current coordinator" for the
//! duration of one update — without a process-wide pointer, and keeps the
//! engine free of borrows into its owner.
//!
//! ## Table storage
//!
//! Tables are immutable statics; on flash-constrained targets they can be
//! placed in program memory with a link-section attribute. The engine
//! copies each row to the stack before inspecting it and never holds
//! references into the tables.

use heapless::Vec;

/// Wildcard for a transition's `from` side: matches any current state.
pub const ANY_STATE: u8 = 0xFE;
/// Wildcard for a transition's `to` side: run the action, keep the state.
pub const NO_TRANSITION: u8 = 0xFF;

/// One state row: identity plus optional action ids.
#[derive(Debug, Clone, Copy)]
pub struct State<A: Copy> {
    pub id: u8,
    pub on_enter: Option<A>,
    pub on_exit: Option<A>,
    pub on_update: Option<A>,
}

impl<A: Copy> State<A> {
    /// A state with no attached actions.
    pub const fn plain(id: u8) -> Self {
        Self {
            id,
            on_enter: None,
            on_exit: None,
            on_update: None,
        }
    }
}

/// One transition row: `(from, event) → (to, action)`.
#[derive(Debug, Clone, Copy)]
pub struct Transition<A: Copy> {
    pub from: u8,
    pub event: u8,
    pub to: u8,
    pub action: Option<A>,
}

/// Ordered action ids the caller must execute after an engine operation.
/// At most exit + transition + enter for a single operation.
pub type Actions<A> = Vec<A, 4>;

/// Result of [`Fsm::process`].
#[derive(Debug)]
pub struct Outcome<A: Copy> {
    /// True if the current state changed (the event was consumed by a
    /// full transition). `NO_TRANSITION` rows run their action but
    /// report false, matching the routing contract.
    pub changed: bool,
    pub actions: Actions<A>,
}

/// An FSM instance over static tables.
pub struct Fsm<A: Copy + 'static> {
    states: &'static [State<A>],
    transitions: &'static [Transition<A>],
    current: u8,
    initial: u8,
    active: bool,
}

impl<A: Copy + 'static> Fsm<A> {
    pub const fn new(
        states: &'static [State<A>],
        transitions: &'static [Transition<A>],
        initial: u8,
    ) -> Self {
        Self {
            states,
            transitions,
            current: initial,
            initial,
            active: false,
        }
    }

    /// Activate and return the initial state's enter action.
    pub fn start(&mut self) -> Actions<A> {
        self.active = true;
        let mut actions = Actions::new();
        self.push_enter(&mut actions, self.current);
        actions
    }

    /// Find the first matching transition for `event` and follow it.
    ///
    /// Linear search in table order; the first row whose `from` matches
    /// (exactly or via [`ANY_STATE`]) and whose event matches wins.
    pub fn process(&mut self, event: u8) -> Outcome<A> {
        let mut actions = Actions::new();

        if !self.active {
            return Outcome {
                changed: false,
                actions,
            };
        }

        for i in 0..self.transitions.len() {
            // Row copied by value; no reference into the table survives.
            let t = self.transitions[i];

            let state_matches = t.from == self.current || t.from == ANY_STATE;
            if !state_matches || t.event != event {
                continue;
            }

            if t.to == NO_TRANSITION {
                if let Some(a) = t.action {
                    let _ = actions.push(a);
                }
                return Outcome {
                    changed: false,
                    actions,
                };
            }

            self.push_exit(&mut actions, self.current);
            if let Some(a) = t.action {
                let _ = actions.push(a);
            }
            self.current = t.to;
            self.push_enter(&mut actions, self.current);

            return Outcome {
                changed: true,
                actions,
            };
        }

        Outcome {
            changed: false,
            actions,
        }
    }

    /// The current state's per-tick update action, if any.
    pub fn update(&self) -> Option<A> {
        if !self.active {
            return None;
        }
        self.find_state(self.current).and_then(|s| s.on_update)
    }

    /// Return to the initial state, running exit and enter actions.
    pub fn reset(&mut self) -> Actions<A> {
        let mut actions = Actions::new();
        if self.active {
            self.push_exit(&mut actions, self.current);
        }
        self.current = self.initial;
        if self.active {
            self.push_enter(&mut actions, self.current);
        }
        actions
    }

    /// Run the current exit action and deactivate.
    pub fn stop(&mut self) -> Actions<A> {
        let mut actions = Actions::new();
        if self.active {
            self.push_exit(&mut actions, self.current);
            self.active = false;
        }
        actions
    }

    /// Force a state, bypassing the transition table. Used for
    /// context-aware jumps such as menu entry at a mode-specific page.
    pub fn set_state(&mut self, state_id: u8) -> Actions<A> {
        let mut actions = Actions::new();
        if self.active {
            self.push_exit(&mut actions, self.current);
        }
        self.current = state_id;
        if self.active {
            self.push_enter(&mut actions, self.current);
        }
        actions
    }

    pub fn state(&self) -> u8 {
        self.current
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn find_state(&self, id: u8) -> Option<State<A>> {
        // Copies the row out of the table.
        self.states.iter().find(|s| s.id == id).copied()
    }

    fn push_enter(&self, actions: &mut Actions<A>, id: u8) {
        if let Some(a) = self.find_state(id).and_then(|s| s.on_enter) {
            let _ = actions.push(a);
        }
    }

    fn push_exit(&self, actions: &mut Actions<A>, id: u8) {
        if let Some(a) = self.find_state(id).and_then(|s| s.on_exit) {
            let _ = actions.push(a);
        }
    }
}

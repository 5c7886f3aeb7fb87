//! Session lifecycle states

use std::fmt;

/// Where the session is in its input/dispatch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Ready for the next line
    #[default]
    Idle,
    /// A submitted line is being tokenized and resolved
    Parsing,
    /// A handler is executing
    Dispatching,
    /// A delegated process owns the terminal
    ProcessActive,
    /// One interrupt received from idle; a second one closes the session
    ConfirmExit,
    /// Terminal state
    Closed,
}

impl SessionState {
    /// Whether the line editor should be reading in this state
    pub fn accepts_input(self) -> bool {
        matches!(self, SessionState::Idle | SessionState::ConfirmExit)
    }

    pub fn is_closed(self) -> bool {
        self == SessionState::Closed
    }

    /// Legal successor states
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;

        if next == Closed {
            return self != Closed;
        }

        match self {
            Idle => matches!(next, Parsing | ConfirmExit),
            Parsing => matches!(next, Idle | Dispatching),
            Dispatching => matches!(next, Idle | ProcessActive),
            ProcessActive => matches!(next, Idle),
            ConfirmExit => matches!(next, Idle | ConfirmExit),
            Closed => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Parsing => "parsing",
            SessionState::Dispatching => "dispatching",
            SessionState::ProcessActive => "process-active",
            SessionState::ConfirmExit => "confirm-exit",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

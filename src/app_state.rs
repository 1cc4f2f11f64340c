// app_state.rs

use strum_macros::Display;

/// Lifecycle of one conversation session.
///
/// `Won` is not a separate state: a won session keeps accepting turns, so it is
/// `Ready` with the win flag set (see [`Phase`]).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Evaluating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    Uninitialized,
    Initializing,
    Ready,
    Evaluating,
    Won,
}

impl Phase {
    pub fn of(state: SessionState, has_won: bool) -> Self {
        match state {
            SessionState::Uninitialized => Phase::Uninitialized,
            SessionState::Initializing => Phase::Initializing,
            SessionState::Evaluating => Phase::Evaluating,
            SessionState::Ready if has_won => Phase::Won,
            SessionState::Ready => Phase::Ready,
        }
    }
}

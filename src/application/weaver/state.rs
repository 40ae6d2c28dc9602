use std::fmt;

use crate::domain::error::DomainError;

/// Lifecycle of one accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Loading,
    Resolved,
    Failed,
}

impl RequestState {
    pub fn can_transition_to(self, next: RequestState) -> bool {
        matches!(
            (self, next),
            (RequestState::Idle, RequestState::Loading)
                | (RequestState::Loading, RequestState::Resolved)
                | (RequestState::Loading, RequestState::Failed)
        )
    }

    pub fn transition(self, next: RequestState) -> Result<RequestState, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::invariant(format!(
                "request cannot move from {self} to {next}"
            )))
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestState::Resolved | RequestState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Loading => "loading",
            RequestState::Resolved => "resolved",
            RequestState::Failed => "failed",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

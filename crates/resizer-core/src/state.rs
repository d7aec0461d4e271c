//! Resize state machine types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// States for a `ResizeActor` state machine
///
/// States only move forward; steps left out of a workflow are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeState {
    Pending,
    AwaitingStatusOk,
    Stopping,
    Resizing,
    Reconfiguring,
    Starting,
    Resolving,
    Completed,
    Failed,
}

impl ResizeState {
    /// Whether the request has produced its terminal event
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ResizeState::Completed | ResizeState::Failed)
    }

    /// Check whether moving to `next` is allowed
    #[must_use]
    pub fn can_transition_to(self, next: ResizeState) -> bool {
        if self.is_terminal() {
            return false;
        }

        match next {
            ResizeState::Failed | ResizeState::Completed => true,
            _ => next > self,
        }
    }
}

impl fmt::Display for ResizeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResizeState::Pending => "pending",
            ResizeState::AwaitingStatusOk => "awaiting_status_ok",
            ResizeState::Stopping => "stopping",
            ResizeState::Resizing => "resizing",
            ResizeState::Reconfiguring => "reconfiguring",
            ResizeState::Starting => "starting",
            ResizeState::Resolving => "resolving",
            ResizeState::Completed => "completed",
            ResizeState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Failed state details
#[derive(Debug, Clone)]
pub struct FailedStateContext {
    /// State the request was in when it failed
    pub previous_state: ResizeState,
    /// Error text reported on the error event
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

impl FailedStateContext {
    /// Capture a failure now
    pub fn new(previous_state: ResizeState, error: impl Into<String>) -> Self {
        Self {
            previous_state,
            error: error.into(),
            failed_at: Utc::now(),
        }
    }
}

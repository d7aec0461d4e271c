//! Error types for resizer-cloud

use std::time::Duration;

use thiserror::Error;

use crate::types::{InstanceState, TargetState};

/// Errors that can occur while driving a compute instance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Client could not be built from the supplied settings
    #[error("provider client error: {0}")]
    Client(String),

    /// A remote API call failed
    #[error("{operation} failed: {message}")]
    Api {
        /// Name of the failed call
        operation: &'static str,
        /// Provider error text
        message: String,
    },

    /// The provider rejected a call because of the instance's current state
    #[error("instance {instance_id} is in incorrect state: {state}")]
    IncorrectInstanceState {
        /// Target instance
        instance_id: String,
        /// State the provider reported
        state: InstanceState,
    },

    /// A blocking wait ended in a failure state
    #[error("waiting for {instance_id} to reach {target} failed: {message}")]
    Wait {
        /// Target instance
        instance_id: String,
        /// State that was awaited
        target: TargetState,
        /// Provider error text
        message: String,
    },

    /// A blocking wait exceeded its maximum duration
    #[error("timed out after {timeout:?} waiting for {instance_id} to reach {target}")]
    Timeout {
        /// Target instance
        instance_id: String,
        /// State that was awaited
        target: TargetState,
        /// Maximum wait that was exceeded
        timeout: Duration,
    },

    /// Lookup returned no reservation
    #[error("no reservation found for instance {0}")]
    NoReservation(String),

    /// Lookup returned more than one reservation
    #[error("ambiguous reservation for instance {instance_id}: {count} reservations")]
    AmbiguousReservation {
        /// Target instance
        instance_id: String,
        /// Number of reservations returned
        count: usize,
    },

    /// The matched reservation holds no instance
    #[error("no instance found in reservation for {0}")]
    NoInstance(String),

    /// The matched reservation holds more than one instance
    #[error("ambiguous instance {instance_id}: {count} instances in reservation")]
    AmbiguousInstance {
        /// Target instance
        instance_id: String,
        /// Number of instances in the reservation
        count: usize,
    },
}

impl ProviderError {
    /// Shorthand for a failed API call
    pub fn api(operation: &'static str, message: impl Into<String>) -> Self {
        ProviderError::Api {
            operation,
            message: message.into(),
        }
    }

    /// Check whether the error says the instance is already stopped
    #[must_use]
    pub fn is_already_stopped(&self) -> bool {
        matches!(
            self,
            ProviderError::IncorrectInstanceState {
                state: InstanceState::Stopped,
                ..
            }
        )
    }
}

//! Core error types for resizer-core

use resizer_api::ValidationError;
use resizer_cloud::ProviderError;
use thiserror::Error;

use crate::state::ResizeState;

/// Errors that end a resize request
///
/// The display text of the error is what lands in the request's
/// `error` field on the error event.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// A required request field is empty
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A remote call or blocking wait failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Invalid state transition attempted
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        /// Current state
        from: ResizeState,
        /// Attempted target state
        to: ResizeState,
    },

    /// The request could not be serialized for reporting
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// An error report could not be produced; no channel is left to report it on
#[derive(Error, Debug, Clone)]
#[error("cannot serialize error report for request {request_id}: {message}")]
pub struct FatalReportError {
    /// Correlation id of the request being reported
    pub request_id: String,
    /// Serializer error text
    pub message: String,
}

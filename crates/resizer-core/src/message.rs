//! Message types for actor communication
//!
//! Message handlers are implemented in their respective actor modules.

use chrono::{DateTime, Utc};
use kameo_macros::Reply;

use resizer_api::ResizeRequest;

use crate::report::Terminal;
use crate::state::ResizeState;

// ============================================================================
// ResizeActor Messages
// ============================================================================

/// Run the workflow and emit the terminal event
#[derive(Debug)]
pub struct Execute;

/// Result of one executed request
#[derive(Debug, Clone)]
pub struct ResizeOutcome {
    /// Correlation id
    pub request_id: String,
    /// `Completed` or `Failed`
    pub state: ResizeState,
    /// Public address captured after start
    pub public_ip: Option<String>,
    /// Error text reported on the error event
    pub error: Option<String>,
}

/// Live view of one request, published by its actor on every transition
#[derive(Debug, Clone)]
pub struct ResizeStatus {
    /// Correlation id
    pub request_id: String,
    /// Target instance
    pub instance_id: String,
    /// Requested instance type
    pub instance_type: String,
    /// Current state
    pub state: ResizeState,
    /// Error message if in failed state
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResizeStatus {
    /// Initial status for a request about to run
    #[must_use]
    pub fn pending(request: &ResizeRequest) -> Self {
        let now = Utc::now();
        Self {
            request_id: request.id.clone(),
            instance_id: request.instance_id.clone(),
            instance_type: request.instance_type.clone(),
            state: ResizeState::Pending,
            error: None,
            started_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// DispatcherActor Messages
// ============================================================================

/// Inbound payload from the message gateway
#[derive(Debug)]
pub struct Dispatch {
    /// Raw message body
    pub payload: Vec<u8>,
}

/// What the dispatcher did with a payload
#[derive(Debug, Clone, PartialEq, Eq, Reply)]
pub enum DispatchOutcome {
    /// Not a resize request; the raw payload was echoed on the error subject
    Unparseable,
    /// Failed before any remote call; an error event was emitted
    Rejected {
        /// Correlation id
        request_id: String,
        /// Error text
        reason: String,
    },
    /// Handed to a `ResizeActor`
    Dispatched {
        /// Correlation id
        request_id: String,
    },
}

/// Sent by a worker task once its request has emitted its terminal event
#[derive(Debug)]
pub struct WorkerFinished {
    /// Dispatcher-assigned sequence number
    pub seq: u64,
    /// Which terminal event was emitted
    pub terminal: Terminal,
}

/// Get dispatcher counters
#[derive(Debug)]
pub struct GetStats;

/// Dispatcher counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Reply)]
pub struct DispatchStats {
    /// Payloads received
    pub received: u64,
    /// Payloads that failed to parse
    pub unparseable: u64,
    /// Requests rejected before any remote call
    pub rejected: u64,
    /// Requests handed to a worker
    pub dispatched: u64,
    /// Requests that emitted a completion event
    pub completed: u64,
    /// Dispatched requests that emitted an error event
    pub failed: u64,
    /// Workers still running
    pub in_flight: usize,
}

/// List requests currently being executed
#[derive(Debug)]
pub struct ListInFlight;

//! resizer-core: Actor framework and resize orchestration
//!
//! Implements the `DispatcherActor` and `ResizeActor` using kameo framework.
//! Contains the workflow steps, state machine, and outcome reporting.

pub mod actor;
pub mod config;
pub mod error;
pub mod message;
pub mod report;
pub mod state;
pub mod workflow;

pub use actor::dispatcher::{DispatcherActor, DispatcherActorArgs, ProviderFactory};
pub use actor::resize::{ResizeActor, ResizeActorArgs};
pub use config::WorkflowConfig;
pub use error::{CoreError, FatalReportError};
pub use message::{
    Dispatch, DispatchOutcome, DispatchStats, Execute, GetStats, ListInFlight, ResizeOutcome,
    ResizeStatus, WorkerFinished,
};
pub use report::{EventPublisher, PublishError, Reporter, Terminal};
pub use state::{FailedStateContext, ResizeState};
pub use workflow::{ResizeStep, Workflow};

//! `ResizeActor`: Per-request orchestration
//!
//! Owns one request for its whole lifetime: drives the workflow against the
//! target instance and emits exactly one terminal event.

use std::sync::Arc;

use chrono::Utc;
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use resizer_api::ResizeRequest;
use resizer_cloud::ComputeProvider;

use crate::error::{CoreError, FatalReportError};
use crate::message::{Execute, ResizeOutcome, ResizeStatus};
use crate::report::{Reporter, Terminal};
use crate::state::{FailedStateContext, ResizeState};
use crate::workflow::Workflow;

/// Arguments for spawning a `ResizeActor`
pub struct ResizeActorArgs {
    /// Validated request
    pub request: ResizeRequest,
    /// Provider built from the request's own credentials
    pub provider: Arc<dyn ComputeProvider>,
    /// Steps to run
    pub workflow: Workflow,
    /// Terminal event emitter
    pub reporter: Reporter,
    /// Live status for observers
    pub status_tx: watch::Sender<ResizeStatus>,
    /// Escalation path for unreportable failures
    pub fatal_tx: mpsc::UnboundedSender<FatalReportError>,
}

/// Per-request actor running the resize workflow
pub struct ResizeActor {
    request: ResizeRequest,
    state: ResizeState,
    failed_context: Option<FailedStateContext>,
    provider: Arc<dyn ComputeProvider>,
    workflow: Workflow,
    reporter: Reporter,
    status_tx: watch::Sender<ResizeStatus>,
    fatal_tx: mpsc::UnboundedSender<FatalReportError>,
}

impl ResizeActor {
    /// Transition to a new state with validation and status update
    fn transition_to(&mut self, new_state: ResizeState) -> Result<(), CoreError> {
        if !self.state.can_transition_to(new_state) {
            return Err(CoreError::InvalidTransition {
                from: self.state,
                to: new_state,
            });
        }

        let old_state = self.state;
        self.state = new_state;

        info!(
            request_id = %self.request.id,
            instance_id = %self.request.instance_id,
            from = %old_state,
            to = %new_state,
            "state transition"
        );

        self.publish_status();
        Ok(())
    }

    /// Transition to `Failed`, preserving error context
    fn fail_with_error(&mut self, error: impl Into<String>) {
        let previous = self.state;
        let context = FailedStateContext::new(previous, error);

        error!(
            request_id = %self.request.id,
            instance_id = %self.request.instance_id,
            previous_state = %previous,
            error = %context.error,
            "request entered failed state"
        );

        self.failed_context = Some(context);
        self.state = ResizeState::Failed;
        self.publish_status();
    }

    fn publish_status(&self) {
        let state = self.state;
        let error = self.failed_context.as_ref().map(|c| c.error.clone());
        // Ignore send errors (no observers is fine)
        self.status_tx.send_modify(|status| {
            status.state = state;
            status.error = error;
            status.updated_at = Utc::now();
        });
    }

    /// Run every step in order, stopping at the first failure
    async fn run_workflow(&mut self) -> Result<(), CoreError> {
        let steps = self.workflow.steps().to_vec();

        for step in steps {
            self.transition_to(step.state())?;

            debug!(request_id = %self.request.id, step = %step, "running step");

            if let Err(e) = step.run(self.provider.as_ref(), &mut self.request).await {
                error!(
                    request_id = %self.request.id,
                    instance_id = %self.request.instance_id,
                    step = %step,
                    error = %e,
                    "step failed, aborting workflow"
                );
                return Err(e.into());
            }
        }

        Ok(())
    }

    fn escalate(&self, fatal: FatalReportError) {
        error!(error = %fatal, "unreportable failure");
        let _ = self.fatal_tx.send(fatal);
    }

    fn outcome(&self) -> ResizeOutcome {
        ResizeOutcome {
            request_id: self.request.id.clone(),
            state: self.state,
            public_ip: self.request.public_ip().map(str::to_string),
            error: self.failed_context.as_ref().map(|c| c.error.clone()),
        }
    }
}

impl Actor for ResizeActor {
    type Args = ResizeActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        debug!(
            request_id = %args.request.id,
            provider = args.provider.provider_type(),
            id = %actor_ref.id(),
            "ResizeActor starting"
        );

        Ok(Self {
            request: args.request,
            state: ResizeState::Pending,
            failed_context: None,
            provider: args.provider,
            workflow: args.workflow,
            reporter: args.reporter,
            status_tx: args.status_tx,
            fatal_tx: args.fatal_tx,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        debug!(
            request_id = %self.request.id,
            state = %self.state,
            reason = ?reason,
            "ResizeActor stopping"
        );
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<Execute> for ResizeActor {
    type Reply = Result<ResizeOutcome, CoreError>;

    async fn handle(
        &mut self,
        _msg: Execute,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        // One terminal event per request
        if self.state != ResizeState::Pending {
            return Err(CoreError::InvalidTransition {
                from: self.state,
                to: ResizeState::Pending,
            });
        }

        let reported = match self.run_workflow().await {
            Ok(()) => self.reporter.complete(&mut self.request).await,
            Err(err) => {
                self.fail_with_error(err.to_string());
                self.reporter.error(&mut self.request, &err).await
            }
        };

        match reported {
            Ok(Terminal::Completed) => self.transition_to(ResizeState::Completed)?,
            Ok(Terminal::Failed) => {
                if !self.state.is_terminal() {
                    self.fail_with_error(self.request.error_message.clone());
                }
            }
            Err(fatal) => {
                if !self.state.is_terminal() {
                    self.fail_with_error(fatal.to_string());
                }
                self.escalate(fatal);
            }
        }

        Ok(self.outcome())
    }
}

//! `DispatcherActor`: Request intake
//!
//! Parses and validates inbound payloads, then hands each valid request to
//! its own `ResizeActor` running on a separate task. Requests never wait on
//! each other, including requests that target the same instance.

use std::collections::HashMap;
use std::sync::Arc;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use resizer_api::ResizeRequest;
use resizer_cloud::{ComputeProvider, ProviderError};

use crate::actor::resize::{ResizeActor, ResizeActorArgs};
use crate::config::WorkflowConfig;
use crate::error::{CoreError, FatalReportError};
use crate::message::{
    Dispatch, DispatchOutcome, DispatchStats, Execute, GetStats, ListInFlight, ResizeStatus,
    WorkerFinished,
};
use crate::report::{EventPublisher, Reporter, Terminal};
use crate::state::ResizeState;

/// Factory trait for building a provider from a request's own credentials
///
/// Called once per validated request; providers are never shared between
/// requests.
#[async_trait::async_trait]
pub trait ProviderFactory: Send + Sync {
    /// Build a provider for the request's region and credential pair
    async fn create_provider(
        &self,
        request: &ResizeRequest,
    ) -> Result<Arc<dyn ComputeProvider>, ProviderError>;
}

/// Arguments for spawning a `DispatcherActor`
pub struct DispatcherActorArgs {
    /// Factory for per-request providers
    pub provider_factory: Arc<dyn ProviderFactory>,
    /// Outbound gateway
    pub publisher: Arc<dyn EventPublisher>,
    /// Validation, workflow and reporting settings
    pub config: WorkflowConfig,
    /// Receives failures that cannot be reported on the bus
    pub fatal_tx: mpsc::UnboundedSender<FatalReportError>,
}

/// A worker that has not finished yet
struct InFlight {
    worker: ActorRef<ResizeActor>,
    status: watch::Receiver<ResizeStatus>,
}

/// Process-wide intake actor
pub struct DispatcherActor {
    /// Running workers by sequence number
    in_flight: HashMap<u64, InFlight>,
    next_seq: u64,
    stats: DispatchStats,
    config: WorkflowConfig,
    reporter: Reporter,
    provider_factory: Arc<dyn ProviderFactory>,
    fatal_tx: mpsc::UnboundedSender<FatalReportError>,
    self_ref: WeakActorRef<Self>,
}

impl DispatcherActor {
    fn escalate(&self, fatal: FatalReportError) {
        error!(error = %fatal, "unreportable failure");
        let _ = self.fatal_tx.send(fatal);
    }

    /// Report a failure that happened before any worker existed
    async fn reject(&mut self, mut request: ResizeRequest, err: CoreError) -> DispatchOutcome {
        self.stats.rejected += 1;

        if let Err(fatal) = self.reporter.error(&mut request, &err).await {
            self.escalate(fatal);
        }

        DispatchOutcome::Rejected {
            request_id: request.id,
            reason: err.to_string(),
        }
    }

    /// Spawn a `ResizeActor` for the request and drive it on its own task
    fn spawn_worker(&mut self, request: ResizeRequest, provider: Arc<dyn ComputeProvider>) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let request_id = request.id.clone();
        let (status_tx, status_rx) = watch::channel(ResizeStatus::pending(&request));

        let args = ResizeActorArgs {
            request,
            provider,
            workflow: self.config.steps.clone(),
            reporter: self.reporter.clone(),
            status_tx,
            fatal_tx: self.fatal_tx.clone(),
        };

        let worker = ResizeActor::spawn(args);
        self.in_flight.insert(
            seq,
            InFlight {
                worker: worker.clone(),
                status: status_rx,
            },
        );
        self.stats.dispatched += 1;

        info!(request_id = %request_id, seq, "spawned ResizeActor");

        let dispatcher = self.self_ref.clone();
        tokio::spawn(async move {
            let terminal = match worker.ask(Execute).await {
                Ok(outcome) if outcome.state == ResizeState::Completed => Terminal::Completed,
                Ok(_) => Terminal::Failed,
                Err(e) => {
                    error!(request_id = %request_id, error = %e, "worker did not finish");
                    Terminal::Failed
                }
            };

            worker.stop_gracefully().await.ok();

            if let Some(dispatcher) = dispatcher.upgrade() {
                dispatcher
                    .tell(WorkerFinished { seq, terminal })
                    .await
                    .ok();
            }
        });
    }
}

impl Actor for DispatcherActor {
    type Args = DispatcherActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        info!(
            id = %actor_ref.id(),
            steps = ?args.config.steps.steps(),
            "DispatcherActor starting"
        );

        Ok(Self {
            in_flight: HashMap::new(),
            next_seq: 0,
            stats: DispatchStats::default(),
            reporter: Reporter::new(args.publisher, args.config.echo_credentials),
            config: args.config,
            provider_factory: args.provider_factory,
            fatal_tx: args.fatal_tx,
            self_ref: actor_ref.downgrade(),
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        // Running workflows are not cancelled
        info!(
            reason = ?reason,
            in_flight = self.in_flight.len(),
            "DispatcherActor stopping"
        );
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<Dispatch> for DispatcherActor {
    type Reply = DispatchOutcome;

    async fn handle(
        &mut self,
        msg: Dispatch,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.stats.received += 1;

        let request = match ResizeRequest::from_payload(&msg.payload) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, bytes = msg.payload.len(), "echoing unparseable payload");
                self.stats.unparseable += 1;
                self.reporter.raw_error(&msg.payload).await;
                return DispatchOutcome::Unparseable;
            }
        };

        if let Err(e) = request.validate_with(self.config.rules()) {
            warn!(request_id = %request.id, field = e.field(), "request rejected");
            return self.reject(request, e.into()).await;
        }

        let provider = match self.provider_factory.create_provider(&request).await {
            Ok(provider) => provider,
            Err(e) => return self.reject(request, e.into()).await,
        };

        let request_id = request.id.clone();
        self.spawn_worker(request, provider);

        DispatchOutcome::Dispatched { request_id }
    }
}

impl Message<WorkerFinished> for DispatcherActor {
    type Reply = ();

    async fn handle(
        &mut self,
        msg: WorkerFinished,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if self.in_flight.remove(&msg.seq).is_none() {
            warn!(seq = msg.seq, "finished worker was not tracked");
        }

        match msg.terminal {
            Terminal::Completed => self.stats.completed += 1,
            Terminal::Failed => self.stats.failed += 1,
        }
    }
}

impl Message<GetStats> for DispatcherActor {
    type Reply = DispatchStats;

    async fn handle(
        &mut self,
        _msg: GetStats,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        DispatchStats {
            in_flight: self.in_flight.len(),
            ..self.stats.clone()
        }
    }
}

impl Message<ListInFlight> for DispatcherActor {
    type Reply = Vec<ResizeStatus>;

    async fn handle(
        &mut self,
        _msg: ListInFlight,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let mut statuses: Vec<ResizeStatus> = self
            .in_flight
            .values()
            .filter(|f| f.worker.is_alive())
            .map(|f| f.status.borrow().clone())
            .collect();

        statuses.sort_by_key(|s| s.started_at);
        statuses
    }
}

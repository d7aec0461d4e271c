//! NATS message gateway
//!
//! One connection per process. Inbound messages on `instance.update.aws`
//! are handed to the dispatcher; terminal events go out over the same
//! client through `NatsPublisher`.

use std::time::Duration;

use async_nats::{Client, ConnectOptions, Subscriber};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use kameo::actor::ActorRef;
use tracing::{debug, info, instrument};

use resizer_api::subjects::INSTANCE_UPDATE;
use resizer_core::{Dispatch, DispatcherActor, EventPublisher, PublishError};

use crate::config::NatsConfig;

/// Connect to the message bus
///
/// # Errors
/// Returns error if the server cannot be reached
#[instrument(skip(config), fields(uri = %config.uri))]
pub async fn connect(config: &NatsConfig) -> eyre::Result<Client> {
    let options = ConnectOptions::default()
        .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
        .name(&config.connection_name);

    let client = async_nats::connect_with_options(config.uri.as_str(), options)
        .await
        .map_err(|e| eyre::eyre!("failed to connect to {}: {e}", config.uri))?;

    info!(name = %config.connection_name, "connected to message bus");
    Ok(client)
}

/// Subscribe to inbound resize requests, within the queue group if configured
///
/// # Errors
/// Returns error if the subscription cannot be created
pub async fn subscribe(client: &Client, config: &NatsConfig) -> eyre::Result<Subscriber> {
    let subscriber = match &config.queue_group {
        Some(group) => {
            info!(queue_group = %group, "joining queue group");
            client
                .queue_subscribe(INSTANCE_UPDATE, group.clone())
                .await
        }
        None => client.subscribe(INSTANCE_UPDATE).await,
    }
    .map_err(|e| eyre::eyre!("failed to subscribe to {INSTANCE_UPDATE}: {e}"))?;

    Ok(subscriber)
}

/// Forward every inbound payload to the dispatcher
///
/// Only returns when the subscription ends or the dispatcher is gone.
///
/// # Errors
/// Returns error in both cases, since the worker cannot make progress
pub async fn run(mut subscriber: Subscriber, dispatcher: ActorRef<DispatcherActor>) -> eyre::Result<()> {
    info!("listening for {INSTANCE_UPDATE}");

    while let Some(message) = subscriber.next().await {
        debug!(
            subject = %message.subject,
            bytes = message.payload.len(),
            "received message"
        );

        dispatcher
            .tell(Dispatch {
                payload: message.payload.to_vec(),
            })
            .await
            .map_err(|e| eyre::eyre!("dispatcher unavailable: {e}"))?;
    }

    Err(eyre::eyre!("subscription to {INSTANCE_UPDATE} closed"))
}

/// `EventPublisher` over the shared NATS client
#[derive(Clone)]
pub struct NatsPublisher {
    client: Client,
}

impl NatsPublisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        self.client
            .publish(subject.to_string(), Bytes::from(payload))
            .await
            .map_err(|e| PublishError {
                subject: subject.to_string(),
                message: e.to_string(),
            })
    }
}

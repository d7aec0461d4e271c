//! Outbound event reporting
//!
//! Every request that reaches validation gets exactly one terminal event:
//! `instance.update.aws.done` or `instance.update.aws.error`. Payloads that
//! fail to parse are echoed raw on the error subject.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use resizer_api::ResizeRequest;
use resizer_api::subjects::{INSTANCE_UPDATE_DONE, INSTANCE_UPDATE_ERROR};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::error::{CoreError, FatalReportError};

/// Message bus publish failed
#[derive(Error, Debug, Clone)]
#[error("publish to {subject} failed: {message}")]
pub struct PublishError {
    pub subject: String,
    pub message: String,
}

/// Outbound side of the message gateway
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}

/// Which terminal event was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Completed,
    Failed,
}

/// Emits terminal events for requests
#[derive(Clone)]
pub struct Reporter {
    publisher: Arc<dyn EventPublisher>,
    echo_credentials: bool,
}

impl Reporter {
    /// Create a reporter
    ///
    /// # Arguments
    /// * `publisher` - Outbound gateway
    /// * `echo_credentials` - Keep the credential pair in outbound payloads
    pub fn new(publisher: Arc<dyn EventPublisher>, echo_credentials: bool) -> Self {
        Self {
            publisher,
            echo_credentials,
        }
    }

    /// Echo an unparseable payload unchanged on the error subject
    pub async fn raw_error(&self, payload: &[u8]) {
        self.send(INSTANCE_UPDATE_ERROR, payload.to_vec()).await;
    }

    /// Record `err` on the request and emit it on the error subject
    ///
    /// # Errors
    /// Returns `FatalReportError` if the request cannot be serialized
    pub async fn error(
        &self,
        request: &mut ResizeRequest,
        err: &CoreError,
    ) -> Result<Terminal, FatalReportError> {
        request.error_message = err.to_string();

        warn!(
            request_id = %request.id,
            instance_id = %request.instance_id,
            error = %request.error_message,
            "request failed"
        );

        let payload = self.encode(request).map_err(|e| FatalReportError {
            request_id: request.id.clone(),
            message: e.to_string(),
        })?;

        self.send(INSTANCE_UPDATE_ERROR, payload).await;
        Ok(Terminal::Failed)
    }

    /// Emit the request on the done subject
    ///
    /// Falls back to the error subject if the request cannot be serialized.
    ///
    /// # Errors
    /// Returns `FatalReportError` if the fallback error report fails as well
    pub async fn complete(
        &self,
        request: &mut ResizeRequest,
    ) -> Result<Terminal, FatalReportError> {
        request.error_message.clear();

        match self.encode(request) {
            Ok(payload) => {
                info!(
                    request_id = %request.id,
                    instance_id = %request.instance_id,
                    public_ip = request.public_ip().unwrap_or("-"),
                    "request completed"
                );
                self.send(INSTANCE_UPDATE_DONE, payload).await;
                Ok(Terminal::Completed)
            }
            Err(e) => {
                self.error(request, &CoreError::Serialization(e.to_string()))
                    .await
            }
        }
    }

    fn encode(&self, request: &ResizeRequest) -> Result<Vec<u8>, serde_json::Error> {
        let outbound = if self.echo_credentials {
            Cow::Borrowed(request)
        } else {
            Cow::Owned(request.redacted())
        };
        outbound.to_payload()
    }

    /// Publish failures are logged and not retried
    async fn send(&self, subject: &str, payload: Vec<u8>) {
        if let Err(e) = self.publisher.publish(subject, payload).await {
            error!(error = %e, "failed to publish event");
        }
    }
}

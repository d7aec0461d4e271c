//! EC2 compute provider
//!
//! One provider is built per request from that request's region and
//! credential pair; it is dropped with the request.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::client::Waiters;
use aws_sdk_ec2::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::AttributeValue;
use aws_smithy_runtime_api::client::waiters::error::WaiterError;
use tracing::{debug, instrument, warn};

use crate::error::ProviderError;
use crate::traits::ComputeProvider;
use crate::types::{InstanceDescription, InstanceState, Reservation, TargetState};

/// Default upper bound for a single provider wait
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Tuning shared by every EC2 provider the worker builds
#[derive(Debug, Clone)]
pub struct Ec2Settings {
    /// Upper bound for each blocking wait
    pub max_wait: Duration,
    /// Override the service endpoint (local emulators)
    pub endpoint_url: Option<String>,
}

impl Default for Ec2Settings {
    fn default() -> Self {
        Self {
            max_wait: DEFAULT_MAX_WAIT,
            endpoint_url: None,
        }
    }
}

/// `ComputeProvider` backed by the EC2 API
pub struct Ec2Provider {
    client: Client,
    max_wait: Duration,
}

impl Ec2Provider {
    /// Build a client for one request
    ///
    /// # Arguments
    /// * `region` - Region the instance lives in
    /// * `access_key` - Access key id from the request
    /// * `secret` - Secret access key from the request
    /// * `settings` - Shared wait and endpoint settings
    pub fn new(region: &str, access_key: &str, secret: &str, settings: &Ec2Settings) -> Self {
        let credentials = Credentials::new(access_key, secret, None, None, "resize-request");

        let mut builder = aws_sdk_ec2::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials);

        if let Some(url) = &settings.endpoint_url {
            builder = builder.endpoint_url(url);
        }

        Self {
            client: Client::from_conf(builder.build()),
            max_wait: settings.max_wait,
        }
    }

    fn wait_failure(
        &self,
        instance_id: &str,
        target: TargetState,
        exceeded: bool,
        message: String,
    ) -> ProviderError {
        if exceeded {
            ProviderError::Timeout {
                instance_id: instance_id.to_string(),
                target,
                timeout: self.max_wait,
            }
        } else {
            ProviderError::Wait {
                instance_id: instance_id.to_string(),
                target,
                message,
            }
        }
    }
}

impl fmt::Debug for Ec2Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ec2Provider")
            .field("max_wait", &self.max_wait)
            .finish_non_exhaustive()
    }
}

fn api_error<E, R>(operation: &'static str, err: &SdkError<E, R>) -> ProviderError
where
    E: std::error::Error + 'static,
    R: fmt::Debug,
{
    ProviderError::api(operation, DisplayErrorContext(err).to_string())
}

fn describe(instance: &aws_sdk_ec2::types::Instance) -> InstanceDescription {
    InstanceDescription {
        instance_id: instance.instance_id().unwrap_or_default().to_string(),
        instance_type: instance.instance_type().map(|t| t.as_str().to_string()),
        state: instance
            .state()
            .and_then(|s| s.name())
            .map(|name| InstanceState::from_name(name.as_str())),
        public_ip: instance.public_ip_address().map(str::to_string),
    }
}

#[async_trait]
impl ComputeProvider for Ec2Provider {
    #[instrument(skip(self, target), fields(target_state = %target), level = "debug")]
    async fn wait_until(
        &self,
        instance_id: &str,
        target: TargetState,
    ) -> Result<(), ProviderError> {
        debug!(max_wait = ?self.max_wait, "waiting for instance state");

        let result = match target {
            TargetState::StatusOk => self
                .client
                .wait_until_instance_status_ok()
                .instance_ids(instance_id)
                .wait(self.max_wait)
                .await
                .map(|_| ())
                .map_err(|e| {
                    let exceeded = matches!(e, WaiterError::ExceededMaxWait(_));
                    (exceeded, DisplayErrorContext(&e).to_string())
                }),
            TargetState::Stopped => self
                .client
                .wait_until_instance_stopped()
                .instance_ids(instance_id)
                .wait(self.max_wait)
                .await
                .map(|_| ())
                .map_err(|e| {
                    let exceeded = matches!(e, WaiterError::ExceededMaxWait(_));
                    (exceeded, DisplayErrorContext(&e).to_string())
                }),
            TargetState::Running => self
                .client
                .wait_until_instance_running()
                .instance_ids(instance_id)
                .wait(self.max_wait)
                .await
                .map(|_| ())
                .map_err(|e| {
                    let exceeded = matches!(e, WaiterError::ExceededMaxWait(_));
                    (exceeded, DisplayErrorContext(&e).to_string())
                }),
        };

        result.map_err(|(exceeded, message)| {
            self.wait_failure(instance_id, target, exceeded, message)
        })
    }

    #[instrument(skip(self), level = "debug")]
    async fn stop_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        match self
            .client
            .stop_instances()
            .instance_ids(instance_id)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                if err.as_service_error().and_then(|e| e.code()) != Some("IncorrectInstanceState") {
                    return Err(api_error("StopInstances", &err));
                }
                drop(err);

                let state = self
                    .lookup_instance(instance_id)
                    .await?
                    .state
                    .unwrap_or(InstanceState::Unknown);

                warn!(%state, "stop rejected for current instance state");

                Err(ProviderError::IncorrectInstanceState {
                    instance_id: instance_id.to_string(),
                    state,
                })
            }
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn start_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.client
            .start_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| api_error("StartInstances", &e))?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn modify_instance_type(
        &self,
        instance_id: &str,
        instance_type: &str,
    ) -> Result<(), ProviderError> {
        self.client
            .modify_instance_attribute()
            .instance_id(instance_id)
            .instance_type(AttributeValue::builder().value(instance_type).build())
            .send()
            .await
            .map_err(|e| api_error("ModifyInstanceAttribute", &e))?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn replace_security_groups(
        &self,
        instance_id: &str,
        group_ids: &[String],
    ) -> Result<(), ProviderError> {
        self.client
            .modify_instance_attribute()
            .instance_id(instance_id)
            .set_groups(Some(group_ids.to_vec()))
            .send()
            .await
            .map_err(|e| api_error("ModifyInstanceAttribute", &e))?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn describe_reservations(
        &self,
        instance_id: &str,
    ) -> Result<Vec<Reservation>, ProviderError> {
        let output = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| api_error("DescribeInstances", &e))?;

        Ok(output
            .reservations()
            .iter()
            .map(|r| Reservation {
                reservation_id: r.reservation_id().map(str::to_string),
                instances: r.instances().iter().map(describe).collect(),
            })
            .collect())
    }

    fn provider_type(&self) -> &'static str {
        "ec2"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_keeps_max_wait() {
        let settings = Ec2Settings {
            max_wait: Duration::from_secs(5),
            endpoint_url: Some("http://127.0.0.1:4566".to_string()),
        };
        let provider = Ec2Provider::new("eu-west-1", "key", "secret", &settings);

        assert_eq!(provider.provider_type(), "ec2");
        assert_eq!(provider.max_wait, Duration::from_secs(5));
    }

    #[test]
    fn test_debug_omits_client() {
        let provider = Ec2Provider::new("eu-west-1", "AKIAEXAMPLE", "secret", &Ec2Settings::default());
        let printed = format!("{provider:?}");

        assert!(!printed.contains("AKIAEXAMPLE"));
        assert!(printed.contains("max_wait"));
    }

    #[test]
    fn test_wait_failure_classification() {
        let provider = Ec2Provider::new("eu-west-1", "key", "secret", &Ec2Settings::default());

        let timeout = provider.wait_failure("i-1", TargetState::Stopped, true, String::new());
        assert!(matches!(timeout, ProviderError::Timeout { .. }));

        let failed = provider.wait_failure(
            "i-1",
            TargetState::Running,
            false,
            "instance terminated".to_string(),
        );
        assert_eq!(
            failed,
            ProviderError::Wait {
                instance_id: "i-1".to_string(),
                target: TargetState::Running,
                message: "instance terminated".to_string(),
            }
        );
    }
}

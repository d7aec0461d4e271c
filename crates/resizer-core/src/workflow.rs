//! Resize workflow: an ordered list of named lifecycle steps
//!
//! Every step is one or two provider calls and a discrete failure point. The
//! first failing step ends the workflow; nothing is rolled back, so a failure
//! after `Stop` leaves the instance stopped.

use std::fmt;

use resizer_api::ResizeRequest;
use resizer_cloud::{ComputeProvider, ProviderError, TargetState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CoreError;
use crate::state::ResizeState;

/// One lifecycle step of the resize workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeStep {
    /// Block until the instance reports status OK
    AwaitStatusOk,
    /// Stop the instance and block until it is stopped
    Stop,
    /// Apply the requested instance type
    ModifyType,
    /// Replace security-group membership with the requested set
    ReplaceSecurityGroups,
    /// Start the instance and block until it is running
    Start,
    /// Capture the instance's public address, if any
    ResolvePublicIp,
}

impl ResizeStep {
    /// Every step, in execution order
    pub const ALL: [ResizeStep; 6] = [
        ResizeStep::AwaitStatusOk,
        ResizeStep::Stop,
        ResizeStep::ModifyType,
        ResizeStep::ReplaceSecurityGroups,
        ResizeStep::Start,
        ResizeStep::ResolvePublicIp,
    ];

    /// Step name used in logs
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ResizeStep::AwaitStatusOk => "await_status_ok",
            ResizeStep::Stop => "stop",
            ResizeStep::ModifyType => "modify_type",
            ResizeStep::ReplaceSecurityGroups => "replace_security_groups",
            ResizeStep::Start => "start",
            ResizeStep::ResolvePublicIp => "resolve_public_ip",
        }
    }

    /// State the request is in while this step runs
    #[must_use]
    pub fn state(self) -> ResizeState {
        match self {
            ResizeStep::AwaitStatusOk => ResizeState::AwaitingStatusOk,
            ResizeStep::Stop => ResizeState::Stopping,
            ResizeStep::ModifyType => ResizeState::Resizing,
            ResizeStep::ReplaceSecurityGroups => ResizeState::Reconfiguring,
            ResizeStep::Start => ResizeState::Starting,
            ResizeStep::ResolvePublicIp => ResizeState::Resolving,
        }
    }

    /// Run this step against the request's instance
    ///
    /// # Errors
    /// Returns the provider error of the first failed call or wait
    pub async fn run(
        self,
        provider: &dyn ComputeProvider,
        request: &mut ResizeRequest,
    ) -> Result<(), ProviderError> {
        let instance_id = request.instance_id.as_str();

        match self {
            ResizeStep::AwaitStatusOk => {
                provider
                    .wait_until(instance_id, TargetState::StatusOk)
                    .await
            }
            ResizeStep::Stop => {
                match provider.stop_instance(instance_id).await {
                    Ok(()) => {}
                    Err(e) if e.is_already_stopped() => {
                        info!(instance_id, "instance already stopped");
                    }
                    Err(e) => return Err(e),
                }
                provider.wait_until(instance_id, TargetState::Stopped).await
            }
            ResizeStep::ModifyType => {
                provider
                    .modify_instance_type(instance_id, &request.instance_type)
                    .await
            }
            ResizeStep::ReplaceSecurityGroups => {
                provider
                    .replace_security_groups(instance_id, &request.security_group_ids)
                    .await
            }
            ResizeStep::Start => {
                provider.start_instance(instance_id).await?;
                provider.wait_until(instance_id, TargetState::Running).await
            }
            ResizeStep::ResolvePublicIp => {
                let instance = provider.lookup_instance(instance_id).await?;
                match instance.public_ip {
                    Some(ip) => {
                        debug!(instance_id, public_ip = %ip, "captured public address");
                        request.public_ip = ip;
                    }
                    None => debug!(instance_id, "instance has no public address"),
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for ResizeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, duplicate-free subset of `ResizeStep::ALL`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ResizeStep>", into = "Vec<ResizeStep>")]
pub struct Workflow {
    steps: Vec<ResizeStep>,
}

impl Workflow {
    /// All six steps
    #[must_use]
    pub fn full() -> Self {
        Self {
            steps: ResizeStep::ALL.to_vec(),
        }
    }

    /// Build a workflow from a step list
    ///
    /// # Errors
    /// Returns `ConfigError` if the list is empty, repeats a step, or is out
    /// of execution order
    pub fn new(steps: Vec<ResizeStep>) -> Result<Self, CoreError> {
        if steps.is_empty() {
            return Err(CoreError::ConfigError(
                "workflow needs at least one step".to_string(),
            ));
        }

        if let Some(pair) = steps.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CoreError::ConfigError(format!(
                "workflow step {} cannot follow {}",
                pair[1], pair[0]
            )));
        }

        Ok(Self { steps })
    }

    /// Steps in execution order
    #[must_use]
    pub fn steps(&self) -> &[ResizeStep] {
        &self.steps
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::full()
    }
}

impl TryFrom<Vec<ResizeStep>> for Workflow {
    type Error = CoreError;

    fn try_from(steps: Vec<ResizeStep>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<Workflow> for Vec<ResizeStep> {
    fn from(workflow: Workflow) -> Self {
        workflow.steps
    }
}

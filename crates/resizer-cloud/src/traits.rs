//! Compute provider trait

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{InstanceDescription, Reservation, TargetState, single_instance};

/// Remote lifecycle operations on a single compute instance
///
/// Waits block until the provider reports the target state, using the
/// provider's own polling; implementations never retry calls themselves.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Block until the instance reaches `target`
    async fn wait_until(&self, instance_id: &str, target: TargetState)
    -> Result<(), ProviderError>;

    /// Issue a stop command
    async fn stop_instance(&self, instance_id: &str) -> Result<(), ProviderError>;

    /// Issue a start command
    async fn start_instance(&self, instance_id: &str) -> Result<(), ProviderError>;

    /// Change the instance type; the instance must be stopped
    async fn modify_instance_type(
        &self,
        instance_id: &str,
        instance_type: &str,
    ) -> Result<(), ProviderError>;

    /// Replace security-group membership; an empty slice clears it
    async fn replace_security_groups(
        &self,
        instance_id: &str,
        group_ids: &[String],
    ) -> Result<(), ProviderError>;

    /// Describe reservations matching the instance id
    async fn describe_reservations(
        &self,
        instance_id: &str,
    ) -> Result<Vec<Reservation>, ProviderError>;

    /// Look up exactly one instance by id
    async fn lookup_instance(
        &self,
        instance_id: &str,
    ) -> Result<InstanceDescription, ProviderError> {
        let reservations = self.describe_reservations(instance_id).await?;
        single_instance(instance_id, reservations)
    }

    /// Short name for logs
    fn provider_type(&self) -> &'static str;
}

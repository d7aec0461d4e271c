//! Provider factory building one EC2 client per request

use std::sync::Arc;

use async_trait::async_trait;
use resizer_api::ResizeRequest;
use resizer_cloud::{ComputeProvider, Ec2Provider, Ec2Settings, ProviderError};
use resizer_core::ProviderFactory;

/// `ProviderFactory` backed by EC2, using the credentials carried by each request
pub struct Ec2ProviderFactory {
    settings: Ec2Settings,
}

impl Ec2ProviderFactory {
    /// Create a new factory instance
    pub fn new(settings: Ec2Settings) -> Self {
        Self { settings }
    }

    fn build(&self, request: &ResizeRequest) -> Result<Ec2Provider, ProviderError> {
        if request.datacenter_region.trim().is_empty() {
            return Err(ProviderError::Client("empty region".to_string()));
        }

        Ok(Ec2Provider::new(
            &request.datacenter_region,
            &request.datacenter_access_key,
            &request.datacenter_access_token,
            &self.settings,
        ))
    }
}

impl Default for Ec2ProviderFactory {
    fn default() -> Self {
        Self::new(Ec2Settings::default())
    }
}

#[async_trait]
impl ProviderFactory for Ec2ProviderFactory {
    async fn create_provider(
        &self,
        request: &ResizeRequest,
    ) -> Result<Arc<dyn ComputeProvider>, ProviderError> {
        let provider = self.build(request)?;
        tracing::debug!(
            request_id = %request.id,
            region = %request.datacenter_region,
            "created EC2 provider"
        );
        Ok(Arc::new(provider))
    }
}

//! Configuration types for request handling

use resizer_api::ValidationRules;
use serde::{Deserialize, Serialize};

use crate::workflow::Workflow;

/// How each inbound request is validated, executed and reported
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Lifecycle steps to run, in execution order
    #[serde(default)]
    pub steps: Workflow,
    /// Reject requests without an instance key pair
    #[serde(default)]
    pub require_key_pair: bool,
    /// Keep the credential pair in outbound done/error payloads
    #[serde(default)]
    pub echo_credentials: bool,
}

impl WorkflowConfig {
    /// Validation rules derived from this config
    #[must_use]
    pub fn rules(&self) -> ValidationRules {
        ValidationRules {
            require_key_pair: self.require_key_pair,
        }
    }
}

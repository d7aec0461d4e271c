//! Instance and reservation types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Lifecycle state of a compute instance as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Unknown,
}

impl InstanceState {
    /// Parse a provider state name, mapping anything unrecognised to `Unknown`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "pending" => InstanceState::Pending,
            "running" => InstanceState::Running,
            "shutting-down" => InstanceState::ShuttingDown,
            "terminated" => InstanceState::Terminated,
            "stopping" => InstanceState::Stopping,
            "stopped" => InstanceState::Stopped,
            _ => InstanceState::Unknown,
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// State a blocking wait can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    /// Instance status checks report OK
    StatusOk,
    /// Instance is fully stopped
    Stopped,
    /// Instance is fully running
    Running,
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetState::StatusOk => "status ok",
            TargetState::Stopped => "stopped",
            TargetState::Running => "running",
        };
        write!(f, "{s}")
    }
}

/// The subset of an instance description the worker reads
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceDescription {
    /// Instance identifier
    pub instance_id: String,
    /// Current instance type
    pub instance_type: Option<String>,
    /// Current lifecycle state
    pub state: Option<InstanceState>,
    /// Public IPv4 address, absent for private-only instances
    pub public_ip: Option<String>,
}

impl InstanceDescription {
    /// Create a description with only the id set
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            ..Default::default()
        }
    }

    /// Set the public address
    #[must_use]
    pub fn with_public_ip(mut self, ip: impl Into<String>) -> Self {
        self.public_ip = Some(ip.into());
        self
    }

    /// Set the lifecycle state
    #[must_use]
    pub fn with_state(mut self, state: InstanceState) -> Self {
        self.state = Some(state);
        self
    }
}

/// Provider grouping returned by an instance lookup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reservation {
    /// Reservation identifier
    pub reservation_id: Option<String>,
    /// Instances launched in this reservation
    pub instances: Vec<InstanceDescription>,
}

impl Reservation {
    /// Create a reservation holding the given instances
    #[must_use]
    pub fn new(instances: Vec<InstanceDescription>) -> Self {
        Self {
            reservation_id: None,
            instances,
        }
    }
}

/// Reduce a lookup-by-id result to its single instance
///
/// # Errors
/// Returns a distinct `ProviderError` for zero or several reservations, and
/// for zero or several instances in the matched reservation
pub fn single_instance(
    instance_id: &str,
    mut reservations: Vec<Reservation>,
) -> Result<InstanceDescription, ProviderError> {
    match reservations.len() {
        0 => return Err(ProviderError::NoReservation(instance_id.to_string())),
        1 => {}
        count => {
            return Err(ProviderError::AmbiguousReservation {
                instance_id: instance_id.to_string(),
                count,
            });
        }
    }

    let mut instances = reservations.remove(0).instances;
    match instances.len() {
        0 => Err(ProviderError::NoInstance(instance_id.to_string())),
        1 => Ok(instances.remove(0)),
        count => Err(ProviderError::AmbiguousInstance {
            instance_id: instance_id.to_string(),
            count,
        }),
    }
}

//! Error types for resizer-api

use thiserror::Error;

/// Inbound payload is not a well-formed resize request
#[derive(Error, Debug)]
#[error("malformed payload: {0}")]
pub struct ParseError(#[from] pub serde_json::Error);

/// First required field found empty during validation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("datacenter vpc id invalid")]
    DatacenterEndpointId,

    #[error("datacenter region invalid")]
    DatacenterRegion,

    /// Either half of the access key / token pair is missing
    #[error("datacenter credentials invalid")]
    DatacenterCredentials,

    #[error("network id invalid")]
    NetworkId,

    #[error("instance id invalid")]
    InstanceId,

    #[error("instance name invalid")]
    InstanceName,

    #[error("instance image invalid")]
    InstanceImage,

    #[error("instance type invalid")]
    InstanceType,

    #[error("instance key pair invalid")]
    InstanceKeyPair,
}

impl ValidationError {
    /// Human-readable label of the offending field
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::DatacenterEndpointId => "datacenter vpc id",
            ValidationError::DatacenterRegion => "datacenter region",
            ValidationError::DatacenterCredentials => "datacenter credentials",
            ValidationError::NetworkId => "network id",
            ValidationError::InstanceId => "instance id",
            ValidationError::InstanceName => "instance name",
            ValidationError::InstanceImage => "instance image",
            ValidationError::InstanceType => "instance type",
            ValidationError::InstanceKeyPair => "instance key pair",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_field() {
        let err = ValidationError::InstanceId;
        assert_eq!(err.field(), "instance id");
        assert_eq!(err.to_string(), "instance id invalid");
    }

    #[test]
    fn test_parse_error_wraps_serde_message() {
        let err: ParseError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("malformed payload:"));
    }
}

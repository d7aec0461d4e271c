//! Resize request payload

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ParseError;

/// A single resize command as carried on `instance.update.aws`
///
/// Absent inbound fields deserialize to empty values so that a missing field
/// surfaces as a validation failure rather than a parse failure.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeRequest {
    /// Correlation id, echoed back unchanged
    pub id: String,
    #[serde(rename = "datacenter_vpc_id")]
    pub datacenter_endpoint_id: String,
    pub datacenter_region: String,
    pub datacenter_access_key: String,
    pub datacenter_access_token: String,
    #[serde(rename = "network_aws_id")]
    pub network_id: String,
    /// New security-group membership; empty clears all groups
    #[serde(
        rename = "security_group_aws_ids",
        deserialize_with = "null_as_empty"
    )]
    pub security_group_ids: Vec<String>,
    #[serde(rename = "instance_aws_id", skip_serializing_if = "String::is_empty")]
    pub instance_id: String,
    pub instance_name: String,
    pub instance_image: String,
    /// Instance type to apply
    pub instance_type: String,
    pub instance_key_pair: String,
    /// Set after a successful resize when the provider reports one
    #[serde(skip_serializing_if = "String::is_empty")]
    pub public_ip: String,
    /// Set when the request fails
    #[serde(rename = "error", skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResizeRequest {
    /// Parse an inbound payload
    ///
    /// # Errors
    /// Returns `ParseError` if the payload is not a JSON object of the
    /// expected shape
    pub fn from_payload(payload: &[u8]) -> Result<Self, ParseError> {
        let value: serde_json::Value = serde_json::from_slice(payload)?;
        if !value.is_object() {
            return Err(ParseError(serde_json::Error::custom(
                "expected a JSON object",
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize the full request, output fields included
    ///
    /// # Errors
    /// Returns the serializer error unchanged
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Copy with the credential pair cleared, for outbound events
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            datacenter_access_key: String::new(),
            datacenter_access_token: String::new(),
            ..self.clone()
        }
    }

    /// Public address captured after the resize, if any
    #[must_use]
    pub fn public_ip(&self) -> Option<&str> {
        (!self.public_ip.is_empty()).then_some(self.public_ip.as_str())
    }
}

impl fmt::Debug for ResizeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeRequest")
            .field("id", &self.id)
            .field("datacenter_endpoint_id", &self.datacenter_endpoint_id)
            .field("datacenter_region", &self.datacenter_region)
            .field("datacenter_access_key", &"<redacted>")
            .field("datacenter_access_token", &"<redacted>")
            .field("network_id", &self.network_id)
            .field("security_group_ids", &self.security_group_ids)
            .field("instance_id", &self.instance_id)
            .field("instance_name", &self.instance_name)
            .field("instance_image", &self.instance_image)
            .field("instance_type", &self.instance_type)
            .field("instance_key_pair", &self.instance_key_pair)
            .field("public_ip", &self.public_ip)
            .field("error_message", &self.error_message)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "id": "req-1",
        "datacenter_vpc_id": "vpc-1234",
        "datacenter_region": "eu-west-1",
        "datacenter_access_key": "AKIAEXAMPLE",
        "datacenter_access_token": "secret",
        "network_aws_id": "subnet-1",
        "security_group_aws_ids": ["sg-1", "sg-2"],
        "instance_aws_id": "i-0abc",
        "instance_name": "web-1",
        "instance_image": "ami-1",
        "instance_type": "t3.large",
        "instance_key_pair": "deploy"
    }"#;

    #[test]
    fn test_parse_wire_names() {
        let req = ResizeRequest::from_payload(PAYLOAD.as_bytes()).unwrap();

        assert_eq!(req.id, "req-1");
        assert_eq!(req.datacenter_endpoint_id, "vpc-1234");
        assert_eq!(req.network_id, "subnet-1");
        assert_eq!(req.security_group_ids, vec!["sg-1", "sg-2"]);
        assert_eq!(req.instance_id, "i-0abc");
        assert_eq!(req.instance_type, "t3.large");
        assert!(req.public_ip().is_none());
        assert!(req.error_message.is_empty());
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let req = ResizeRequest::from_payload(br#"{"id": "req-2"}"#).unwrap();
        assert_eq!(req.id, "req-2");
        assert!(req.instance_id.is_empty());
        assert!(req.security_group_ids.is_empty());
    }

    #[test]
    fn test_null_security_groups_read_as_empty() {
        let req =
            ResizeRequest::from_payload(br#"{"id": "x", "security_group_aws_ids": null}"#).unwrap();
        assert!(req.security_group_ids.is_empty());
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        assert!(ResizeRequest::from_payload(b"not json").is_err());
        assert!(ResizeRequest::from_payload(b"[1, 2]").is_err());
        assert!(ResizeRequest::from_payload(br#"{"instance_aws_id": 42}"#).is_err());
    }

    #[test]
    fn test_reparse_keeps_inbound_fields() {
        let original = ResizeRequest::from_payload(PAYLOAD.as_bytes()).unwrap();

        let mut processed = original.clone();
        processed.public_ip = "203.0.113.7".to_string();

        let reparsed = ResizeRequest::from_payload(&processed.to_payload().unwrap()).unwrap();
        assert_eq!(reparsed.public_ip(), Some("203.0.113.7"));

        let reparsed = ResizeRequest {
            public_ip: String::new(),
            ..reparsed
        };
        assert_eq!(reparsed, original);
    }

    #[test]
    fn test_output_fields_omitted_when_empty() {
        let req = ResizeRequest::from_payload(PAYLOAD.as_bytes()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&req.to_payload().unwrap()).unwrap();

        assert!(value.get("error").is_none());
        assert!(value.get("public_ip").is_none());
        assert_eq!(value["security_group_aws_ids"][1], "sg-2");
    }

    #[test]
    fn test_redacted_clears_credentials_only() {
        let req = ResizeRequest::from_payload(PAYLOAD.as_bytes()).unwrap();
        let redacted = req.redacted();

        assert!(redacted.datacenter_access_key.is_empty());
        assert!(redacted.datacenter_access_token.is_empty());
        assert_eq!(redacted.instance_id, req.instance_id);
    }

    #[test]
    fn test_debug_hides_credentials() {
        let req = ResizeRequest::from_payload(PAYLOAD.as_bytes()).unwrap();
        let printed = format!("{req:?}");

        assert!(!printed.contains("AKIAEXAMPLE"));
        assert!(!printed.contains("secret"));
        assert!(printed.contains("i-0abc"));
    }
}

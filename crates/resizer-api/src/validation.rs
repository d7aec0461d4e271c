//! Request validation

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::request::ResizeRequest;

/// Optional checks layered on the fixed required-field set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Also reject requests without an instance key pair
    #[serde(default)]
    pub require_key_pair: bool,
}

impl ResizeRequest {
    /// Validate with the default rules
    ///
    /// # Errors
    /// Returns the first empty required field
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_with(ValidationRules::default())
    }

    /// Check required fields in a fixed order; the first violation wins
    ///
    /// # Errors
    /// Returns the first empty required field
    pub fn validate_with(&self, rules: ValidationRules) -> Result<(), ValidationError> {
        if self.datacenter_endpoint_id.is_empty() {
            return Err(ValidationError::DatacenterEndpointId);
        }

        if self.datacenter_region.is_empty() {
            return Err(ValidationError::DatacenterRegion);
        }

        if self.datacenter_access_key.is_empty() || self.datacenter_access_token.is_empty() {
            return Err(ValidationError::DatacenterCredentials);
        }

        if self.network_id.is_empty() {
            return Err(ValidationError::NetworkId);
        }

        if self.instance_id.is_empty() {
            return Err(ValidationError::InstanceId);
        }

        if self.instance_name.is_empty() {
            return Err(ValidationError::InstanceName);
        }

        if self.instance_image.is_empty() {
            return Err(ValidationError::InstanceImage);
        }

        if self.instance_type.is_empty() {
            return Err(ValidationError::InstanceType);
        }

        if rules.require_key_pair && self.instance_key_pair.is_empty() {
            return Err(ValidationError::InstanceKeyPair);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ResizeRequest {
        ResizeRequest {
            id: "req-1".to_string(),
            datacenter_endpoint_id: "vpc-1".to_string(),
            datacenter_region: "eu-west-1".to_string(),
            datacenter_access_key: "key".to_string(),
            datacenter_access_token: "token".to_string(),
            network_id: "subnet-1".to_string(),
            security_group_ids: vec![],
            instance_id: "i-1".to_string(),
            instance_name: "web".to_string(),
            instance_image: "ami-1".to_string(),
            instance_type: "t3.micro".to_string(),
            instance_key_pair: String::new(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn test_each_required_field_is_reported() {
        let cases: [(fn(&mut ResizeRequest), ValidationError); 9] = [
            (|r| r.datacenter_endpoint_id.clear(), ValidationError::DatacenterEndpointId),
            (|r| r.datacenter_region.clear(), ValidationError::DatacenterRegion),
            (|r| r.datacenter_access_key.clear(), ValidationError::DatacenterCredentials),
            (|r| r.datacenter_access_token.clear(), ValidationError::DatacenterCredentials),
            (|r| r.network_id.clear(), ValidationError::NetworkId),
            (|r| r.instance_id.clear(), ValidationError::InstanceId),
            (|r| r.instance_name.clear(), ValidationError::InstanceName),
            (|r| r.instance_image.clear(), ValidationError::InstanceImage),
            (|r| r.instance_type.clear(), ValidationError::InstanceType),
        ];

        for (mutate, expected) in cases {
            let mut req = valid();
            mutate(&mut req);
            assert_eq!(req.validate(), Err(expected));
        }
    }

    #[test]
    fn test_first_violation_wins() {
        let mut req = valid();
        req.instance_type.clear();
        req.datacenter_region.clear();

        assert_eq!(req.validate(), Err(ValidationError::DatacenterRegion));
    }

    #[test]
    fn test_key_pair_only_checked_when_required() {
        let req = valid();
        assert!(req.validate().is_ok());

        let rules = ValidationRules {
            require_key_pair: true,
        };
        assert_eq!(
            req.validate_with(rules),
            Err(ValidationError::InstanceKeyPair)
        );
    }

    #[test]
    fn test_empty_security_groups_are_valid() {
        let mut req = valid();
        req.security_group_ids.clear();
        assert!(req.validate().is_ok());
    }
}

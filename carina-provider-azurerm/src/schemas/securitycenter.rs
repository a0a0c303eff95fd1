//! Security Center (Defender for Cloud) schema definitions

use carina_core::resource::Value;
use carina_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::types;

pub const DEFAULT_PRICING_RESOURCE_TYPE: &str = "VirtualMachines";

/// Returns the schema for subscription pricings
pub fn subscription_pricing_schema() -> ResourceSchema {
    ResourceSchema::new("azurerm.security_center_subscription_pricing")
        .with_description("Pricing tier of a Defender for Cloud plan for the subscription")
        .attribute(
            AttributeSchema::new("tier", types::pricing_tier())
                .required()
                .with_description("Pricing tier: Free or Standard"),
        )
        .attribute(
            AttributeSchema::new("resource_type", types::pricing_resource_type())
                .force_new()
                .with_default(Value::String(DEFAULT_PRICING_RESOURCE_TYPE.to_string()))
                .with_description("Defender plan the tier applies to"),
        )
        .attribute(
            AttributeSchema::new("subplan", AttributeType::String)
                .with_description("Sub-plan of the Defender plan"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn tier_is_required() {
        let errors = subscription_pricing_schema()
            .validate(&HashMap::new())
            .unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn resource_type_defaults_to_virtual_machines() {
        let schema = subscription_pricing_schema();
        let mut attrs = HashMap::new();
        attrs.insert(
            "tier".to_string(),
            Value::String("Tier.Standard".to_string()),
        );
        schema.apply_defaults(&mut attrs);

        assert!(schema.validate(&attrs).is_ok());
        assert_eq!(
            attrs.get("resource_type"),
            Some(&Value::String("VirtualMachines".to_string()))
        );
    }

    #[test]
    fn unknown_resource_type_is_rejected() {
        let mut attrs = HashMap::new();
        attrs.insert("tier".to_string(), Value::String("Free".to_string()));
        attrs.insert(
            "resource_type".to_string(),
            Value::String("Mainframes".to_string()),
        );
        assert!(subscription_pricing_schema().validate(&attrs).is_err());
    }
}

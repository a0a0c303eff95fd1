//! Azure-specific type definitions

use std::sync::LazyLock;

use carina_core::resource::Value;
use carina_core::schema::AttributeType;
use regex::Regex;

use crate::client::pricings::PricingTier;

static WEB_APP_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9a-zA-Z-]{2,60}$").ok());

static RESOURCE_GROUP_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[-\w._()]+$").ok());

fn matches(re: &LazyLock<Option<Regex>>, input: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(input))
}

/// Defender plans a subscription pricing can be set for
pub const PRICING_RESOURCE_TYPES: &[&str] = &[
    "Api",
    "AppServices",
    "ContainerRegistry",
    "KeyVaults",
    "KubernetesService",
    "SqlServers",
    "SqlServerVirtualMachines",
    "StorageAccounts",
    "VirtualMachines",
    "Arm",
    "Dns",
    "OpenSourceRelationalDatabases",
    "Containers",
    "CosmosDbs",
    "CloudPosture",
];

pub fn validate_web_app_name(name: &str) -> Result<(), String> {
    if matches(&WEB_APP_NAME, name) {
        Ok(())
    } else {
        Err(format!(
            "web app name '{}' may only contain alphanumeric characters and dashes and must be 2 to 60 characters long",
            name
        ))
    }
}

pub fn validate_resource_group_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.chars().count() > 90 {
        return Err(format!(
            "resource group name '{}' must be between 1 and 90 characters",
            name
        ));
    }
    if !matches(&RESOURCE_GROUP_NAME, name) {
        return Err(format!(
            "resource group name '{}' may only contain alphanumeric characters, dash, underscores, parentheses and periods",
            name
        ));
    }
    if name.ends_with('.') {
        return Err(format!(
            "resource group name '{}' cannot end with a period",
            name
        ));
    }
    Ok(())
}

/// App Service web app name
pub fn web_app_name() -> AttributeType {
    AttributeType::Custom {
        name: "WebAppName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) => validate_web_app_name(s),
            Value::ResourceRef(_, _) => Ok(()),
            _ => Err("Expected string".to_string()),
        },
        namespace: None,
    }
}

/// Resource group name
pub fn resource_group_name() -> AttributeType {
    AttributeType::Custom {
        name: "ResourceGroupName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) => validate_resource_group_name(s),
            Value::ResourceRef(_, _) => Ok(()),
            _ => Err("Expected string".to_string()),
        },
        namespace: None,
    }
}

/// Free | Standard
pub fn pricing_tier() -> AttributeType {
    AttributeType::Enum(
        PricingTier::ALL
            .iter()
            .map(|t| t.as_str().to_string())
            .collect(),
    )
}

pub fn pricing_resource_type() -> AttributeType {
    AttributeType::Enum(
        PRICING_RESOURCE_TYPES
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn web_app_names() {
        let t = web_app_name();
        assert!(t.validate(&s("my-app-01")).is_ok());
        assert!(t.validate(&s("ab")).is_ok());
        assert!(t.validate(&s("a")).is_err());
        assert!(t.validate(&s(&"a".repeat(61))).is_err());
        assert!(t.validate(&s("my_app")).is_err());
        assert!(t.validate(&s("my.app")).is_err());
        assert!(t.validate(&Value::Int(1)).is_err());
        assert!(
            t.validate(&Value::ResourceRef("app".to_string(), "name".to_string()))
                .is_ok()
        );
    }

    #[test]
    fn resource_group_names() {
        assert!(validate_resource_group_name("rg-prod_01.(west)").is_ok());
        assert!(validate_resource_group_name(&"r".repeat(90)).is_ok());
        assert!(validate_resource_group_name("").is_err());
        assert!(validate_resource_group_name(&"r".repeat(91)).is_err());
        assert!(validate_resource_group_name("rg.").is_err());
        assert!(validate_resource_group_name("rg/1").is_err());
        assert!(validate_resource_group_name("rg 1").is_err());
    }

    #[test]
    fn pricing_enums() {
        assert!(pricing_tier().validate(&s("Free")).is_ok());
        assert!(pricing_tier().validate(&s("Premium")).is_err());
        assert!(pricing_resource_type().validate(&s("CosmosDbs")).is_ok());
        assert!(
            pricing_resource_type()
                .validate(&s("ResourceType.KeyVaults"))
                .is_ok()
        );
        assert!(pricing_resource_type().validate(&s("Storage")).is_err());
    }
}

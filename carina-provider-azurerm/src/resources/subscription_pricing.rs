//! azurerm.security_center_subscription_pricing - Defender plan tiers
//!
//! There is nothing to create or destroy remotely: every plan always has a
//! pricing. Creating sets the tier, deleting resets it to Free.

use std::collections::HashMap;

use async_trait::async_trait;
use carina_core::provider::{ProviderError, ProviderResult, ResourceType};
use carina_core::resource::{Resource, ResourceId, State, Value};
use carina_core::schema::ResourceSchema;
use carina_core::timeouts::ResourceTimeouts;

use super::{AzureResource, ResourceContext, api_error, required_str};
use crate::client::pricings::{Pricing, PricingTier};
use crate::ids::PricingId;
use crate::schemas::securitycenter::{DEFAULT_PRICING_RESOURCE_TYPE, subscription_pricing_schema};

pub const RESOURCE_TYPE: &str = "security_center_subscription_pricing";

/// Pricing name used by schema version 0, before plans were selectable
const LEGACY_PRICING_NAME: &str = "default";

pub struct SubscriptionPricingResource;

impl SubscriptionPricingResource {
    fn pricing_id(ctx: &ResourceContext<'_>, resource: &Resource) -> PricingId {
        let resource_type = resource
            .get_str("resource_type")
            .unwrap_or(DEFAULT_PRICING_RESOURCE_TYPE);
        PricingId::new(ctx.subscription_id, resource_type)
    }

    fn desired_pricing(resource: &Resource) -> ProviderResult<Pricing> {
        let tier: PricingTier = required_str(resource, "tier")?
            .parse()
            .map_err(|e: String| ProviderError::new(e).for_resource(resource.id.clone()))?;
        let sub_plan = resource
            .get_str("subplan")
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        Ok(Pricing::with_tier(tier, sub_plan))
    }

    async fn set_pricing(
        ctx: &ResourceContext<'_>,
        id: &PricingId,
        resource: &Resource,
    ) -> ProviderResult<()> {
        let pricing = Self::desired_pricing(resource)?;
        ctx.pricings()
            .update(id, &pricing)
            .await
            .map_err(|e| api_error(format!("setting {}", id), e))
    }
}

impl ResourceType for SubscriptionPricingResource {
    fn name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        subscription_pricing_schema()
    }

    fn timeouts(&self) -> ResourceTimeouts {
        ResourceTimeouts::write_minutes(60)
    }

    fn validate_import_id(&self, identifier: &str) -> Result<(), String> {
        PricingId::validate(identifier)
    }

    fn schema_version(&self) -> u32 {
        1
    }

    fn upgrade_state(&self, from_version: u32, state: State) -> ProviderResult<State> {
        match from_version {
            0 => upgrade_v0_to_v1(state),
            _ => Ok(state),
        }
    }
}

/// v0 tracked a single "default" pricing; it is the VirtualMachines plan now
fn upgrade_v0_to_v1(mut state: State) -> ProviderResult<State> {
    let Some(identifier) = state.identifier.as_deref() else {
        return Ok(state);
    };

    let id = PricingId::parse_insensitively(identifier).map_err(|e| {
        ProviderError::new(format!("upgrading state for {}: {}", identifier, e))
            .for_resource(state.id.clone())
    })?;

    let id = if id.pricing_name.eq_ignore_ascii_case(LEGACY_PRICING_NAME) {
        PricingId::new(id.subscription_id, DEFAULT_PRICING_RESOURCE_TYPE)
    } else {
        id
    };

    log::debug!("upgraded {} to schema version 1", id);
    state.attributes.insert(
        "resource_type".to_string(),
        Value::String(id.pricing_name.clone()),
    );
    state.identifier = Some(id.id());
    Ok(state)
}

#[async_trait]
impl AzureResource for SubscriptionPricingResource {
    async fn create(
        &self,
        ctx: &ResourceContext<'_>,
        resource: &Resource,
    ) -> ProviderResult<String> {
        let id = Self::pricing_id(ctx, resource);

        let existing = ctx
            .pricings()
            .get(&id)
            .await
            .map_err(|e| api_error(format!("checking for presence of existing {}", id), e))?;

        if let Some(tier) = existing.as_ref().and_then(|p| p.tier())
            && tier != PricingTier::Free
        {
            return Err(ProviderError::new(format!(
                "the pricing tier of this subscription is not Free: a resource with the ID {:?} already exists - to be managed it needs to be imported into the state (see the documentation for {:?})",
                id.id(),
                format!("azurerm.{}", RESOURCE_TYPE)
            )));
        }

        log::info!("Setting {}", id);
        Self::set_pricing(ctx, &id, resource).await?;
        Ok(id.id())
    }

    async fn read(
        &self,
        ctx: &ResourceContext<'_>,
        resource_id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let id = PricingId::parse(identifier).map_err(|e| ProviderError::new(e.to_string()))?;

        let pricing = match ctx.pricings().get(&id).await {
            Ok(Some(pricing)) => pricing,
            Ok(None) => {
                log::debug!("{} was not found - removing from state!", id);
                return Ok(State::not_found(resource_id.clone()));
            }
            Err(e) => return Err(api_error(format!("retrieving {}", id), e)),
        };

        let mut attributes = HashMap::new();
        attributes.insert(
            "resource_type".to_string(),
            Value::String(id.pricing_name.clone()),
        );
        if let Some(properties) = pricing.properties {
            attributes.insert(
                "tier".to_string(),
                Value::String(properties.pricing_tier.to_string()),
            );
            if let Some(sub_plan) = properties.sub_plan {
                attributes.insert("subplan".to_string(), Value::String(sub_plan));
            }
        }

        Ok(State::existing(resource_id.clone(), attributes).with_identifier(id.id()))
    }

    async fn update(
        &self,
        ctx: &ResourceContext<'_>,
        _identifier: &str,
        resource: &Resource,
    ) -> ProviderResult<String> {
        let id = Self::pricing_id(ctx, resource);
        log::info!("Updating {}", id);
        Self::set_pricing(ctx, &id, resource).await?;
        Ok(id.id())
    }

    async fn delete(&self, ctx: &ResourceContext<'_>, identifier: &str) -> ProviderResult<()> {
        let id = PricingId::parse(identifier)
            .map_err(|e| ProviderError::new(format!("parsing {}: {}", identifier, e)))?;

        ctx.pricings()
            .update(&id, &Pricing::with_tier(PricingTier::Free, None))
            .await
            .map_err(|e| api_error(format!("setting {}", id), e))?;

        log::debug!("Security Center Subscription deletion invocation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockTransport;
    use crate::client::{ArmClient, ArmResponse, Method};
    use serde_json::json;

    const SUB: &str = "00000000-0000-0000-0000-000000000000";

    fn id(name: &str) -> PricingId {
        PricingId::new(SUB, name)
    }

    fn desired(tier: &str, resource_type: &str) -> Resource {
        Resource::new(RESOURCE_TYPE, "defender")
            .with_attribute("tier", Value::String(tier.to_string()))
            .with_attribute("resource_type", Value::String(resource_type.to_string()))
    }

    fn pricing_body(tier: &str) -> serde_json::Value {
        json!({ "properties": { "pricingTier": tier } })
    }

    #[tokio::test]
    async fn create_on_free_plan_sets_tier() {
        let transport = MockTransport::new();
        let path = id("KeyVaults").id();
        transport.respond(Method::Get, &path, ArmResponse::new(200).with_body(pricing_body("Free")));
        transport.respond(Method::Put, &path, ArmResponse::new(200));

        let arm = ArmClient::new(transport.clone());
        let ctx = ResourceContext {
            client: &arm,
            subscription_id: SUB,
        };
        let resource = desired("Standard", "KeyVaults")
            .with_attribute("subplan", Value::String("P1".to_string()));
        let identifier = SubscriptionPricingResource
            .create(&ctx, &resource)
            .await
            .unwrap();

        assert_eq!(identifier, path);
        let puts = transport.requests_to(Method::Put, &path);
        assert_eq!(
            puts[0].body,
            Some(json!({ "properties": { "pricingTier": "Standard", "subPlan": "P1" } }))
        );
    }

    #[tokio::test]
    async fn create_when_pricing_missing_is_allowed() {
        let transport = MockTransport::new();
        let path = id("Dns").id();
        transport.respond(Method::Put, &path, ArmResponse::new(200));

        let arm = ArmClient::new(transport.clone());
        let ctx = ResourceContext {
            client: &arm,
            subscription_id: SUB,
        };
        SubscriptionPricingResource
            .create(&ctx, &desired("Standard", "Dns"))
            .await
            .unwrap();
        assert_eq!(transport.requests_to(Method::Put, &path).len(), 1);
    }

    #[tokio::test]
    async fn create_refuses_to_take_over_standard_plan() {
        let transport = MockTransport::new();
        let path = id("VirtualMachines").id();
        transport.respond(
            Method::Get,
            &path,
            ArmResponse::new(200).with_body(pricing_body("Standard")),
        );

        let arm = ArmClient::new(transport.clone());
        let ctx = ResourceContext {
            client: &arm,
            subscription_id: SUB,
        };
        let err = SubscriptionPricingResource
            .create(&ctx, &desired("Standard", "VirtualMachines"))
            .await
            .unwrap_err();

        assert!(err.message.contains("needs to be imported"));
        assert!(err.message.contains(&path));
        assert!(transport.requests_to(Method::Put, &path).is_empty());
    }

    #[tokio::test]
    async fn create_surfaces_lookup_failure() {
        let transport = MockTransport::new();
        let path = id("Arm").id();
        transport.respond(
            Method::Get,
            &path,
            ArmResponse::new(403).with_body(json!({
                "error": {"code": "AuthorizationFailed", "message": "denied"}
            })),
        );

        let arm = ArmClient::new(transport.clone());
        let ctx = ResourceContext {
            client: &arm,
            subscription_id: SUB,
        };
        let err = SubscriptionPricingResource
            .create(&ctx, &desired("Free", "Arm"))
            .await
            .unwrap_err();
        assert!(
            err.message
                .starts_with("checking for presence of existing Pricing (Subscription:")
        );
    }

    #[tokio::test]
    async fn update_skips_existence_check() {
        let transport = MockTransport::new();
        let path = id("VirtualMachines").id();
        transport.respond(Method::Put, &path, ArmResponse::new(200));

        let arm = ArmClient::new(transport.clone());
        let ctx = ResourceContext {
            client: &arm,
            subscription_id: SUB,
        };
        SubscriptionPricingResource
            .update(&ctx, &path, &desired("Free", "VirtualMachines"))
            .await
            .unwrap();
        assert!(transport.requests_to(Method::Get, &path).is_empty());
        assert_eq!(transport.requests_to(Method::Put, &path).len(), 1);
    }

    #[tokio::test]
    async fn read_maps_properties() {
        let transport = MockTransport::new();
        let path = id("StorageAccounts").id();
        transport.respond(
            Method::Get,
            &path,
            ArmResponse::new(200).with_body(json!({
                "properties": { "pricingTier": "Standard", "subPlan": "PerStorageAccount" }
            })),
        );

        let arm = ArmClient::new(transport);
        let ctx = ResourceContext {
            client: &arm,
            subscription_id: SUB,
        };
        let state = SubscriptionPricingResource
            .read(&ctx, &ResourceId::new(RESOURCE_TYPE, "defender"), &path)
            .await
            .unwrap();

        assert!(state.exists);
        let get = |k: &str| state.attributes.get(k).cloned();
        assert_eq!(get("resource_type"), Some(Value::String("StorageAccounts".to_string())));
        assert_eq!(get("tier"), Some(Value::String("Standard".to_string())));
        assert_eq!(get("subplan"), Some(Value::String("PerStorageAccount".to_string())));
    }

    #[tokio::test]
    async fn read_without_subplan_leaves_it_unset() {
        let transport = MockTransport::new();
        let path = id("Dns").id();
        transport.respond(Method::Get, &path, ArmResponse::new(200).with_body(pricing_body("Free")));

        let arm = ArmClient::new(transport);
        let ctx = ResourceContext {
            client: &arm,
            subscription_id: SUB,
        };
        let state = SubscriptionPricingResource
            .read(&ctx, &ResourceId::new(RESOURCE_TYPE, "defender"), &path)
            .await
            .unwrap();
        assert!(!state.attributes.contains_key("subplan"));
    }

    #[tokio::test]
    async fn read_with_empty_body_keeps_pricing() {
        let transport = MockTransport::new();
        let path = id("Dns").id();
        transport.respond(Method::Get, &path, ArmResponse::new(200));

        let arm = ArmClient::new(transport);
        let ctx = ResourceContext {
            client: &arm,
            subscription_id: SUB,
        };
        let state = SubscriptionPricingResource
            .read(&ctx, &ResourceId::new(RESOURCE_TYPE, "defender"), &path)
            .await
            .unwrap();
        assert!(state.exists);
        assert_eq!(
            state.attributes.get("resource_type"),
            Some(&Value::String("Dns".to_string()))
        );
        assert!(!state.attributes.contains_key("tier"));
    }

    #[tokio::test]
    async fn read_missing_pricing_is_gone() {
        let transport = MockTransport::new();
        let arm = ArmClient::new(transport);
        let ctx = ResourceContext {
            client: &arm,
            subscription_id: SUB,
        };
        let state = SubscriptionPricingResource
            .read(&ctx, &ResourceId::new(RESOURCE_TYPE, "defender"), &id("Dns").id())
            .await
            .unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn delete_resets_to_free() {
        let transport = MockTransport::new();
        let path = id("Containers").id();
        transport.respond(Method::Put, &path, ArmResponse::new(200));

        let arm = ArmClient::new(transport.clone());
        let ctx = ResourceContext {
            client: &arm,
            subscription_id: SUB,
        };
        SubscriptionPricingResource.delete(&ctx, &path).await.unwrap();

        let puts = transport.requests_to(Method::Put, &path);
        assert_eq!(puts[0].body, Some(pricing_body("Free")));
    }

    #[tokio::test]
    async fn delete_rejects_malformed_identifier() {
        let transport = MockTransport::new();
        let arm = ArmClient::new(transport);
        let ctx = ResourceContext {
            client: &arm,
            subscription_id: SUB,
        };
        let err = SubscriptionPricingResource
            .delete(&ctx, "/subscriptions/x")
            .await
            .unwrap_err();
        assert!(err.message.starts_with("parsing /subscriptions/x:"));
    }

    #[test]
    fn upgrade_rewrites_default_pricing() {
        let legacy = format!("/subscriptions/{}/providers/Microsoft.Security/pricings/default", SUB);
        let mut attributes = HashMap::new();
        attributes.insert("tier".to_string(), Value::String("Standard".to_string()));
        let state = State::existing(ResourceId::new(RESOURCE_TYPE, "defender"), attributes)
            .with_identifier(legacy);

        let upgraded = SubscriptionPricingResource.upgrade_state(0, state).unwrap();
        assert_eq!(upgraded.identifier, Some(id("VirtualMachines").id()));
        assert_eq!(
            upgraded.attributes.get("resource_type"),
            Some(&Value::String("VirtualMachines".to_string()))
        );
        assert_eq!(
            upgraded.attributes.get("tier"),
            Some(&Value::String("Standard".to_string()))
        );
    }

    #[test]
    fn upgrade_keeps_named_pricing() {
        let state = State::existing(ResourceId::new(RESOURCE_TYPE, "defender"), HashMap::new())
            .with_identifier(id("Dns").id());
        let upgraded = SubscriptionPricingResource.upgrade_state(0, state).unwrap();
        assert_eq!(upgraded.identifier, Some(id("Dns").id()));
        assert_eq!(
            upgraded.attributes.get("resource_type"),
            Some(&Value::String("Dns".to_string()))
        );
    }

    #[test]
    fn upgrade_rejects_foreign_identifier() {
        let state = State::existing(ResourceId::new(RESOURCE_TYPE, "defender"), HashMap::new())
            .with_identifier("/subscriptions/x/resourceGroups/rg");
        assert!(SubscriptionPricingResource.upgrade_state(0, state).is_err());
    }

    #[test]
    fn import_id_validation() {
        assert!(
            SubscriptionPricingResource
                .validate_import_id(&id("Dns").id())
                .is_ok()
        );
        assert!(
            SubscriptionPricingResource
                .validate_import_id("/subscriptions/x")
                .is_err()
        );
    }
}

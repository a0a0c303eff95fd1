//! Resource handlers
//!
//! Each handler maps one resource type's lifecycle onto Resource Manager
//! calls. The provider resolves a handler by resource type, prepares the
//! desired attributes against the handler's schema and applies timeouts;
//! handlers only translate between attributes and API calls.

pub mod subscription_pricing;
pub mod web_app_extension;

use async_trait::async_trait;
use carina_core::provider::{ProviderError, ProviderResult, ResourceType};
use carina_core::resource::{Resource, ResourceId, State};

use crate::client::{ArmClient, ArmError, PricingsClient, WebAppsClient};

pub use subscription_pricing::SubscriptionPricingResource;
pub use web_app_extension::WebAppExtensionResource;

/// What a handler gets to talk to Azure with
pub struct ResourceContext<'a> {
    pub client: &'a ArmClient,
    pub subscription_id: &'a str,
}

impl ResourceContext<'_> {
    pub fn web_apps(&self) -> WebAppsClient {
        WebAppsClient::new(self.client.clone())
    }

    pub fn pricings(&self) -> PricingsClient {
        PricingsClient::new(self.client.clone())
    }
}

/// Lifecycle of one Azure resource type
///
/// `create` and `update` return the ARM ID of the resource; the provider
/// reads it back afterwards.
#[async_trait]
pub trait AzureResource: ResourceType {
    async fn create(&self, ctx: &ResourceContext<'_>, resource: &Resource)
    -> ProviderResult<String>;

    async fn read(
        &self,
        ctx: &ResourceContext<'_>,
        id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State>;

    async fn update(
        &self,
        ctx: &ResourceContext<'_>,
        identifier: &str,
        resource: &Resource,
    ) -> ProviderResult<String>;

    async fn delete(&self, ctx: &ResourceContext<'_>, identifier: &str) -> ProviderResult<()>;
}

/// Find the handler for a DSL resource type
pub fn handler(resource_type: &str) -> Option<&'static dyn AzureResource> {
    match resource_type {
        web_app_extension::RESOURCE_TYPE => Some(&WebAppExtensionResource),
        subscription_pricing::RESOURCE_TYPE => Some(&SubscriptionPricingResource),
        _ => None,
    }
}

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(WebAppExtensionResource),
        Box::new(SubscriptionPricingResource),
    ]
}

/// Read a required string attribute
pub(crate) fn required_str(resource: &Resource, key: &str) -> ProviderResult<String> {
    resource.get_str(key).map(|s| s.to_string()).ok_or_else(|| {
        ProviderError::new(format!("attribute '{}' must be set to a string", key))
            .for_resource(resource.id.clone())
    })
}

/// Wrap an API error with the operation that failed
pub(crate) fn api_error(message: String, err: ArmError) -> ProviderError {
    ProviderError::new(format!("{}: {}", message, err)).with_cause(err)
}

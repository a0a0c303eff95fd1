//! Carina Azure Resource Manager Provider
//!
//! Manages Azure resources through the Resource Manager REST API.
//!
//! ## Module Structure
//!
//! - `config` - Subscription, endpoint and credential settings
//! - `client` - ARM REST client, long-running operation polling and typed service clients
//! - `ids` - Parsing and formatting of ARM resource IDs
//! - `schemas` - Attribute schemas for each resource type
//! - `resources` - Lifecycle handlers for each resource type
//! - `provider` - AzurermProvider implementation

pub mod client;
pub mod config;
pub mod ids;
pub mod provider;
pub mod resources;
pub mod schemas;

// Re-export main types
pub use config::{ConfigError, Credential, ProviderConfig};
pub use ids::{PricingId, WebAppExtensionId};
pub use provider::AzurermProvider;

use carina_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use carina_core::resource::{Resource, ResourceId, State};

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for AzurermProvider {
    fn name(&self) -> &'static str {
        "azurerm"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let to = to.clone();
        Box::pin(async move { self.update_resource(id, &identifier, to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}

//! Azure Resource Manager provider implementation
//!
//! This module owns the ARM client and routes each lifecycle call to the
//! handler registered for the resource type.

use std::sync::Arc;

use carina_core::provider::{ProviderError, ProviderResult};
use carina_core::resource::{Resource, ResourceId, State};
use carina_core::timeouts::{Operation, with_timeout};

use crate::client::http::HttpTransport;
use crate::client::{ArmClient, ArmTransport};
use crate::config::ProviderConfig;
use crate::resources::{self, AzureResource, ResourceContext};

/// Azure Resource Manager Provider
pub struct AzurermProvider {
    client: ArmClient,
    subscription_id: String,
}

impl AzurermProvider {
    /// Create a provider talking to Resource Manager over HTTPS
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let transport = HttpTransport::new(&config).map_err(|e| {
            ProviderError::new(format!("building Resource Manager client: {}", e)).with_cause(e)
        })?;
        let client = ArmClient::new(Arc::new(transport))
            .with_polling(config.poll_interval, config.poll_attempts);
        Ok(Self::with_client(config.subscription_id, client))
    }

    pub fn with_transport(
        subscription_id: impl Into<String>,
        transport: Arc<dyn ArmTransport>,
    ) -> Self {
        Self::with_client(subscription_id, ArmClient::new(transport))
    }

    pub fn with_client(subscription_id: impl Into<String>, client: ArmClient) -> Self {
        Self {
            client,
            subscription_id: subscription_id.into(),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    fn context(&self) -> ResourceContext<'_> {
        ResourceContext {
            client: &self.client,
            subscription_id: &self.subscription_id,
        }
    }

    fn handler(&self, id: &ResourceId) -> ProviderResult<&'static dyn AzureResource> {
        resources::handler(&id.resource_type).ok_or_else(|| {
            ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
                .for_resource(id.clone())
        })
    }

    /// Fill in defaults, check the attributes against the schema and strip
    /// enum namespaces so handlers see plain API values
    fn prepare(handler: &dyn AzureResource, resource: &Resource) -> ProviderResult<Resource> {
        let schema = handler.schema();
        let mut attributes = resource.attributes.clone();
        schema.apply_defaults(&mut attributes);

        if let Err(errors) = schema.validate(&attributes) {
            let message = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ProviderError::new(message).for_resource(resource.id.clone()));
        }

        let mut prepared = resource.clone();
        prepared.attributes = schema.normalize(&attributes);
        Ok(prepared)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read a resource by its ARM ID
    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let handler = self.handler(id)?;

        let identifier = match identifier {
            Some(identifier) => identifier,
            None => return Ok(State::not_found(id.clone())),
        };

        let ctx = self.context();
        with_timeout(
            Operation::Read,
            handler.timeouts().read,
            handler.read(&ctx, id, identifier),
        )
        .await
        .map_err(|e| e.for_resource(id.clone()))
    }

    /// Create a resource and read it back
    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        let handler = self.handler(&resource.id)?;
        let resource = Self::prepare(handler, &resource)?;
        let ctx = self.context();

        with_timeout(Operation::Create, handler.timeouts().create, async {
            let identifier = handler.create(&ctx, &resource).await?;
            log::debug!("created {} as {}", resource.id, identifier);
            handler.read(&ctx, &resource.id, &identifier).await
        })
        .await
        .map_err(|e| e.for_resource(resource.id.clone()))
    }

    /// Update a resource in place and read it back
    pub async fn update_resource(
        &self,
        id: ResourceId,
        identifier: &str,
        to: Resource,
    ) -> ProviderResult<State> {
        let handler = self.handler(&id)?;
        let to = Self::prepare(handler, &to)?;
        let ctx = self.context();

        with_timeout(Operation::Update, handler.timeouts().update, async {
            let identifier = handler.update(&ctx, identifier, &to).await?;
            handler.read(&ctx, &id, &identifier).await
        })
        .await
        .map_err(|e| e.for_resource(id.clone()))
    }

    /// Delete a resource
    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        let handler = self.handler(id)?;
        let ctx = self.context();

        with_timeout(
            Operation::Delete,
            handler.timeouts().delete,
            handler.delete(&ctx, identifier),
        )
        .await
        .map_err(|e| e.for_resource(id.clone()))
    }
}

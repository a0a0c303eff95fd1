//! azurerm.web_app_extension - site extensions on App Service web apps

use std::collections::HashMap;

use async_trait::async_trait;
use carina_core::provider::{ProviderError, ProviderResult, ResourceType};
use carina_core::resource::{Resource, ResourceId, State, Value};
use carina_core::schema::ResourceSchema;
use carina_core::timeouts::ResourceTimeouts;

use super::{AzureResource, ResourceContext, api_error, required_str};
use crate::ids::WebAppExtensionId;
use crate::schemas::appservice::web_app_extension_schema;

pub const RESOURCE_TYPE: &str = "web_app_extension";

pub struct WebAppExtensionResource;

impl WebAppExtensionResource {
    fn parse_id(identifier: &str) -> ProviderResult<WebAppExtensionId> {
        WebAppExtensionId::parse(identifier).map_err(|e| ProviderError::new(e.to_string()))
    }

    /// PUT the extension and wait for the install to finish
    async fn install(
        ctx: &ResourceContext<'_>,
        id: &WebAppExtensionId,
        (verb, noun): (&str, &str),
    ) -> ProviderResult<()> {
        let response = ctx
            .web_apps()
            .install_site_extension(id)
            .await
            .map_err(|e| api_error(format!("{} Extension {}", verb, id), e))?;

        ctx.client
            .wait_for_completion(&response)
            .await
            .map_err(|e| api_error(format!("waiting for {} of Extension {}", noun, id), e))
    }
}

impl ResourceType for WebAppExtensionResource {
    fn name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        web_app_extension_schema()
    }

    fn timeouts(&self) -> ResourceTimeouts {
        ResourceTimeouts::write_minutes(30)
    }

    fn validate_import_id(&self, identifier: &str) -> Result<(), String> {
        WebAppExtensionId::validate(identifier)
    }
}

#[async_trait]
impl AzureResource for WebAppExtensionResource {
    async fn create(
        &self,
        ctx: &ResourceContext<'_>,
        resource: &Resource,
    ) -> ProviderResult<String> {
        let id = WebAppExtensionId::new(
            ctx.subscription_id,
            required_str(resource, "resource_group_name")?,
            required_str(resource, "web_app_name")?,
            required_str(resource, "site_extension_name")?,
        );

        log::info!("Installing {}", id);
        Self::install(ctx, &id, ("creating", "creation")).await?;

        Ok(id.id())
    }

    async fn read(
        &self,
        ctx: &ResourceContext<'_>,
        resource_id: &ResourceId,
        identifier: &str,
    ) -> ProviderResult<State> {
        let id = Self::parse_id(identifier)?;

        let info = match ctx.web_apps().get_site_extension(&id).await {
            Ok(Some(info)) => info,
            Ok(None) => {
                log::debug!("{} was not found - removing from state", id);
                return Ok(State::not_found(resource_id.clone()));
            }
            Err(e) => return Err(api_error(format!("reading Extension {}", id), e)),
        };

        let version = info
            .properties
            .and_then(|p| p.version)
            .unwrap_or_default();

        let mut attributes = HashMap::new();
        attributes.insert("web_app_name".to_string(), Value::String(id.site_name.clone()));
        attributes.insert(
            "resource_group_name".to_string(),
            Value::String(id.resource_group.clone()),
        );
        attributes.insert(
            "site_extension_name".to_string(),
            Value::String(id.site_extension_name.clone()),
        );
        attributes.insert("api_version".to_string(), Value::String(version));

        Ok(State::existing(resource_id.clone(), attributes).with_identifier(id.id()))
    }

    async fn update(
        &self,
        ctx: &ResourceContext<'_>,
        identifier: &str,
        _resource: &Resource,
    ) -> ProviderResult<String> {
        // Only api_version is updatable; re-installing picks up the new package
        let id = Self::parse_id(identifier)?;
        log::info!("Re-installing {}", id);
        Self::install(ctx, &id, ("updating", "update")).await?;
        Ok(id.id())
    }

    async fn delete(&self, ctx: &ResourceContext<'_>, identifier: &str) -> ProviderResult<()> {
        let id = Self::parse_id(identifier)?;
        log::info!("Removing {}", id);
        ctx.web_apps()
            .delete_site_extension(&id)
            .await
            .map_err(|e| api_error(format!("deleting Extension {}", id), e))
    }
}

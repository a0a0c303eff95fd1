//! App Service schema definitions

use carina_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::types;

/// Returns the schema for web app site extensions
pub fn web_app_extension_schema() -> ResourceSchema {
    ResourceSchema::new("azurerm.web_app_extension")
        .with_description("A site extension installed on an App Service web app")
        .attribute(
            AttributeSchema::new("web_app_name", types::web_app_name())
                .required()
                .force_new()
                .with_description("Name of the web app the extension is installed on"),
        )
        .attribute(
            AttributeSchema::new("resource_group_name", types::resource_group_name())
                .required()
                .force_new()
                .with_description("Resource group containing the web app"),
        )
        .attribute(
            AttributeSchema::new("site_extension_name", AttributeType::String)
                .required()
                .force_new()
                .with_description("Site extension package to install"),
        )
        .attribute(
            AttributeSchema::new("api_version", AttributeType::String)
                .required()
                .with_description(
                    "Installed version of the extension, as reported by App Service. \
                     Installing always fetches the latest package, so a value that differs \
                     from what the service reports triggers a reinstall on every apply",
                ),
        )
}

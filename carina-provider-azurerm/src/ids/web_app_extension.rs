//! ID of a site extension installed on an App Service web app

use std::fmt;

use super::{IdError, ParsedResourceId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebAppExtensionId {
    pub subscription_id: String,
    pub resource_group: String,
    pub site_name: String,
    pub site_extension_name: String,
}

impl WebAppExtensionId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        site_name: impl Into<String>,
        site_extension_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            site_name: site_name.into(),
            site_extension_name: site_extension_name.into(),
        }
    }

    /// ARM path of the extension
    pub fn id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/sites/{}/siteextensions/{}",
            self.subscription_id, self.resource_group, self.site_name, self.site_extension_name
        )
    }

    pub fn parse(input: &str) -> Result<Self, IdError> {
        let mut id = ParsedResourceId::parse(input)
            .map_err(|e| IdError::invalid("WebAppExtension", input, e))?;

        if id.subscription_id.is_empty() {
            return Err(IdError::MissingSegment("subscriptions".to_string()));
        }
        if id.resource_group.is_empty() {
            return Err(IdError::MissingSegment("resourceGroups".to_string()));
        }

        let site_name = id.pop_segment("sites")?;
        let site_extension_name = id.pop_segment("siteextensions")?;
        id.validate_no_empty_segments(input)?;

        Ok(Self {
            subscription_id: id.subscription_id,
            resource_group: id.resource_group,
            site_name,
            site_extension_name,
        })
    }

    /// Import-ID check
    pub fn validate(input: &str) -> Result<(), String> {
        Self::parse(input).map(|_| ()).map_err(|e| e.to_string())
    }
}

impl fmt::Display for WebAppExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Web App Extension: (Siteextension Name {:?} / Site Name {:?} / Resource Group {:?})",
            self.site_extension_name, self.site_name, self.resource_group
        )
    }
}

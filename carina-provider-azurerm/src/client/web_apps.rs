//! App Service site extension operations (Microsoft.Web, 2021-02-01)

use serde::{Deserialize, Serialize};

use super::{ArmClient, ArmResponse, ArmResult};
use crate::ids::WebAppExtensionId;

pub const API_VERSION: &str = "2021-02-01";

/// Site extension as reported by App Service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteExtensionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SiteExtensionInfoProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteExtensionInfoProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_date_time: Option<String>,
}

/// Typed client for site extensions
#[derive(Clone)]
pub struct WebAppsClient {
    arm: ArmClient,
}

impl WebAppsClient {
    pub fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    /// Start installing an extension; the returned response tracks the
    /// long-running operation (see `ArmClient::wait_for_completion`)
    pub async fn install_site_extension(&self, id: &WebAppExtensionId) -> ArmResult<ArmResponse> {
        self.arm.put(&id.id(), API_VERSION, None).await
    }

    /// `None` when the extension is not installed
    pub async fn get_site_extension(
        &self,
        id: &WebAppExtensionId,
    ) -> ArmResult<Option<SiteExtensionInfo>> {
        match self.arm.get(&id.id(), API_VERSION).await {
            Ok(response) => {
                let info = match response.body {
                    Some(body) => serde_json::from_value(body)?,
                    None => SiteExtensionInfo::default(),
                };
                Ok(Some(info))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove an extension; an extension that is already gone is not an error
    pub async fn delete_site_extension(&self, id: &WebAppExtensionId) -> ArmResult<()> {
        match self.arm.delete(&id.id(), API_VERSION).await {
            Ok(response) => self.arm.wait_for_completion(&response).await,
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }
}

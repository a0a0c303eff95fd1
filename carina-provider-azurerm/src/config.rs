//! Provider configuration
//!
//! Settings are read from the same `ARM_*` environment variables the Azure
//! tooling uses, or assembled explicitly with the builder methods.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error(
        "no credentials configured: set ARM_ACCESS_TOKEN or ARM_TENANT_ID, ARM_CLIENT_ID and ARM_CLIENT_SECRET"
    )]
    NoCredentials,
}

/// How the provider authenticates against Resource Manager
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Pre-issued bearer token
    AccessToken(String),
    /// Service principal client-credentials flow
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
        authority_host: String,
    },
}

// Secrets stay out of debug output
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Credential::ClientSecret {
                tenant_id,
                client_id,
                authority_host,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("authority_host", authority_host)
                .finish_non_exhaustive(),
        }
    }
}

/// Azure Resource Manager provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub subscription_id: String,
    pub endpoint: String,
    pub credential: Credential,
    /// Delay between long-running operation polls when the service gives no Retry-After
    pub poll_interval: Duration,
    /// Maximum number of polls before giving up on a long-running operation
    pub poll_attempts: u32,
}

impl ProviderConfig {
    pub fn new(subscription_id: impl Into<String>, credential: Credential) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credential,
            poll_interval: Duration::from_secs(5),
            poll_attempts: 720,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.poll_interval = interval;
        self.poll_attempts = attempts;
        self
    }

    /// Load configuration from `ARM_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let subscription_id =
            get("ARM_SUBSCRIPTION_ID").ok_or(ConfigError::Missing("ARM_SUBSCRIPTION_ID"))?;

        let credential = if let Some(token) = get("ARM_ACCESS_TOKEN") {
            Credential::AccessToken(token)
        } else {
            match (
                get("ARM_TENANT_ID"),
                get("ARM_CLIENT_ID"),
                get("ARM_CLIENT_SECRET"),
            ) {
                (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                    Credential::ClientSecret {
                        tenant_id,
                        client_id,
                        client_secret,
                        authority_host: get("ARM_AUTHORITY_HOST")
                            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string()),
                    }
                }
                (None, None, None) => return Err(ConfigError::NoCredentials),
                (None, _, _) => return Err(ConfigError::Missing("ARM_TENANT_ID")),
                (_, None, _) => return Err(ConfigError::Missing("ARM_CLIENT_ID")),
                (_, _, None) => return Err(ConfigError::Missing("ARM_CLIENT_SECRET")),
            }
        };

        let mut config = Self::new(subscription_id, credential);
        if let Some(endpoint) = get("ARM_RESOURCE_MANAGER_ENDPOINT") {
            config = config.with_endpoint(endpoint);
        }
        Ok(config)
    }
}

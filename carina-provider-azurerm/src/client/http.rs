//! reqwest-backed transport and bearer-token acquisition

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_LENGTH;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::{ArmError, ArmRequest, ArmResponse, ArmResult, ArmTransport, Method};
use crate::config::{Credential, ProviderConfig};

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Tokens are refreshed this long before they expire
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Supplies bearer tokens for Resource Manager
pub struct TokenCredential {
    credential: Credential,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCredential {
    pub fn new(credential: Credential, endpoint: &str) -> Self {
        Self {
            credential,
            scope: format!("{}/.default", endpoint.trim_end_matches('/')),
            cached: Mutex::new(None),
        }
    }

    pub async fn token(&self, http: &reqwest::Client) -> ArmResult<String> {
        let (tenant_id, client_id, client_secret, authority_host) = match &self.credential {
            Credential::AccessToken(token) => return Ok(token.clone()),
            Credential::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
                authority_host,
            } => (tenant_id, client_id, client_secret, authority_host),
        };

        let mut cached = self.cached.lock().await;
        if let Some(c) = cached.as_ref()
            && c.expires_at > Instant::now() + REFRESH_MARGIN
        {
            return Ok(c.token.clone());
        }

        let mut url = Url::parse(authority_host)
            .map_err(|e| ArmError::Auth(format!("invalid authority {:?}: {}", authority_host, e)))?;
        url.path_segments_mut()
            .map_err(|_| ArmError::Auth(format!("authority {} cannot carry a path", authority_host)))?
            .pop_if_empty()
            .extend([tenant_id.as_str(), "oauth2", "v2.0", "token"]);
        log::debug!("requesting access token for client {}", client_id);

        let response = http
            .post(url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ArmError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArmError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ArmError::Auth(format!("invalid token response: {}", e)))?;

        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(access_token)
    }
}

/// Transport that talks to a real Resource Manager endpoint
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
    credential: TokenCredential,
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> ArmResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ArmError::Transport(e.to_string()))?;

        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            ArmError::Transport(format!("invalid endpoint {:?}: {}", config.endpoint, e))
        })?;

        Ok(Self {
            http,
            endpoint,
            credential: TokenCredential::new(config.credential.clone(), &config.endpoint),
        })
    }

    /// Absolute URL for a request
    ///
    /// ARM paths are appended to the endpoint segment by segment, so names
    /// holding `?`, `#` or spaces are percent-encoded instead of changing
    /// the URL structure.
    fn request_url(&self, request: &ArmRequest) -> ArmResult<Url> {
        let mut url = if request.url.starts_with('/') {
            let mut url = self.endpoint.clone();
            url.path_segments_mut()
                .map_err(|_| {
                    ArmError::Transport(format!("endpoint {} cannot carry a path", self.endpoint))
                })?
                .pop_if_empty()
                .extend(request.url.split('/').filter(|s| !s.is_empty()));
            url
        } else {
            Url::parse(&request.url).map_err(|e| {
                ArmError::Transport(format!("invalid URL {:?}: {}", request.url, e))
            })?
        };

        if let Some(api_version) = &request.api_version {
            url.query_pairs_mut().append_pair("api-version", api_version);
        }
        Ok(url)
    }
}

#[async_trait]
impl ArmTransport for HttpTransport {
    async fn send(&self, request: ArmRequest) -> ArmResult<ArmResponse> {
        let token = self.credential.token(&self.http).await?;
        let url = self.request_url(&request)?;

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http.request(method, url.clone()).bearer_auth(token);
        builder = match &request.body {
            Some(body) => builder.json(body),
            None if request.method == Method::Put => builder.header(CONTENT_LENGTH, "0"),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ArmError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let text = response
            .text()
            .await
            .map_err(|e| ArmError::Transport(e.to_string()))?;
        let body = if text.trim().is_empty() {
            None
        } else {
            Some(
                serde_json::from_str(&text)
                    .unwrap_or_else(|_| serde_json::Value::String(text.clone())),
            )
        };

        log::debug!("ARM response: {} {} -> {}", request.method, url, status);

        Ok(ArmResponse {
            status,
            headers,
            body,
        })
    }
}

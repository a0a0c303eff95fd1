//! Azure Resource Manager REST client
//!
//! `ArmClient` speaks the generic ARM conventions (api-version query,
//! error envelope, long-running operations). The typed service clients in
//! `web_apps` and `pricings` build on top of it. HTTP itself sits behind
//! the `ArmTransport` trait so handlers can be exercised without a network.

pub mod http;
pub mod pricings;
pub mod web_apps;

#[cfg(test)]
pub(crate) mod mock;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

pub use pricings::PricingsClient;
pub use web_apps::WebAppsClient;

/// Errors returned by Resource Manager calls
#[derive(Debug, Error)]
pub enum ArmError {
    /// The service answered with a non-success status
    #[error("unexpected status {status} with error: {code}: {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A long-running operation reached a terminal state other than Succeeded
    #[error("long-running operation finished with status {status}: {message}")]
    OperationFailed { status: String, message: String },

    #[error("long-running operation still in progress after {0} polls")]
    PollingExhausted(u32),
}

impl ArmError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArmError::Status { status: 404, .. })
    }

    /// Build an error from a non-success response, reading the ARM error envelope
    pub fn from_response(response: &ArmResponse) -> Self {
        let envelope = response
            .body
            .as_ref()
            .map(|body| body.get("error").unwrap_or(body));

        let field = |name: &str| {
            envelope
                .and_then(|e| e.get(name))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        let message = field("message")
            .or_else(|| {
                response
                    .body
                    .as_ref()
                    .and_then(|b| b.as_str())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| "no error details returned".to_string());

        ArmError::Status {
            status: response.status,
            code: field("code").unwrap_or_else(|| "Unknown".to_string()),
            message,
        }
    }
}

pub type ArmResult<T> = Result<T, ArmError>;

/// HTTP verbs used against Resource Manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// A request for an ARM path (relative to the endpoint, unencoded) or an
/// absolute polling URL handed out by the service
#[derive(Debug, Clone, PartialEq)]
pub struct ArmRequest {
    pub method: Method,
    pub url: String,
    /// Added as the `api-version` query parameter by the transport
    pub api_version: Option<String>,
    pub body: Option<JsonValue>,
}

/// Raw response; header names are lowercase
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArmResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Option<JsonValue>,
}

impl ArmResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Retry-After in seconds, when the service sent one
    fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

/// Sends requests to Resource Manager
#[async_trait]
pub trait ArmTransport: Send + Sync {
    /// Send a request. Only transport-level failures are errors; any HTTP
    /// status is returned as a response.
    async fn send(&self, request: ArmRequest) -> ArmResult<ArmResponse>;
}

/// Generic Resource Manager client shared by the typed service clients
#[derive(Clone)]
pub struct ArmClient {
    transport: Arc<dyn ArmTransport>,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl ArmClient {
    pub fn new(transport: Arc<dyn ArmTransport>) -> Self {
        Self {
            transport,
            poll_interval: Duration::from_secs(5),
            poll_attempts: 720,
        }
    }

    pub fn with_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.poll_interval = interval;
        self.poll_attempts = attempts;
        self
    }

    async fn send(&self, request: ArmRequest) -> ArmResult<ArmResponse> {
        log::debug!("ARM request: {} {}", request.method, request.url);
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ArmError::from_response(&response))
        }
    }

    pub async fn get(&self, path: &str, api_version: &str) -> ArmResult<ArmResponse> {
        self.send(ArmRequest {
            method: Method::Get,
            url: path.to_string(),
            api_version: Some(api_version.to_string()),
            body: None,
        })
        .await
    }

    pub async fn put(
        &self,
        path: &str,
        api_version: &str,
        body: Option<JsonValue>,
    ) -> ArmResult<ArmResponse> {
        self.send(ArmRequest {
            method: Method::Put,
            url: path.to_string(),
            api_version: Some(api_version.to_string()),
            body,
        })
        .await
    }

    pub async fn delete(&self, path: &str, api_version: &str) -> ArmResult<ArmResponse> {
        self.send(ArmRequest {
            method: Method::Delete,
            url: path.to_string(),
            api_version: Some(api_version.to_string()),
            body: None,
        })
        .await
    }

    /// Wait for a long-running operation started by `response` to finish
    ///
    /// Responses other than 201/202 completed synchronously.
    pub async fn wait_for_completion(&self, response: &ArmResponse) -> ArmResult<()> {
        if !matches!(response.status, 201 | 202) {
            return Ok(());
        }

        let delay = response.retry_after().unwrap_or(self.poll_interval);

        if let Some(url) = response.header("azure-asyncoperation") {
            self.poll_async_operation(url, delay).await
        } else if let Some(url) = response.header("location")
            && response.status == 202
        {
            self.poll_location(url, delay).await
        } else {
            Ok(())
        }
    }

    /// Poll an Azure-AsyncOperation status resource
    async fn poll_async_operation(&self, url: &str, mut delay: Duration) -> ArmResult<()> {
        for _ in 0..self.poll_attempts {
            tokio::time::sleep(delay).await;

            let response = self
                .send(ArmRequest {
                    method: Method::Get,
                    url: url.to_string(),
                    api_version: None,
                    body: None,
                })
                .await?;

            let status = response
                .body
                .as_ref()
                .and_then(|b| b.get("status"))
                .and_then(|s| s.as_str())
                .unwrap_or("InProgress");

            match status {
                "Succeeded" => return Ok(()),
                "Failed" | "Canceled" | "Cancelled" => {
                    let message = response
                        .body
                        .as_ref()
                        .and_then(|b| b.pointer("/error/message"))
                        .and_then(|m| m.as_str())
                        .unwrap_or("no error details returned")
                        .to_string();
                    return Err(ArmError::OperationFailed {
                        status: status.to_string(),
                        message,
                    });
                }
                _ => {
                    delay = response.retry_after().unwrap_or(self.poll_interval);
                }
            }
        }

        Err(ArmError::PollingExhausted(self.poll_attempts))
    }

    /// Poll a Location header until the service stops answering 202
    async fn poll_location(&self, url: &str, mut delay: Duration) -> ArmResult<()> {
        for _ in 0..self.poll_attempts {
            tokio::time::sleep(delay).await;

            let response = self
                .send(ArmRequest {
                    method: Method::Get,
                    url: url.to_string(),
                    api_version: None,
                    body: None,
                })
                .await?;

            if response.status != 202 {
                return Ok(());
            }
            delay = response.retry_after().unwrap_or(self.poll_interval);
        }

        Err(ArmError::PollingExhausted(self.poll_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::json;

    const POLL: &str = "https://management.azure.com/operations/op-1";

    fn client(transport: &Arc<MockTransport>) -> ArmClient {
        ArmClient::new(transport.clone()).with_polling(Duration::from_millis(1), 5)
    }

    #[tokio::test]
    async fn get_carries_api_version() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/things/a", ArmResponse::new(200));

        client(&transport).get("/things/a", "2023-01-01").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].url, "/things/a");
        assert_eq!(requests[0].api_version.as_deref(), Some("2023-01-01"));
    }

    #[tokio::test]
    async fn error_envelope_is_parsed() {
        let transport = MockTransport::new();
        transport.respond(
            Method::Get,
            "/things/a",
            ArmResponse::new(409).with_body(json!({
                "error": { "code": "Conflict", "message": "busy" }
            })),
        );

        let err = client(&transport)
            .get("/things/a", "2023-01-01")
            .await
            .unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "unexpected status 409 with error: Conflict: busy"
        );
    }

    #[tokio::test]
    async fn missing_route_is_not_found() {
        let transport = MockTransport::new();
        let err = client(&transport)
            .get("/nothing", "2023-01-01")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn synchronous_response_needs_no_polling() {
        let transport = MockTransport::new();
        client(&transport)
            .wait_for_completion(&ArmResponse::new(200))
            .await
            .unwrap();
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn async_operation_polls_until_succeeded() {
        let transport = MockTransport::new();
        transport.respond(
            Method::Get,
            POLL,
            ArmResponse::new(200).with_body(json!({"status": "InProgress"})),
        );
        transport.respond(
            Method::Get,
            POLL,
            ArmResponse::new(200).with_body(json!({"status": "Succeeded"})),
        );

        let started = ArmResponse::new(201).with_header("Azure-AsyncOperation", POLL);
        client(&transport)
            .wait_for_completion(&started)
            .await
            .unwrap();
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn async_operation_failure_is_reported() {
        let transport = MockTransport::new();
        transport.respond(
            Method::Get,
            POLL,
            ArmResponse::new(200).with_body(json!({
                "status": "Failed",
                "error": { "code": "InstallFailed", "message": "package not found" }
            })),
        );

        let started = ArmResponse::new(202).with_header("Azure-AsyncOperation", POLL);
        let err = client(&transport)
            .wait_for_completion(&started)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "long-running operation finished with status Failed: package not found"
        );
    }

    #[tokio::test]
    async fn location_polls_until_not_accepted() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, POLL, ArmResponse::new(202));
        transport.respond(Method::Get, POLL, ArmResponse::new(202));
        transport.respond(Method::Get, POLL, ArmResponse::new(200));

        let started = ArmResponse::new(202).with_header("Location", POLL);
        client(&transport)
            .wait_for_completion(&started)
            .await
            .unwrap();
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_sets_poll_delay() {
        let transport = MockTransport::new();
        transport.respond(
            Method::Get,
            POLL,
            ArmResponse::new(200)
                .with_header("Retry-After", "10")
                .with_body(json!({"status": "InProgress"})),
        );
        transport.respond(
            Method::Get,
            POLL,
            ArmResponse::new(200).with_body(json!({"status": "Succeeded"})),
        );

        let started = ArmResponse::new(201)
            .with_header("Azure-AsyncOperation", POLL)
            .with_header("Retry-After", "30");
        let arm = ArmClient::new(transport.clone()).with_polling(Duration::from_secs(1), 5);

        let begin = tokio::time::Instant::now();
        arm.wait_for_completion(&started).await.unwrap();
        let elapsed = begin.elapsed();

        assert!(elapsed >= Duration::from_secs(40), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(41), "{:?}", elapsed);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_interval_applies_without_retry_after() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, POLL, ArmResponse::new(200));

        let started = ArmResponse::new(202).with_header("Location", POLL);
        let arm = ArmClient::new(transport).with_polling(Duration::from_secs(7), 5);

        let begin = tokio::time::Instant::now();
        arm.wait_for_completion(&started).await.unwrap();
        let elapsed = begin.elapsed();
        assert!(elapsed >= Duration::from_secs(7) && elapsed < Duration::from_secs(8));
    }

    #[tokio::test]
    async fn polling_gives_up() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, POLL, ArmResponse::new(202));

        let started = ArmResponse::new(202).with_header("Location", POLL);
        let err = client(&transport)
            .wait_for_completion(&started)
            .await
            .unwrap_err();
        assert!(matches!(err, ArmError::PollingExhausted(5)));
    }
}

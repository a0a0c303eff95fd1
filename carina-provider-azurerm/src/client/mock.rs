//! In-memory transport for tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use super::{ArmRequest, ArmResponse, ArmResult, ArmTransport, Method};

/// Replays canned responses keyed by method and request path
///
/// Responses queued for a route are returned in order; the last one
/// keeps being returned once the queue is drained. Unknown routes answer 404.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<ArmResponse>>>,
    requests: Mutex<Vec<ArmRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, method: Method, path: &str, response: ArmResponse) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<ArmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn requests_to(&self, method: Method, path: &str) -> Vec<ArmRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url == path)
            .collect()
    }
}

#[async_trait]
impl ArmTransport for MockTransport {
    async fn send(&self, request: ArmRequest) -> ArmResult<ArmResponse> {
        let key = (request.method, request.url.clone());
        self.requests.lock().unwrap().push(request);

        let mut routes = self.routes.lock().unwrap();
        let response = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        Ok(response.unwrap_or_else(|| {
            ArmResponse::new(404).with_body(json!({
                "error": {
                    "code": "ResourceNotFound",
                    "message": format!("{} was not found", key.1)
                }
            }))
        }))
    }
}

//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::ApiError;

#[derive(Debug, Clone)]
enum Scripted {
    Respond {
        response: ApiResponse,
        delay: Option<Duration>,
    },
    Fail(String),
}

/// Replies from per-route queues. The last reply queued on a route is
/// repeated once the others are used up.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn enqueue(&self, method: Method, endpoint: &str, scripted: Scripted) {
        self.routes
            .lock()
            .expect("routes lock")
            .entry((method, endpoint.to_string()))
            .or_default()
            .push_back(scripted);
    }

    pub(crate) fn respond(&self, method: Method, endpoint: &str, status: u16, body: Value) {
        self.respond_raw(method, endpoint, status, &body.to_string());
    }

    pub(crate) fn respond_raw(&self, method: Method, endpoint: &str, status: u16, body: &str) {
        self.enqueue(
            method,
            endpoint,
            Scripted::Respond {
                response: ApiResponse {
                    status,
                    body: body.to_string(),
                },
                delay: None,
            },
        );
    }

    pub(crate) fn respond_after(
        &self,
        method: Method,
        endpoint: &str,
        status: u16,
        body: Value,
        delay: Duration,
    ) {
        self.enqueue(
            method,
            endpoint,
            Scripted::Respond {
                response: ApiResponse {
                    status,
                    body: body.to_string(),
                },
                delay: Some(delay),
            },
        );
    }

    pub(crate) fn fail(&self, method: Method, endpoint: &str, reason: &str) {
        self.enqueue(method, endpoint, Scripted::Fail(reason.to_string()));
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// `METHOD endpoint` for every request seen, in order.
    pub(crate) fn request_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.endpoint))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        let scripted = {
            let mut routes = self.routes.lock().expect("routes lock");
            let queue = routes
                .get_mut(&(request.method, request.endpoint.clone()))
                .ok_or_else(|| {
                    ApiError::Transport(format!(
                        "no scripted response for {} {}",
                        request.method, request.endpoint
                    ))
                })?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };

        match scripted {
            Some(Scripted::Respond { response, delay }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(response)
            }
            Some(Scripted::Fail(reason)) => Err(ApiError::Transport(reason)),
            None => Err(ApiError::Transport(format!(
                "no scripted response for {} {}",
                request.method, request.endpoint
            ))),
        }
    }
}

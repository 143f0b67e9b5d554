//! Remote client for the scheduling backend.
//!
//! ```text
//! ApiClient
//! ├── transport: Arc<dyn Transport>   (HttpTransport in production)
//! ├── loading: LoadingIndicator       (set for the duration of each call)
//! └── notifier: Notifier              (transient success/error messages)
//! ```
//!
//! Every call goes through [`ApiClient::call`]: the loading indicator is
//! raised by a guard that clears it on every exit path, non-success
//! responses are turned into [`ApiError::Request`] with the backend's `erro`
//! message, and failures raise an error notification before being returned.

pub mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod notify;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use crate::api::http::HttpTransport;
pub use crate::api::notify::{Notification, NotificationLevel, Notifier};
use crate::error::ApiError;

/// Message used when an error response carries no `erro` field.
pub const GENERIC_ERROR_MESSAGE: &str = "Erro na requisição";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request as handed to the transport. `endpoint` is relative to the API
/// root (`/clientes/3`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Headers actually sent: JSON content type first, caller headers merged
    /// on top (a caller `Content-Type` replaces the default).
    pub fn effective_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        for (name, value) in &self.headers {
            match headers
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            {
                Some(slot) => slot.1 = value.clone(),
                None => headers.push((name.clone(), value.clone())),
            }
        }
        headers
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves a request to the backend and back.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Global "loading" flag. Counts in-flight calls so overlapping calls do not
/// clear each other's indicator.
#[derive(Debug, Default)]
pub struct LoadingIndicator {
    in_flight: AtomicUsize,
}

impl LoadingIndicator {
    pub fn is_active(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn begin(&self) -> LoadingGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        LoadingGuard { indicator: self }
    }
}

/// Clears its share of the loading indicator when dropped.
#[must_use = "the indicator is cleared as soon as the guard is dropped"]
pub struct LoadingGuard<'a> {
    indicator: &'a LoadingIndicator,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.indicator.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    loading: LoadingIndicator,
    notifier: Notifier,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, notifier: Notifier) -> Self {
        Self {
            transport,
            loading: LoadingIndicator::default(),
            notifier,
        }
    }

    pub fn loading(&self) -> &LoadingIndicator {
        &self.loading
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// `call(endpoint, method, body)` with no query or extra headers.
    pub async fn call(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let mut request = ApiRequest::new(method, endpoint);
        request.body = body;
        self.execute(request).await
    }

    /// Issue `request`, decode its JSON body, and surface failures.
    pub async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let result = {
            let _loading = self.loading.begin();
            self.round_trip(&request).await
        };

        if let Err(ref e) = result {
            tracing::warn!(
                method = %request.method,
                endpoint = %request.endpoint,
                error = %e,
                "Backend call failed"
            );
            self.notifier.error(e.user_message());
        }
        result
    }

    async fn round_trip(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let response = self.transport.send(request).await?;
        tracing::debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            status = response.status,
            "Backend responded"
        );

        if !response.is_success() {
            return Err(ApiError::Request {
                status: response.status,
                message: extract_error_message(&response.body),
            });
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode {
            endpoint: request.endpoint.clone(),
            reason: e.to_string(),
        })
    }

    /// GET `endpoint` with `query` and decode the body into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        let value = self
            .execute(ApiRequest::new(Method::Get, endpoint).with_query(query))
            .await?;
        serde_json::from_value(value).map_err(|e| {
            let err = ApiError::Decode {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            };
            self.notifier.error(err.user_message());
            err
        })
    }

    /// Send `body` as JSON with `method`; the response body is ignored.
    pub async fn send_json<B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let mut request = ApiRequest::new(method, endpoint);
        if let Some(body) = body {
            let value = serde_json::to_value(body).map_err(|e| ApiError::Decode {
                endpoint: endpoint.to_string(),
                reason: format!("failed to encode request body: {e}"),
            })?;
            request = request.with_body(value);
        }
        self.execute(request).await
    }
}

/// Pull the human-readable `erro` field out of an error body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("erro")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::mock::ScriptedTransport;
    use super::*;

    fn client_with(transport: Arc<ScriptedTransport>) -> ApiClient {
        ApiClient::new(transport, Notifier::default())
    }

    #[test]
    fn effective_headers_default_to_json_and_merge_caller_values() {
        let request = ApiRequest::new(Method::Post, "/clientes")
            .with_header("X-Trace", "abc")
            .with_header("content-type", "application/merge-patch+json");
        assert_eq!(
            request.effective_headers(),
            vec![
                (
                    "Content-Type".to_string(),
                    "application/merge-patch+json".to_string()
                ),
                ("X-Trace".to_string(), "abc".to_string()),
            ]
        );
    }

    #[test]
    fn error_message_falls_back_to_generic_text() {
        assert_eq!(extract_error_message(r#"{"erro": "Telefone inválido"}"#), "Telefone inválido");
        assert_eq!(extract_error_message(r#"{"detail": "x"}"#), GENERIC_ERROR_MESSAGE);
        assert_eq!(extract_error_message("<html>502</html>"), GENERIC_ERROR_MESSAGE);
        assert_eq!(extract_error_message(r#"{"erro": ""}"#), GENERIC_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn request_error_carries_backend_message_and_notifies() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::Post, "/clientes", 400, json!({"erro": "Telefone inválido"}));
        let api = client_with(transport.clone());

        let err = api
            .call("/clientes", Method::Post, Some(json!({"nome": "Ana"})))
            .await
            .expect_err("must fail");

        let ApiError::Request { status, message } = err else {
            panic!("expected Request error");
        };
        assert_eq!(status, 400);
        assert_eq!(message, "Telefone inválido");

        let notes = api.notifier().drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert_eq!(notes[0].message, "Telefone inválido");
    }

    #[tokio::test]
    async fn loading_indicator_is_cleared_after_success_and_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(Method::Get, "/clientes", 200, json!([]));
        transport.fail(Method::Get, "/servicos", "connection refused");
        let api = client_with(transport);

        assert!(!api.loading().is_active());
        api.call("/clientes", Method::Get, None).await.expect("ok");
        assert!(!api.loading().is_active());
        api.call("/servicos", Method::Get, None)
            .await
            .expect_err("transport failure");
        assert!(!api.loading().is_active());
    }

    #[tokio::test]
    async fn loading_indicator_is_set_while_call_is_in_flight() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_after(
            Method::Get,
            "/clientes",
            200,
            json!([]),
            std::time::Duration::from_millis(50),
        );
        let api = Arc::new(client_with(transport));

        let in_flight = {
            let api = api.clone();
            tokio::spawn(async move { api.call("/clientes", Method::Get, None).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(api.loading().is_active());

        in_flight.await.expect("join").expect("call");
        assert!(!api.loading().is_active());
    }

    #[tokio::test]
    async fn empty_success_body_decodes_as_null() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_raw(Method::Delete, "/clientes/3", 204, "");
        let api = client_with(transport);

        let value = api.call("/clientes/3", Method::Delete, None).await.expect("ok");
        assert_eq!(value, Value::Null);
        assert!(api.notifier().drain().is_empty());
    }

    #[tokio::test]
    async fn undecodable_success_body_is_a_generic_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond_raw(Method::Get, "/clientes", 200, "not json");
        let api = client_with(transport);

        let err = api
            .call("/clientes", Method::Get, None)
            .await
            .expect_err("must fail");
        assert!(matches!(err, ApiError::Decode { .. }));
        assert_eq!(err.status(), None);
    }
}

//! HTTP client seam.
//!
//! The core crates talk to the flashcard backend (the TTS endpoint, deck
//! manifests, the cacheable API routes) exclusively through [`HttpClient`],
//! so hosts can plug in reqwest, a browser fetch shim, or a scripted stub.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl HttpMethod {
    /// Whether the method is safe to replay, and therefore eligible for
    /// response caching.
    pub fn is_idempotent_read(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

/// A request to execute, built up fluently.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Shorthand for a plain GET.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Per-request timeout, overriding the client default.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// A completed response with its body fully read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {}", e))
        })
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    /// `Content-Type` header value, matched case-insensitively.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Retry behavior for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Ceiling applied after backoff growth.
    pub max_delay: Duration,
    pub use_exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            use_exponential_backoff: true,
        }
    }
}

impl RetryPolicy {
    /// One attempt, no retries. The fetch coordinator uses this: its retry
    /// story is the resolution chain itself, not repeated network hits.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Async HTTP execution provided by the host.
///
/// Implementations own connection pooling, TLS, and (optionally) retry;
/// cores treat any `Err` as "the network is not there right now" and degrade
/// through their cache tiers.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute a single request to completion.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Execute with an explicit retry policy. The default ignores the policy
    /// and performs one attempt; clients with real retry override this.
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let _ = policy;
        self.execute(request).await
    }

    /// Quick connectivity estimate. Advisory only.
    async fn is_connected(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_accumulates() {
        let request = HttpRequest::get("http://localhost:8000/tts?text=Hund&lang=de")
            .header("Accept", "audio/mpeg")
            .timeout(Duration::from_secs(10));

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(
            request.headers.get("Accept"),
            Some(&"audio/mpeg".to_string())
        );
        assert_eq!(request.timeout, Some(Duration::from_secs(10)));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_status_predicates() {
        let ok = HttpResponse {
            status: 204,
            headers: HashMap::new(),
            body: Bytes::new(),
        };
        assert!(ok.is_success());

        let missing = HttpResponse { status: 404, ..ok.clone() };
        assert!(missing.is_client_error());
        assert!(!missing.is_success());

        let broken = HttpResponse { status: 503, ..ok };
        assert!(broken.is_server_error());
    }

    #[test]
    fn test_content_type_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("content-TYPE".to_string(), "audio/mpeg".to_string());
        let response = HttpResponse {
            status: 200,
            headers,
            body: Bytes::new(),
        };
        assert_eq!(response.content_type(), Some("audio/mpeg"));
    }

    #[test]
    fn test_single_attempt_policy() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_attempts, 1);
        // Backoff settings are irrelevant at one attempt but stay sane
        assert!(policy.base_delay > Duration::ZERO);
    }

    #[test]
    fn test_only_reads_are_idempotent() {
        assert!(HttpMethod::Get.is_idempotent_read());
        assert!(HttpMethod::Head.is_idempotent_read());
        assert!(!HttpMethod::Post.is_idempotent_read());
        assert!(!HttpMethod::Delete.is_idempotent_read());
    }
}

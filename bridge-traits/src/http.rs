//! HTTP Client Abstraction
//!
//! Request/response types and the async client trait that SharePoint sessions
//! are built on. The desktop implementation lives in `bridge-desktop`; tests
//! substitute a `mockall` double.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

/// Separator used when a response carries several `Set-Cookie` headers.
///
/// Cookie values may legally contain `,` (e.g. in `Expires`), so they are
/// folded on newlines instead of the comma used for other repeated headers.
pub const SET_COOKIE_SEPARATOR: char = '\n';

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// HTTP request builder
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

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Attach a text body with an explicit content type (SOAP envelopes, form posts).
    pub fn text_body(mut self, body: impl Into<String>, content_type: &str) -> Self {
        self.body = Some(Bytes::from(body.into()));
        self.headers
            .insert("Content-Type".to_string(), content_type.to_string());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Look up a header value, ignoring ASCII case of the name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over every `Set-Cookie` line carried by the response
    pub fn set_cookies(&self) -> impl Iterator<Item = &str> {
        self.header("set-cookie")
            .into_iter()
            .flat_map(|value| value.split(SET_COOKIE_SEPARATOR))
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Whether to use exponential backoff
    pub use_exponential_backoff: bool,
}

impl RetryPolicy {
    /// A policy that performs exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Same policy with a different attempt budget (clamped to at least one).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
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

/// Async HTTP client trait
///
/// Abstracts HTTP so the SharePoint session can run against `reqwest` on
/// desktop and against a mock in tests. Implementations should handle TLS
/// and connection reuse. Retries, if any, are configured on the
/// implementation (the desktop client takes a [`RetryPolicy`]).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest, HttpMethod};
///
/// async fn fetch_data(client: &dyn HttpClient) -> Result<String> {
///     let request = HttpRequest::new(HttpMethod::Get, "https://contoso.sharepoint.com/_api/web")
///         .header("Accept", "application/json;odata=nometadata");
///
///     let response = client.execute(request).await?;
///     Ok(String::from_utf8_lossy(&response.body).into_owned())
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request
    ///
    /// Non-2xx statuses are returned as a normal [`HttpResponse`]; only
    /// transport failures are errors.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails
    /// - TLS validation fails
    /// - Request times out
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new(HttpMethod::Get, "https://example.com")
            .header("User-Agent", "test")
            .header("Cookie", "FedAuth=abc")
            .timeout(Duration::from_secs(30));

        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
        assert!(request.headers.contains_key("Cookie"));
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_text_body_sets_content_type() {
        let request = HttpRequest::new(HttpMethod::Post, "https://example.com")
            .text_body("<xml/>", "application/soap+xml; charset=utf-8");

        assert_eq!(request.body, Some(Bytes::from("<xml/>")));
        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/soap+xml; charset=utf-8".to_string())
        );
    }

    #[test]
    fn test_http_response_status_checks() {
        let response = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from("test"),
        };

        assert!(response.is_success());

        let response = HttpResponse {
            status: 302,
            headers: HashMap::new(),
            body: Bytes::new(),
        };

        assert!(!response.is_success());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        let response = HttpResponse {
            status: 200,
            headers,
            body: Bytes::new(),
        };

        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(response.header("X-Missing"), None);
    }

    #[test]
    fn test_set_cookies_splits_folded_lines() {
        let mut headers = HashMap::new();
        headers.insert(
            "set-cookie".to_string(),
            "rtFa=abc; path=/; secure\nFedAuth=def; expires=Wed, 01 Jan 2031 00:00:00 GMT"
                .to_string(),
        );
        let response = HttpResponse {
            status: 200,
            headers,
            body: Bytes::new(),
        };

        let cookies: Vec<&str> = response.set_cookies().collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("rtFa=abc"));
        assert!(cookies[1].starts_with("FedAuth=def"));
    }

    #[test]
    fn test_retry_policy_none() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(RetryPolicy::default().with_max_attempts(0).max_attempts, 1);
    }
}

//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy, SET_COOKIE_SEPARATOR},
};
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("sharepoint-connector/", env!("CARGO_PKG_VERSION"));

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - Connection reuse via reqwest's pool
/// - Optional retry with exponential backoff (see [`RetryPolicy`])
/// - TLS through rustls
///
/// Redirects are never followed. SharePoint sign-in answers with a `302`
/// whose `Set-Cookie` headers carry the session, and those must reach the
/// caller.
pub struct ReqwestHttpClient {
    client: Client,
    default_policy: RetryPolicy,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with a 30 second timeout and no retries
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with a custom overall request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    /// Wrap an already configured reqwest client
    ///
    /// The caller's redirect policy is kept; sign-in needs redirects disabled.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            default_policy: RetryPolicy::none(),
        }
    }

    /// Policy applied by [`HttpClient::execute`]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    /// Flatten a header map, keeping every value of repeated headers
    fn fold_headers(headers: &HeaderMap) -> HashMap<String, String> {
        let mut folded: HashMap<String, String> = HashMap::new();

        for (name, value) in headers {
            let Ok(value) = value.to_str() else {
                continue;
            };
            let separator = if *name == SET_COOKIE {
                SET_COOKIE_SEPARATOR.to_string()
            } else {
                ", ".to_string()
            };

            folded
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(&separator);
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        folded
    }

    fn map_send_error(e: reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::Timeout
        } else if e.is_connect() {
            BridgeError::ConnectionFailed(e.to_string())
        } else {
            BridgeError::OperationFailed(e.to_string())
        }
    }

    /// Execute request, retrying 5xx/429 and transport failures per `policy`
    async fn execute_with_policy(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < max_attempts {
            debug!(
                attempt = attempt + 1,
                max_attempts,
                url = %request.url,
                "Executing HTTP request"
            );

            let req_builder = self.build_request(request.clone());

            match req_builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retryable = status >= 500 || status == 429;

                    if retryable && attempt + 1 < max_attempts {
                        warn!(
                            status = status,
                            attempt = attempt + 1,
                            "HTTP request failed with retryable status"
                        );
                        last_error =
                            Some(BridgeError::OperationFailed(format!("HTTP {} error", status)));
                    } else {
                        // Success, non-retryable error, or final attempt: hand the
                        // status back to the caller to interpret
                        let headers = Self::fold_headers(response.headers());

                        let body = response.bytes().await.map_err(Self::map_send_error)?;

                        return Ok(HttpResponse {
                            status,
                            headers,
                            body,
                        });
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        "HTTP request failed"
                    );
                    last_error = Some(Self::map_send_error(e));
                }
            }

            attempt += 1;

            if attempt < max_attempts {
                let delay = if policy.use_exponential_backoff {
                    let exponential_delay = policy.base_delay * 2u32.pow(attempt - 1);
                    exponential_delay.min(policy.max_delay)
                } else {
                    policy.base_delay
                };

                debug!(delay_ms = delay.as_millis(), "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_policy(request, self.default_policy.clone())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONTENT_TYPE};

    #[tokio::test]
    async fn test_http_client_creation() {
        let client = ReqwestHttpClient::with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.default_policy, RetryPolicy::none());
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Post),
            reqwest::Method::POST
        );
    }

    #[test]
    fn test_fold_headers_keeps_every_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("rtFa=one; path=/"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("FedAuth=two; expires=Wed, 01 Jan 2031 00:00:00 GMT"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));

        let folded = ReqwestHttpClient::fold_headers(&headers);

        assert_eq!(
            folded.get("set-cookie").map(String::as_str),
            Some("rtFa=one; path=/\nFedAuth=two; expires=Wed, 01 Jan 2031 00:00:00 GMT")
        );
        assert_eq!(folded.get("content-type").map(String::as_str), Some("text/html"));
    }

    #[tokio::test]
    async fn test_default_client_builds_without_retries() {
        let client = ReqwestHttpClient::new().unwrap();
        assert_eq!(client.default_policy, RetryPolicy::none());
    }

    #[tokio::test]
    async fn test_retry_policy_override() {
        let client = ReqwestHttpClient::new()
            .unwrap()
            .with_retry_policy(RetryPolicy::default());
        assert_eq!(client.default_policy.max_attempts, 3);
    }
}

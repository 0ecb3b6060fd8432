//! # Connector Configuration Module
//!
//! Configuration for the SharePoint document connector.
//!
//! ## Overview
//!
//! A builder assembles a `ConnectorConfig` holding the site coordinates,
//! credentials, transport settings and the `HttpClient` bridge the REST
//! session runs on. `build()` fails fast with an actionable message when a
//! required value or capability is missing.
//!
//! ## Required Values
//!
//! - `base_url` - tenant root, e.g. `https://contoso.sharepoint.com`
//! - `site_name` - the `{site}` segment of `{base}/sites/{site}`
//! - `username` / `password` - user credentials for sign-in
//!
//! ## Optional Values (with defaults)
//!
//! - `library_title` - `"Documents"`
//! - `temp_dir` - `std::env::temp_dir()`
//! - `request_timeout` - 30 seconds
//! - `retry_attempts` - 1 (no retries)
//! - `http_client` - with the `desktop-shims` feature a `ReqwestHttpClient`
//!   is injected automatically when none is provided
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ConnectorConfig;
//!
//! let config = ConnectorConfig::builder()
//!     .base_url("https://contoso.sharepoint.com")
//!     .site_name("engineering")
//!     .username("svc-reader@contoso.com")
//!     .password(std::env::var("SP_PASSWORD")?)
//!     .build()?;
//! ```
//!
//! ### From the environment
//!
//! ```ignore
//! use core_runtime::config::ConnectorConfigBuilder;
//!
//! // SHAREPOINT_URL, SHAREPOINT_SITE, SHAREPOINT_USERNAME, SHAREPOINT_PASSWORD,
//! // plus optional SHAREPOINT_LIBRARY, SHAREPOINT_TEMP_DIR,
//! // SHAREPOINT_TIMEOUT_SECS and SHAREPOINT_RETRY_ATTEMPTS
//! let config = ConnectorConfigBuilder::from_env()?.build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Library queried when no title is configured
pub const DEFAULT_LIBRARY_TITLE: &str = "Documents";

/// Default overall timeout for a single HTTP request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound accepted for `retry_attempts`
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

pub const ENV_URL: &str = "SHAREPOINT_URL";
pub const ENV_SITE: &str = "SHAREPOINT_SITE";
pub const ENV_USERNAME: &str = "SHAREPOINT_USERNAME";
pub const ENV_PASSWORD: &str = "SHAREPOINT_PASSWORD";
pub const ENV_LIBRARY: &str = "SHAREPOINT_LIBRARY";
pub const ENV_TEMP_DIR: &str = "SHAREPOINT_TEMP_DIR";
pub const ENV_TIMEOUT_SECS: &str = "SHAREPOINT_TIMEOUT_SECS";
pub const ENV_RETRY_ATTEMPTS: &str = "SHAREPOINT_RETRY_ATTEMPTS";

/// Configuration for a SharePoint document connector.
///
/// Use [`ConnectorConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ConnectorConfig {
    /// Tenant root URL, without the `/sites/...` suffix
    pub base_url: String,

    /// Site name appended as `/sites/{site_name}`
    pub site_name: String,

    /// Sign-in user name
    pub username: String,

    /// Sign-in password; never logged or printed by `Debug`
    pub password: String,

    /// Title of the document library to read
    pub library_title: String,

    /// Directory where per-download temporary files are created
    pub temp_dir: PathBuf,

    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,

    /// Attempts per HTTP request, including the first one
    pub retry_attempts: u32,

    /// HTTP client the REST session runs on
    pub http_client: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("base_url", &self.base_url)
            .field("site_name", &self.site_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("library_title", &self.library_title)
            .field("temp_dir", &self.temp_dir)
            .field("request_timeout", &self.request_timeout)
            .field("retry_attempts", &self.retry_attempts)
            .field("http_client", &"HttpClient { ... }")
            .finish()
    }
}

impl ConnectorConfig {
    /// Creates a new builder for constructing a `ConnectorConfig`.
    pub fn builder() -> ConnectorConfigBuilder {
        ConnectorConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Base URL is an absolute http(s) URL
    /// - Site name, username and library title are not empty
    /// - Timeout is non-zero
    /// - Retry attempts are within `1..=MAX_RETRY_ATTEMPTS`
    pub fn validate(&self) -> Result<()> {
        let base_url = Url::parse(&self.base_url).map_err(|e| {
            Error::Config(format!("Base URL '{}' is not a valid URL: {}", self.base_url, e))
        })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Base URL must use http or https, got '{}'",
                base_url.scheme()
            )));
        }

        if self.site_name.trim().is_empty() {
            return Err(Error::Config("Site name cannot be empty".to_string()));
        }

        if self.username.trim().is_empty() {
            return Err(Error::Config("Username cannot be empty".to_string()));
        }

        if self.library_title.trim().is_empty() {
            return Err(Error::Config("Library title cannot be empty".to_string()));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if self.retry_attempts == 0 || self.retry_attempts > MAX_RETRY_ATTEMPTS {
            return Err(Error::Config(format!(
                "Retry attempts must be between 1 and {}",
                MAX_RETRY_ATTEMPTS
            )));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(
    _request_timeout: Duration,
    _retry_attempts: u32,
) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for the SharePoint REST session. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Otherwise: inject an implementation with .http_client()."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(
    request_timeout: Duration,
    retry_attempts: u32,
) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;
    use bridge_traits::RetryPolicy;

    let client = ReqwestHttpClient::with_timeout(request_timeout)?
        .with_retry_policy(RetryPolicy::default().with_max_attempts(retry_attempts));
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

/// Builder for [`ConnectorConfig`].
#[derive(Default)]
pub struct ConnectorConfigBuilder {
    base_url: Option<String>,
    site_name: Option<String>,
    username: Option<String>,
    password: Option<String>,
    library_title: Option<String>,
    temp_dir: Option<PathBuf>,
    request_timeout: Option<Duration>,
    retry_attempts: Option<u32>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl ConnectorConfigBuilder {
    /// Pre-fills a builder from the `SHAREPOINT_*` environment variables.
    ///
    /// Unset variables leave the corresponding value empty, so `build()`
    /// still reports exactly what is missing.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self {
            base_url: lookup(ENV_URL),
            site_name: lookup(ENV_SITE),
            username: lookup(ENV_USERNAME),
            password: lookup(ENV_PASSWORD),
            library_title: lookup(ENV_LIBRARY),
            temp_dir: lookup(ENV_TEMP_DIR).map(PathBuf::from),
            ..Self::default()
        };

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECS, raw))
            })?;
            builder.request_timeout = Some(Duration::from_secs(secs));
        }

        if let Some(raw) = lookup(ENV_RETRY_ATTEMPTS) {
            let attempts: u32 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a positive integer, got '{}'", ENV_RETRY_ATTEMPTS, raw))
            })?;
            builder.retry_attempts = Some(attempts);
        }

        Ok(builder)
    }

    /// Sets the tenant root URL (e.g. `https://contoso.sharepoint.com`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the site name.
    pub fn site_name(mut self, site: impl Into<String>) -> Self {
        self.site_name = Some(site.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the document library title. Default: `"Documents"`.
    pub fn library_title(mut self, title: impl Into<String>) -> Self {
        self.library_title = Some(title.into());
        self
    }

    /// Sets the directory for temporary download files.
    pub fn temp_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.temp_dir = Some(path.into());
        self
    }

    /// Sets the per-request timeout. Default: 30 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the number of attempts per HTTP request. Default: 1.
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }

    /// Injects the HTTP client bridge.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the final `ConnectorConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns an error if:
    /// - A required value is missing
    /// - No `HttpClient` was injected and no desktop default is available
    /// - [`ConnectorConfig::validate`] rejects the values
    pub fn build(self) -> Result<ConnectorConfig> {
        let base_url = self.base_url.ok_or_else(|| {
            Error::Config(format!(
                "Base URL is required. Use .base_url() or set {}.",
                ENV_URL
            ))
        })?;

        let site_name = self.site_name.ok_or_else(|| {
            Error::Config(format!(
                "Site name is required. Use .site_name() or set {}.",
                ENV_SITE
            ))
        })?;

        let username = self.username.ok_or_else(|| {
            Error::Config(format!(
                "Username is required. Use .username() or set {}.",
                ENV_USERNAME
            ))
        })?;

        let password = self.password.ok_or_else(|| {
            Error::Config(format!(
                "Password is required. Use .password() or set {}.",
                ENV_PASSWORD
            ))
        })?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let retry_attempts = self.retry_attempts.unwrap_or(1);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout, retry_attempts)?,
        };

        let config = ConnectorConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            site_name,
            username,
            password,
            library_title: self
                .library_title
                .unwrap_or_else(|| DEFAULT_LIBRARY_TITLE.to_string()),
            temp_dir: self.temp_dir.unwrap_or_else(std::env::temp_dir),
            request_timeout,
            retry_attempts,
            http_client,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse};
    use std::collections::HashMap;

    struct NoopHttpClient;

    #[async_trait]
    impl HttpClient for NoopHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, BridgeError> {
            Err(BridgeError::NotAvailable("noop".to_string()))
        }
    }

    fn complete_builder() -> ConnectorConfigBuilder {
        ConnectorConfig::builder()
            .base_url("https://contoso.sharepoint.com/")
            .site_name("engineering")
            .username("reader@contoso.com")
            .password("hunter2")
            .http_client(Arc::new(NoopHttpClient))
    }

    #[test]
    fn test_builder_with_all_required_fields() {
        let config = complete_builder().build().unwrap();

        assert_eq!(config.base_url, "https://contoso.sharepoint.com");
        assert_eq!(config.site_name, "engineering");
        assert_eq!(config.library_title, DEFAULT_LIBRARY_TITLE);
        assert_eq!(config.temp_dir, std::env::temp_dir());
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.retry_attempts, 1);
    }

    #[test]
    fn test_builder_requires_base_url() {
        let result = ConnectorConfig::builder()
            .site_name("engineering")
            .username("reader")
            .password("pw")
            .http_client(Arc::new(NoopHttpClient))
            .build();

        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Base URL")));
    }

    #[test]
    fn test_builder_requires_password() {
        let result = ConnectorConfig::builder()
            .base_url("https://contoso.sharepoint.com")
            .site_name("engineering")
            .username("reader")
            .http_client(Arc::new(NoopHttpClient))
            .build();

        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains(ENV_PASSWORD)));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_http_client_without_shims() {
        let result = ConnectorConfig::builder()
            .base_url("https://contoso.sharepoint.com")
            .site_name("engineering")
            .username("reader")
            .password("pw")
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "HttpClient")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let config = ConnectorConfig::builder()
            .base_url("https://contoso.sharepoint.com")
            .site_name("engineering")
            .username("reader")
            .password("pw")
            .build()
            .expect("desktop shims provide an HttpClient");

        assert_eq!(config.retry_attempts, 1);
    }

    #[test]
    fn test_validate_rejects_relative_base_url() {
        let result = complete_builder().base_url("contoso.sharepoint.com").build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("not a valid URL")));
    }

    #[test]
    fn test_validate_rejects_non_http_base_url() {
        let result = complete_builder()
            .base_url("ftp://contoso.sharepoint.com")
            .build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("http or https")));

        let result = complete_builder().base_url("https://").build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("not a valid URL")));
    }

    #[test]
    fn test_validate_accepts_uppercase_scheme() {
        let config = complete_builder()
            .base_url("HTTPS://Contoso.SharePoint.com")
            .build()
            .unwrap();
        assert_eq!(config.base_url, "HTTPS://Contoso.SharePoint.com");
    }

    #[test]
    fn test_validate_rejects_empty_site() {
        let result = complete_builder().site_name("  ").build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Site name")));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let result = complete_builder().request_timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_excessive_retries() {
        let result = complete_builder()
            .retry_attempts(MAX_RETRY_ATTEMPTS + 1)
            .build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Retry attempts")));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = complete_builder().build().unwrap();
        let rendered = format!("{:?}", config);

        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let mut env = HashMap::new();
        env.insert(ENV_URL, "https://contoso.sharepoint.com");
        env.insert(ENV_SITE, "finance");
        env.insert(ENV_USERNAME, "reader");
        env.insert(ENV_PASSWORD, "pw");
        env.insert(ENV_LIBRARY, "Shared Reports");
        env.insert(ENV_TEMP_DIR, "/var/tmp/spdocs");
        env.insert(ENV_TIMEOUT_SECS, "45");
        env.insert(ENV_RETRY_ATTEMPTS, "3");

        let config = ConnectorConfigBuilder::from_lookup(|key| env.get(key).map(|v| v.to_string()))
            .unwrap()
            .http_client(Arc::new(NoopHttpClient))
            .build()
            .unwrap();

        assert_eq!(config.site_name, "finance");
        assert_eq!(config.library_title, "Shared Reports");
        assert_eq!(config.temp_dir, PathBuf::from("/var/tmp/spdocs"));
        assert_eq!(config.request_timeout, Duration::from_secs(45));
        assert_eq!(config.retry_attempts, 3);
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let result = ConnectorConfigBuilder::from_lookup(|key| {
            (key == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });

        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains(ENV_TIMEOUT_SECS)));
    }

    #[test]
    fn test_from_lookup_missing_values_reported_by_build() {
        let result = ConnectorConfigBuilder::from_lookup(|_| None)
            .unwrap()
            .http_client(Arc::new(NoopHttpClient))
            .build();

        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains(ENV_URL)));
    }
}

//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`, with repeated `Set-Cookie` headers folded
//!   so the SharePoint sign-in flow can collect its session cookies
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::time::Duration;
//!
//! let http_client = ReqwestHttpClient::with_timeout(Duration::from_secs(30))?;
//! // Hand it to `ConnectorConfig::builder().http_client(Arc::new(http_client))`
//! ```

mod http;

pub use http::ReqwestHttpClient;

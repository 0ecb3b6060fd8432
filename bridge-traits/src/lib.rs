//! # Host Bridge Traits
//!
//! Capability traits the SharePoint connector needs from its host, each with
//! a desktop implementation in `bridge-desktop` and test doubles in the
//! consuming crates.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations used by the REST session
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The runtime configuration fails fast with a descriptive error when a
//! required capability is missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let http_client = builder.http_client
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client implementation provided. \
//!                  Desktop: enable the 'desktop-shims' feature.".to_string()
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep the message actionable
//! (include the URL or path involved where possible).
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync` so implementations can be shared
//! behind an `Arc` across async tasks.

pub mod error;
pub mod http;
pub mod logging;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};

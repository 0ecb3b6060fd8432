//! Workspace facade crate.
//!
//! Exposes the feature flags that wire the individual workspace crates
//! together. Host applications can depend on `sharepoint-workspace` with the
//! default `desktop-shims` feature and get a connector backed by the desktop
//! HTTP client without wiring each crate by hand.

#[cfg(feature = "desktop-shims")]
pub use core_runtime::config::{ConnectorConfig, ConnectorConfigBuilder};
#[cfg(feature = "desktop-shims")]
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
#[cfg(feature = "desktop-shims")]
pub use provider_sharepoint::{
    DocumentRecord, ErrorKind, RestSessionFactory, RetrievalError, SharePointConnector,
    SharePointError,
};

//! # Core Runtime Module
//!
//! Ambient runtime infrastructure for the SharePoint connector:
//! - Connector configuration (builder + environment loading)
//! - Logging and tracing setup
//!
//! Provider crates depend on this crate for configuration and log helpers
//! rather than wiring `tracing-subscriber` themselves.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};

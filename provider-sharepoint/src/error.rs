//! Error types for the SharePoint provider

use bridge_traits::BridgeError;
use std::fmt;
use thiserror::Error;

/// Category of a [`SharePointError`], stable for callers to branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Sign-in failed or the session was rejected
    Auth,
    /// Library or file does not exist
    NotFound,
    /// Item query was rejected or its response could not be read
    Query,
    /// Network or HTTP failure while talking to the site
    Transfer,
    /// Downloaded content is not valid UTF-8
    Decode,
    /// Local temp file could not be created, read or removed
    Io,
    /// Connector was given an unusable site URL
    Config,
}

/// SharePoint provider errors
#[derive(Error, Debug)]
pub enum SharePointError {
    /// Invalid credentials, STS fault, or HTTP 401/403
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Library or file missing
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Malformed query or unreadable listing response
    #[error("Query failed{}: {message}", status_suffix(.status))]
    Query { status: Option<u16>, message: String },

    /// Network error or unexpected HTTP status
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// File content is not UTF-8
    #[error("Content of {url} is not valid UTF-8: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Site URL is not an absolute http(s) URL with a host
    #[error("Invalid site URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Local filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SharePointError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SharePointError::Authentication(_) => ErrorKind::Auth,
            SharePointError::NotFound { .. } => ErrorKind::NotFound,
            SharePointError::Query { .. } => ErrorKind::Query,
            SharePointError::Transfer(_) => ErrorKind::Transfer,
            SharePointError::Decode { .. } => ErrorKind::Decode,
            SharePointError::Io(_) => ErrorKind::Io,
            SharePointError::InvalidUrl { .. } => ErrorKind::Config,
        }
    }
}

impl From<BridgeError> for SharePointError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Io(e) => SharePointError::Io(e),
            other => SharePointError::Transfer(other.to_string()),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}

/// Result type for SharePoint operations
pub type Result<T> = std::result::Result<T, SharePointError>;

/// Connector operation a [`RetrievalError`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListDocuments,
    GetDocument,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ListDocuments => f.write_str("documents"),
            Operation::GetDocument => f.write_str("document"),
        }
    }
}

/// Failure of a connector read operation
///
/// Wraps the underlying [`SharePointError`] so callers get one error type
/// per operation while keeping the original kind available through
/// [`kind`](Self::kind) and `source()`.
#[derive(Error, Debug)]
#[error("Error retrieving {operation}: {source}")]
pub struct RetrievalError {
    operation: Operation,
    #[source]
    source: SharePointError,
}

impl RetrievalError {
    pub fn new(operation: Operation, source: SharePointError) -> Self {
        Self { operation, source }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    pub fn cause(&self) -> &SharePointError {
        &self.source
    }
}

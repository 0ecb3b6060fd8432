//! # SharePoint Provider
//!
//! Retrieves text documents from a SharePoint Online document library.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`SharePointConnector`] with `list_documents()` and `get_document(name)`
//! - Session traits ([`SessionFactory`], [`SharePointSession`]) so the
//!   transport can be swapped out in tests
//! - [`RestSessionFactory`], a user-credential sign-in plus REST session on
//!   top of the host `HttpClient`
//! - A structured error taxonomy ([`SharePointError`], [`RetrievalError`])
//!
//! Each file is staged in a uniquely named temporary file that is removed
//! before the next download starts, on success and failure alike.

pub mod auth;
pub mod connector;
pub mod error;
pub mod rest;
pub mod session;
pub mod types;

pub use connector::{site_url_for, SharePointConnector, TEMP_FILE_PREFIX};
pub use error::{ErrorKind, Operation, Result, RetrievalError, SharePointError};
pub use rest::{RestSession, RestSessionFactory};
pub use session::{SessionFactory, SharePointSession};
pub use types::{DocumentRecord, ItemQuery, LibraryHandle, ListItem, UserCredential};

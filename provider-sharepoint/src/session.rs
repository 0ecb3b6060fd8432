//! Session collaborator traits
//!
//! The connector never speaks the SharePoint protocol itself. It signs in
//! through a [`SessionFactory`] and then drives the returned
//! [`SharePointSession`]. [`RestSessionFactory`](crate::rest::RestSessionFactory)
//! is the production implementation; tests inject in-memory doubles.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{ItemQuery, LibraryHandle, ListItem, UserCredential};

/// Creates authenticated sessions for a site
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Sign in to `site_url` (`{base}/sites/{site}`) with user credentials.
    ///
    /// Implementations may validate credentials eagerly or defer the check
    /// to the first session call.
    async fn authenticate(
        &self,
        site_url: &str,
        credential: &UserCredential,
    ) -> Result<Arc<dyn SharePointSession>>;
}

/// Authenticated connection to a single SharePoint site
///
/// Sessions are shared behind an `Arc` but a connector only ever has one
/// call in flight; implementations need not support parallel use.
#[async_trait]
pub trait SharePointSession: Send + Sync {
    /// Absolute URL of the site this session is bound to
    fn site_url(&self) -> &str;

    /// Look up a list or document library by title
    async fn resolve_library(&self, title: &str) -> Result<LibraryHandle>;

    /// Run an item query against a resolved library, returning items in
    /// server order
    async fn query_items(&self, library: &LibraryHandle, query: &ItemQuery)
        -> Result<Vec<ListItem>>;

    /// Download a file's bytes to `destination`, replacing its content
    async fn download_file(&self, server_relative_url: &str, destination: &Path) -> Result<()>;
}

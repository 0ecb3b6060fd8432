//! SharePoint document connector
//!
//! Reads text documents out of one document library of one site. Every
//! file is downloaded to its own temporary file, read back, decoded as
//! UTF-8 and the temporary file is removed before the next download starts.

use core_runtime::config::{ConnectorConfig, DEFAULT_LIBRARY_TITLE};
use core_runtime::logging::{redact_if_sensitive, strip_path};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{Operation, Result, RetrievalError, SharePointError};
use crate::rest::RestSessionFactory;
use crate::session::{SessionFactory, SharePointSession};
use crate::types::{DocumentRecord, ItemQuery, ListItem, UserCredential};

/// Prefix of every temporary download file
pub const TEMP_FILE_PREFIX: &str = "spdoc-";

/// Field holding a list item's file leaf name
const LEAF_NAME_FIELD: &str = "FileLeafRef";

/// Site URL for a tenant root and site name, e.g.
/// `https://contoso.sharepoint.com` + `team` -> `https://contoso.sharepoint.com/sites/team`
pub fn site_url_for(base_url: &str, site_name: &str) -> String {
    format!("{}/sites/{}", base_url.trim_end_matches('/'), site_name)
}

/// Document connector bound to a single SharePoint site
///
/// The connector owns its session for its whole lifetime. Operations run
/// one request at a time; callers sharing a connector across tasks must
/// serialize access themselves.
///
/// # Example
///
/// ```ignore
/// use provider_sharepoint::{RestSessionFactory, SharePointConnector};
///
/// let factory = RestSessionFactory::new(http_client);
/// let connector = SharePointConnector::connect(
///     &factory,
///     "https://contoso.sharepoint.com",
///     "team",
///     "reader@contoso.com",
///     password,
/// )
/// .await?;
///
/// for document in connector.list_documents().await? {
///     println!("{}: {} bytes", document.name(), document.content().len());
/// }
/// ```
pub struct SharePointConnector {
    session: Arc<dyn SharePointSession>,
    base_url: String,
    site_name: String,
    site_url: String,
    library_title: String,
    temp_dir: PathBuf,
}

impl SharePointConnector {
    /// Sign in to `{base_url}/sites/{site_name}` and bind to the resulting session.
    ///
    /// # Errors
    ///
    /// Whatever the factory reports, typically
    /// [`SharePointError::Authentication`] for rejected credentials.
    #[instrument(skip(factory, password), fields(username = %redact_if_sensitive("username", username)))]
    pub async fn connect(
        factory: &dyn SessionFactory,
        base_url: &str,
        site_name: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let site_url = site_url_for(base_url, site_name);
        let credential = UserCredential::new(username, password);

        let session = factory.authenticate(&site_url, &credential).await?;
        info!("Connected to {}", site_url);

        Ok(Self::with_session(session, base_url, site_name))
    }

    /// Bind to an already authenticated session
    pub fn with_session(
        session: Arc<dyn SharePointSession>,
        base_url: impl Into<String>,
        site_name: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        let site_name = site_name.into();
        let site_url = site_url_for(&base_url, &site_name);

        Self {
            session,
            base_url,
            site_name,
            site_url,
            library_title: DEFAULT_LIBRARY_TITLE.to_string(),
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Connect with the REST session over the configured HTTP client
    pub async fn from_config(config: &ConnectorConfig) -> Result<Self> {
        let factory = RestSessionFactory::new(Arc::clone(&config.http_client));
        let connector = Self::connect(
            &factory,
            &config.base_url,
            &config.site_name,
            &config.username,
            &config.password,
        )
        .await?;

        Ok(connector
            .with_library(config.library_title.as_str())
            .with_temp_dir(config.temp_dir.clone()))
    }

    /// Read from another document library than `Documents`
    pub fn with_library(mut self, title: impl Into<String>) -> Self {
        self.library_title = title.into();
        self
    }

    /// Create temporary download files in `dir` instead of the system temp dir
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    pub fn library_title(&self) -> &str {
        &self.library_title
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Download and decode every file of the library, in server order.
    ///
    /// Items without a file (folders) are skipped. Any failure aborts the
    /// whole listing; no partial result is returned.
    ///
    /// The REST session asks for at most 5000 items (`$top`) and does not
    /// follow paging links, so larger libraries are truncated to their first
    /// 5000 entries. Only a warning is logged when the limit is hit.
    #[instrument(skip(self), fields(site = %self.site_url, library = %self.library_title))]
    pub async fn list_documents(&self) -> std::result::Result<Vec<DocumentRecord>, RetrievalError> {
        info!("Listing documents");

        self.collect_documents().await.map_err(|e| {
            warn!("Listing documents failed: {}", e);
            RetrievalError::new(Operation::ListDocuments, e)
        })
    }

    /// Fetch a single document by its file leaf name.
    ///
    /// Returns `Ok(None)` when no item matches or the first match is not a
    /// file. When several files share the name, the first one the server
    /// returns wins. The record carries `document_name` as given.
    #[instrument(skip(self), fields(site = %self.site_url, library = %self.library_title))]
    pub async fn get_document(
        &self,
        document_name: &str,
    ) -> std::result::Result<Option<DocumentRecord>, RetrievalError> {
        info!("Getting document");

        self.find_document(document_name).await.map_err(|e| {
            warn!("Getting document failed: {}", e);
            RetrievalError::new(Operation::GetDocument, e)
        })
    }

    async fn collect_documents(&self) -> Result<Vec<DocumentRecord>> {
        let library = self.session.resolve_library(&self.library_title).await?;
        let items = self
            .session
            .query_items(&library, &Self::document_query())
            .await?;

        let mut documents = Vec::with_capacity(items.len());
        for entry in items.into_iter().filter_map(ListItem::into_entry) {
            let content = self.download_text(&entry.server_relative_url).await?;
            documents.push(DocumentRecord::new(
                entry.name,
                content,
                entry.server_relative_url,
            ));
        }

        info!("Retrieved {} documents", documents.len());
        Ok(documents)
    }

    async fn find_document(&self, document_name: &str) -> Result<Option<DocumentRecord>> {
        let library = self.session.resolve_library(&self.library_title).await?;
        let query = Self::document_query().filter_eq(LEAF_NAME_FIELD, document_name);
        let items = self.session.query_items(&library, &query).await?;

        let entry = match items.into_iter().next().and_then(ListItem::into_entry) {
            Some(entry) => entry,
            None => {
                debug!("No file named {}", document_name);
                return Ok(None);
            }
        };

        let content = self.download_text(&entry.server_relative_url).await?;
        Ok(Some(DocumentRecord::new(
            document_name,
            content,
            entry.server_relative_url,
        )))
    }

    fn document_query() -> ItemQuery {
        ItemQuery::new()
            .select([LEAF_NAME_FIELD, "File/ServerRelativeUrl"])
            .expand(["File"])
    }

    /// Download one file through a temp file and decode it.
    ///
    /// The temp file is gone when this returns, whatever the outcome.
    #[instrument(skip(self))]
    async fn download_text(&self, server_relative_url: &str) -> Result<String> {
        let temp_path = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile_in(&self.temp_dir)?
            .into_temp_path();
        debug!(
            temp_file = %strip_path(&temp_path.to_string_lossy()),
            "Downloading to temp file"
        );

        // On any early return the guard removes the file
        self.session
            .download_file(server_relative_url, &temp_path)
            .await?;
        let bytes = tokio::fs::read(&temp_path).await?;
        temp_path.close()?;

        debug!("Read {} bytes", bytes.len());

        String::from_utf8(bytes).map_err(|source| SharePointError::Decode {
            url: server_relative_url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bytes::Bytes;
    use std::collections::HashMap;

    /// Answers the STS and sign-in posts of a successful login
    struct SignInHttpClient;

    #[async_trait]
    impl HttpClient for SignInHttpClient {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> bridge_traits::error::Result<HttpResponse> {
            let mut headers = HashMap::new();
            let body = if request.url.ends_with("extSTS.srf") {
                "<wsse:BinarySecurityToken>t=abc</wsse:BinarySecurityToken>"
            } else {
                headers.insert(
                    "set-cookie".to_string(),
                    "FedAuth=fed; path=/\nrtFa=rt; path=/".to_string(),
                );
                ""
            };

            Ok(HttpResponse {
                status: 200,
                headers,
                body: Bytes::from(body),
            })
        }
    }

    #[tokio::test]
    async fn test_from_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = ConnectorConfig::builder()
            .base_url("https://contoso.sharepoint.com/")
            .site_name("team")
            .username("reader@contoso.com")
            .password("secret")
            .library_title("Shared Documents")
            .temp_dir(temp_dir.path())
            .http_client(Arc::new(SignInHttpClient))
            .build()
            .unwrap();

        let connector = SharePointConnector::from_config(&config).await.unwrap();

        assert_eq!(connector.site_url(), "https://contoso.sharepoint.com/sites/team");
        assert_eq!(connector.library_title(), "Shared Documents");
        assert_eq!(connector.temp_dir(), temp_dir.path());
    }

    #[test]
    fn test_site_url_for() {
        assert_eq!(
            site_url_for("https://contoso.sharepoint.com", "team"),
            "https://contoso.sharepoint.com/sites/team"
        );
        assert_eq!(
            site_url_for("https://contoso.sharepoint.com/", "team"),
            "https://contoso.sharepoint.com/sites/team"
        );
    }

    #[test]
    fn test_document_query_selects_file_reference() {
        let query = SharePointConnector::document_query();

        assert_eq!(query.select, vec!["FileLeafRef", "File/ServerRelativeUrl"]);
        assert_eq!(query.expand, vec!["File"]);
        assert_eq!(query.filter, None);
        assert_eq!(query.top, None);
    }
}

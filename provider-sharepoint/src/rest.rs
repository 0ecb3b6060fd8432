//! SharePoint REST session
//!
//! Signs in with user credentials (see [`auth`](crate::auth)) and talks to
//! the site's `_api` endpoints through the host [`HttpClient`].

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::logging::redact_if_sensitive;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::auth::{
    collect_auth_cookies, extract_security_token, origin_of, security_token_request,
    DEFAULT_STS_URL, SIGNIN_PATH, SOAP_CONTENT_TYPE,
};
use crate::error::{Result, SharePointError};
use crate::session::{SessionFactory, SharePointSession};
use crate::types::{odata_quote, ItemQuery, LibraryHandle, ListItem, UserCredential};

/// Ask for plain JSON without OData annotations
const ACCEPT_JSON: &str = "application/json;odata=nometadata";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Row ceiling applied when a query sets no `$top`
pub const DEFAULT_ITEM_LIMIT: u32 = 5000;

/// Longest server error text carried into an error message
const MAX_ERROR_MESSAGE: usize = 200;

/// Signs in against SharePoint Online and hands out [`RestSession`]s
///
/// # Example
///
/// ```ignore
/// use provider_sharepoint::rest::RestSessionFactory;
///
/// let factory = RestSessionFactory::new(http_client);
/// let session = factory.authenticate(&site_url, &credential).await?;
/// ```
pub struct RestSessionFactory {
    http_client: Arc<dyn HttpClient>,
    sts_url: String,
}

impl RestSessionFactory {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            sts_url: DEFAULT_STS_URL.to_string(),
        }
    }

    /// Use a different security token service
    pub fn with_sts_url(mut self, sts_url: impl Into<String>) -> Self {
        self.sts_url = sts_url.into();
        self
    }

    async fn request_security_token(
        &self,
        origin: &str,
        credential: &UserCredential,
    ) -> Result<String> {
        let endpoint = format!("{}/", origin);
        let envelope = security_token_request(
            &self.sts_url,
            &credential.username,
            credential.password(),
            &endpoint,
        );

        let request = HttpRequest::new(HttpMethod::Post, self.sts_url.as_str())
            .text_body(envelope, SOAP_CONTENT_TYPE);
        let response = self.http_client.execute(request).await?;
        debug!("STS responded: status={}", response.status);

        // Faults come back as SOAP documents, whatever the status
        extract_security_token(&String::from_utf8_lossy(&response.body))
    }

    async fn sign_in(&self, origin: &str, token: &str) -> Result<String> {
        let url = format!("{}{}", origin, SIGNIN_PATH);
        let request = HttpRequest::new(HttpMethod::Post, url).text_body(token, FORM_CONTENT_TYPE);
        let response = self.http_client.execute(request).await?;

        match response.status {
            401 | 403 => Err(SharePointError::Authentication(format!(
                "Sign-in rejected with status {}",
                response.status
            ))),
            status if status >= 500 => Err(SharePointError::Transfer(format!(
                "Sign-in failed with status {}",
                status
            ))),
            _ => collect_auth_cookies(&response),
        }
    }
}

#[async_trait]
impl SessionFactory for RestSessionFactory {
    #[instrument(skip(self, credential), fields(site_url = %site_url))]
    async fn authenticate(
        &self,
        site_url: &str,
        credential: &UserCredential,
    ) -> Result<Arc<dyn SharePointSession>> {
        let origin = origin_of(site_url)?;
        debug!(
            username = %redact_if_sensitive("username", &credential.username),
            "Requesting security token"
        );

        let token = self.request_security_token(&origin, credential).await?;
        let cookie_header = self.sign_in(&origin, &token).await?;

        info!("Signed in to SharePoint");

        Ok(Arc::new(RestSession {
            http_client: Arc::clone(&self.http_client),
            site_url: site_url.trim_end_matches('/').to_string(),
            cookie_header,
        }))
    }
}

/// Cookie-authenticated session bound to one site
pub struct RestSession {
    http_client: Arc<dyn HttpClient>,
    site_url: String,
    cookie_header: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListInfo {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemsPage {
    value: Vec<ListItem>,
}

impl RestSession {
    async fn get(&self, url: String, accept: Option<&str>) -> Result<HttpResponse> {
        let mut request =
            HttpRequest::new(HttpMethod::Get, url).header("Cookie", self.cookie_header.as_str());
        if let Some(accept) = accept {
            request = request.header("Accept", accept);
        }

        Ok(self.http_client.execute(request).await?)
    }

    fn list_path(library: &LibraryHandle) -> String {
        match &library.id {
            Some(id) => format!("lists(guid'{}')", id),
            None => format!("lists/GetByTitle({})", encode_segments(&odata_quote(&library.title))),
        }
    }

    fn items_url(&self, library: &LibraryHandle, query: &ItemQuery) -> String {
        let mut params = Vec::new();

        if !query.select.is_empty() {
            params.push(format!("$select={}", urlencoding::encode(&query.select.join(","))));
        }
        if !query.expand.is_empty() {
            params.push(format!("$expand={}", urlencoding::encode(&query.expand.join(","))));
        }
        if let Some(filter) = &query.filter {
            params.push(format!("$filter={}", urlencoding::encode(filter)));
        }
        params.push(format!("$top={}", query.top.unwrap_or(DEFAULT_ITEM_LIMIT)));

        format!(
            "{}/_api/web/{}/items?{}",
            self.site_url,
            Self::list_path(library),
            params.join("&")
        )
    }
}

#[async_trait]
impl SharePointSession for RestSession {
    fn site_url(&self) -> &str {
        &self.site_url
    }

    #[instrument(skip(self))]
    async fn resolve_library(&self, title: &str) -> Result<LibraryHandle> {
        let url = format!(
            "{}/_api/web/lists/GetByTitle({})?$select=Id,Title",
            self.site_url,
            encode_segments(&odata_quote(title))
        );

        let response = self.get(url, Some(ACCEPT_JSON)).await?;
        if !response.is_success() {
            return Err(error_for_status(
                &response,
                &format!("library '{}'", title),
                query_error,
            ));
        }

        let info: ListInfo = serde_json::from_slice(&response.body).map_err(|e| {
            SharePointError::Query {
                status: None,
                message: format!("Failed to parse list metadata: {}", e),
            }
        })?;

        debug!("Resolved library: id={:?}", info.id);

        Ok(LibraryHandle {
            title: info.title.unwrap_or_else(|| title.to_string()),
            id: info.id,
        })
    }

    #[instrument(skip(self, library), fields(library = %library.title, filter = ?query.filter))]
    async fn query_items(
        &self,
        library: &LibraryHandle,
        query: &ItemQuery,
    ) -> Result<Vec<ListItem>> {
        let response = self.get(self.items_url(library, query), Some(ACCEPT_JSON)).await?;
        if !response.is_success() {
            return Err(error_for_status(
                &response,
                &format!("library '{}'", library.title),
                query_error,
            ));
        }

        let page: ItemsPage = serde_json::from_slice(&response.body).map_err(|e| {
            SharePointError::Query {
                status: None,
                message: format!("Failed to parse item query response: {}", e),
            }
        })?;

        let limit = query.top.unwrap_or(DEFAULT_ITEM_LIMIT);
        if page.value.len() as u64 >= u64::from(limit) {
            warn!("Item query hit the {} row limit; results may be truncated", limit);
        }

        debug!("Item query returned {} items", page.value.len());
        Ok(page.value)
    }

    #[instrument(skip(self, destination), fields(url = %server_relative_url))]
    async fn download_file(&self, server_relative_url: &str, destination: &Path) -> Result<()> {
        let url = format!(
            "{}/_api/web/GetFileByServerRelativeUrl({})/$value",
            self.site_url,
            encode_segments(&odata_quote(server_relative_url))
        );

        let response = self.get(url, None).await?;
        if !response.is_success() {
            return Err(error_for_status(
                &response,
                server_relative_url,
                transfer_error,
            ));
        }

        tokio::fs::write(destination, &response.body).await?;
        debug!("Downloaded {} bytes", response.body.len());

        Ok(())
    }
}

/// Percent-encode every path segment, keeping the `/` separators
fn encode_segments(value: &str) -> String {
    value
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Map a non-2xx response. Statuses without a dedicated kind go through `other`.
fn error_for_status(
    response: &HttpResponse,
    resource: &str,
    other: fn(u16, String) -> SharePointError,
) -> SharePointError {
    let message = error_message(&response.body);
    warn!("SharePoint request failed: status={}, resource={}", response.status, resource);

    match response.status {
        401 | 403 => SharePointError::Authentication(format!(
            "Access to {} denied (status {}): {}",
            resource, response.status, message
        )),
        404 => SharePointError::NotFound {
            resource: resource.to_string(),
        },
        status if status >= 500 => transfer_error(status, message),
        status => other(status, message),
    }
}

fn query_error(status: u16, message: String) -> SharePointError {
    SharePointError::Query {
        status: Some(status),
        message,
    }
}

fn transfer_error(status: u16, message: String) -> SharePointError {
    SharePointError::Transfer(format!("status {}: {}", status, message))
}

/// Server error text: the OData error message when present, else the raw body
fn error_message(body: &[u8]) -> String {
    let odata_message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/odata.error/message/value")
                .or_else(|| value.pointer("/error/message/value"))
                .or_else(|| value.pointer("/error/message"))
                .and_then(|message| message.as_str())
                .map(str::to_string)
        });

    match odata_message {
        Some(message) => message,
        None => String::from_utf8_lossy(body)
            .trim()
            .chars()
            .take(MAX_ERROR_MESSAGE)
            .collect(),
    }
}

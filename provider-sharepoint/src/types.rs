//! SharePoint data types
//!
//! Records handed to callers, plus the request/response shapes exchanged
//! with a [`SharePointSession`](crate::session::SharePointSession).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text document retrieved from a document library
///
/// Immutable once built; two records are equal when all three fields are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRecord {
    name: String,
    content: String,
    url: String,
}

impl DocumentRecord {
    pub fn new(name: impl Into<String>, content: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            url: url.into(),
        }
    }

    /// File leaf name, e.g. `report.txt`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File content decoded as UTF-8
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Server-relative URL, e.g. `/sites/team/Shared Documents/report.txt`
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// User name and password used for sign-in
#[derive(Clone)]
pub struct UserCredential {
    pub username: String,
    password: String,
}

impl UserCredential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Resolved document library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryHandle {
    pub title: String,
    /// List GUID when the session reports one
    pub id: Option<String>,
}

impl LibraryHandle {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: None,
        }
    }
}

/// File reference attached to a list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileReference {
    #[serde(default)]
    pub server_relative_url: String,
}

/// One item of a document library as returned by an item query
///
/// Folders and other non-file items carry no `file`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListItem {
    #[serde(default)]
    pub file_leaf_ref: Option<String>,
    #[serde(default)]
    pub file: Option<FileReference>,
}

impl ListItem {
    /// Item backed by a file
    pub fn file(leaf_name: impl Into<String>, server_relative_url: impl Into<String>) -> Self {
        Self {
            file_leaf_ref: Some(leaf_name.into()),
            file: Some(FileReference {
                server_relative_url: server_relative_url.into(),
            }),
        }
    }

    /// Item without a file reference (folder)
    pub fn folder(leaf_name: impl Into<String>) -> Self {
        Self {
            file_leaf_ref: Some(leaf_name.into()),
            file: None,
        }
    }

    /// Listing entry for items that reference a file
    pub(crate) fn into_entry(self) -> Option<ListingEntry> {
        let file = self.file.filter(|file| !file.server_relative_url.is_empty())?;
        let name = match self.file_leaf_ref {
            Some(name) if !name.is_empty() => name,
            _ => file
                .server_relative_url
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
        };

        Some(ListingEntry {
            name,
            server_relative_url: file.server_relative_url,
        })
    }
}

/// File leaf name and location of one library file, consumed by a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListingEntry {
    pub name: String,
    pub server_relative_url: String,
}

/// Item query against a document library
///
/// ```
/// use provider_sharepoint::types::ItemQuery;
///
/// let query = ItemQuery::new()
///     .select(["FileLeafRef", "File/ServerRelativeUrl"])
///     .expand(["File"])
///     .filter_eq("FileLeafRef", "O'Brien.txt");
///
/// assert_eq!(query.filter.as_deref(), Some("FileLeafRef eq 'O''Brien.txt'"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub select: Vec<String>,
    pub expand: Vec<String>,
    /// OData `$filter` expression
    pub filter: Option<String>,
    /// Row limit; sessions apply their own ceiling when unset
    pub top: Option<u32>,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn expand<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expand.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter = Some(expression.into());
        self
    }

    /// Exact equality filter on a text field
    pub fn filter_eq(self, field: &str, value: &str) -> Self {
        let expression = format!("{} eq {}", field, odata_quote(value));
        self.filter(expression)
    }

    pub fn top(mut self, limit: u32) -> Self {
        self.top = Some(limit);
        self
    }
}

/// Quote a string literal for OData, doubling embedded single quotes
pub fn odata_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_entry_for_file() {
        let entry = ListItem::file("report.txt", "/sites/team/Shared Documents/report.txt")
            .into_entry()
            .unwrap();

        assert_eq!(entry.name, "report.txt");
        assert_eq!(entry.server_relative_url, "/sites/team/Shared Documents/report.txt");
    }

    #[test]
    fn test_into_entry_skips_folders() {
        assert!(ListItem::folder("Archive").into_entry().is_none());
    }

    #[test]
    fn test_into_entry_derives_missing_leaf_name() {
        let item = ListItem {
            file_leaf_ref: None,
            file: Some(FileReference {
                server_relative_url: "/sites/team/Shared Documents/notes.md".to_string(),
            }),
        };

        assert_eq!(item.into_entry().unwrap().name, "notes.md");
    }

    #[test]
    fn test_into_entry_skips_empty_file_reference() {
        let item: ListItem = serde_json::from_str(r#"{"FileLeafRef": "Drafts", "File": {}}"#).unwrap();
        assert!(item.into_entry().is_none());
    }

    #[test]
    fn test_list_item_deserializes_rest_shape() {
        let json = r#"[
            {"FileLeafRef": "a.txt", "File": {"ServerRelativeUrl": "/sites/x/Shared Documents/a.txt"}},
            {"FileLeafRef": "Folder", "File": null},
            {"FileLeafRef": "Other"}
        ]"#;

        let items: Vec<ListItem> = serde_json::from_str(json).unwrap();

        assert_eq!(items.len(), 3);
        assert!(items[0].file.is_some());
        assert!(items[1].file.is_none());
        assert!(items[2].file.is_none());
    }

    #[test]
    fn test_odata_quote_escapes() {
        assert_eq!(odata_quote("plain.txt"), "'plain.txt'");
        assert_eq!(odata_quote("it's.txt"), "'it''s.txt'");
    }

    #[test]
    fn test_credential_debug_redacts_password() {
        let credential = UserCredential::new("reader@contoso.com", "hunter2");
        let rendered = format!("{:?}", credential);

        assert!(rendered.contains("reader@contoso.com"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_document_record_accessors() {
        let record = DocumentRecord::new("report.txt", "hello world", "/sites/a/report.txt");

        assert_eq!(record.name(), "report.txt");
        assert_eq!(record.content(), "hello world");
        assert_eq!(record.url(), "/sites/a/report.txt");
    }
}

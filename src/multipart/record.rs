//! Record type produced by the multipart parser

use serde::{Deserialize, Serialize};

/// One decoded unit of query output.
///
/// Metadata fields distinguish "header absent" (`None`) from "header present
/// but empty" (`Some("")`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// MIME-like content type reported by the query service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Source-reported scalar or node type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primitive: Option<String>,
    /// Originating document URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Originating location expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Trimmed body text
    pub content: String,
    /// Absolute position in the result set, assigned when paging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl Record {
    /// Creates a record with the given content and no metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the document URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Sets the absolute index.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Content type, with an absent header read as empty.
    pub fn content_type_or_empty(&self) -> &str {
        self.content_type.as_deref().unwrap_or("")
    }

    /// Returns true if any metadata header was present.
    pub fn has_metadata(&self) -> bool {
        self.content_type.is_some()
            || self.primitive.is_some()
            || self.uri.is_some()
            || self.path.is_some()
    }
}

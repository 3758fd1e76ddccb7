/// Document source port trait
///
/// Fetches the plain text of an externally hosted document given its ID and
/// a bearer credential obtained elsewhere.
/// Implementation: Google Docs
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Metadata about a fetched document
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub document_id: String,
    pub revision_id: Option<String>,
}

/// Plain text of a document along with its metadata
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FetchedDocument {
    pub metadata: DocumentMetadata,
    pub content: String,
}

/// Port trait for document sources
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentSourcePort: Send + Sync {
    /// Fetch a document's text and metadata
    async fn fetch_document(&self, document_id: &str, access_token: &str)
        -> Result<FetchedDocument>;

    /// Recover a document ID from a share or edit URL
    fn document_id_from_url(&self, url: &str) -> Option<String>;
}

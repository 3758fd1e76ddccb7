//! Google Docs document adapter
//!
//! Fetches a document with an already obtained OAuth access token and
//! flattens its body to plain text.

use crate::error::{AppError, Result};
use crate::ports::documents::{DocumentMetadata, DocumentSourcePort, FetchedDocument};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const GOOGLE_DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";

/// URL shapes that carry a document ID, tried in order
const DOCUMENT_ID_PATTERNS: [&str; 2] = [r"/document/d/([a-zA-Z0-9_-]+)", r"id=([a-zA-Z0-9_-]+)"];

/// Google Docs service implementation
pub struct GoogleDocsService {
    client: Client,
    base_url: String,
    id_patterns: Vec<Regex>,
}

#[derive(Debug, Deserialize)]
struct GoogleDocument {
    title: Option<String>,
    #[serde(rename = "revisionId")]
    revision_id: Option<String>,
    body: Option<Body>,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(default)]
    content: Vec<StructuralElement>,
}

#[derive(Debug, Deserialize)]
struct StructuralElement {
    paragraph: Option<Paragraph>,
    table: Option<Table>,
}

#[derive(Debug, Deserialize)]
struct Paragraph {
    #[serde(default)]
    elements: Vec<ParagraphElement>,
}

#[derive(Debug, Deserialize)]
struct ParagraphElement {
    #[serde(rename = "textRun")]
    text_run: Option<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct Table {
    #[serde(rename = "tableRows", default)]
    table_rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(rename = "tableCells", default)]
    table_cells: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    content: Vec<StructuralElement>,
}

/// Appends every text run under `elements`, descending into table cells
fn collect_text(elements: &[StructuralElement], out: &mut String) {
    for element in elements {
        if let Some(paragraph) = &element.paragraph {
            for run in paragraph.elements.iter().filter_map(|e| e.text_run.as_ref()) {
                out.push_str(&run.content);
            }
        } else if let Some(table) = &element.table {
            for cell in table.table_rows.iter().flat_map(|r| &r.table_cells) {
                collect_text(&cell.content, out);
            }
        }
    }
}

impl GoogleDocument {
    fn plain_text(&self) -> String {
        let mut text = String::new();
        if let Some(body) = &self.body {
            collect_text(&body.content, &mut text);
        }
        text
    }
}

impl GoogleDocsService {
    /// Create a new Google Docs service
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let id_patterns = DOCUMENT_ID_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Config(format!("Invalid document ID pattern: {}", e)))?;

        Ok(Self {
            client,
            base_url: GOOGLE_DOCS_API_BASE.to_string(),
            id_patterns,
        })
    }

    /// Point the service at a different API root (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl DocumentSourcePort for GoogleDocsService {
    async fn fetch_document(&self, document_id: &str, access_token: &str) -> Result<FetchedDocument> {
        log::info!("Fetching Google Doc {}", document_id);

        let response = self
            .client
            .get(format!("{}/documents/{}", self.base_url, document_id))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Document(format!("Failed to fetch Google Doc: {}", e)))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AppError::Unauthorized(
                    "Google rejected the access token".to_string(),
                ));
            }
            StatusCode::NOT_FOUND => return Err(AppError::NotFound("Document".to_string())),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                return Err(AppError::Document(format!(
                    "Failed to fetch Google Doc ({}): {}",
                    status, error_text
                )));
            }
        }

        let document: GoogleDocument = response
            .json()
            .await
            .map_err(|e| AppError::Document(format!("Failed to parse Google Doc: {}", e)))?;

        let content = document.plain_text();
        log::info!(
            "Fetched Google Doc {} ({} characters)",
            document_id,
            content.len()
        );

        Ok(FetchedDocument {
            metadata: DocumentMetadata {
                title: document.title.unwrap_or_else(|| "Untitled".to_string()),
                document_id: document_id.to_string(),
                revision_id: document.revision_id,
            },
            content,
        })
    }

    fn document_id_from_url(&self, url: &str) -> Option<String> {
        self.id_patterns
            .iter()
            .find_map(|re| re.captures(url))
            .map(|caps| caps[1].to_string())
    }
}

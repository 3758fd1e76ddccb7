//! Google Docs import endpoints
//!
//! The caller supplies an OAuth access token, either as a bearer
//! `Authorization` header or as a `token` parameter.

use super::{ApiJson, AppState};
use crate::error::{AppError, Result};
use crate::ports::documents::{DocumentMetadata, FetchedDocument};
use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct TokenParams {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentFromUrlRequest {
    pub url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub document_id: String,
    pub title: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl From<FetchedDocument> for DocumentResponse {
    fn from(document: FetchedDocument) -> Self {
        Self {
            document_id: document.metadata.document_id.clone(),
            title: document.metadata.title.clone(),
            content: document.content,
            metadata: document.metadata,
        }
    }
}

/// Bearer header first, then the explicit token
fn access_token(headers: &HeaderMap, explicit: Option<String>) -> Result<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    from_header
        .or(explicit.filter(|token| !token.trim().is_empty()))
        .ok_or_else(|| AppError::Unauthorized("Please authenticate with Google first".to_string()))
}

/// Fetch a Google Doc by ID
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
    Query(params): Query<TokenParams>,
) -> Result<Json<DocumentResponse>> {
    let token = access_token(&headers, params.token)?;
    let document = state.documents.fetch_document(&document_id, &token).await?;
    Ok(Json(document.into()))
}

/// Fetch a Google Doc from its share or edit URL
pub async fn get_document_from_url(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<DocumentFromUrlRequest>,
) -> Result<Json<DocumentResponse>> {
    let url = request
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::Validation("URL is required".to_string()))?;

    let document_id = state
        .documents
        .document_id_from_url(&url)
        .ok_or_else(|| AppError::Validation("Invalid Google Docs URL".to_string()))?;

    let token = access_token(&headers, request.token)?;
    let document = state.documents.fetch_document(&document_id, &token).await?;
    Ok(Json(document.into()))
}

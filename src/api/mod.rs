/// HTTP API modules
///
/// Thin axum handlers over the storage port and the extraction pipeline.
pub mod canvas;
pub mod cards;
pub mod google;
pub mod meetings;

use crate::error::AppError;
use crate::extraction::ExtractionService;
use crate::ports::documents::DocumentSourcePort;
use crate::ports::storage::StoragePort;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::sync::Arc;

/// Services shared by every handler
pub struct AppState {
    pub storage: Arc<dyn StoragePort>,
    pub extraction: Arc<ExtractionService>,
    pub documents: Arc<dyn DocumentSourcePort>,
}

/// Page size used when a response embeds every child record
pub(crate) const ALL_ROWS: Option<i64> = Some(i64::MAX);

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(
            "/api/meetings",
            get(meetings::list_meetings).post(meetings::create_meeting),
        )
        .route(
            "/api/meetings/{id}",
            get(meetings::get_meeting)
                .put(meetings::update_meeting)
                .delete(meetings::delete_meeting),
        )
        .route("/api/meetings/{id}/reextract", post(meetings::reextract_cards))
        .route("/api/cards", get(cards::list_cards).post(cards::create_card))
        .route(
            "/api/cards/batch-update-positions",
            post(cards::batch_update_positions),
        )
        .route(
            "/api/cards/{id}",
            get(cards::get_card)
                .put(cards::update_card)
                .delete(cards::delete_card),
        )
        .route(
            "/api/cards/{id}/updates",
            get(cards::get_card_updates).post(cards::add_card_update),
        )
        .route("/api/cards/{id}/segment", post(cards::extract_card_segment))
        .route(
            "/api/canvas",
            get(canvas::list_canvases).post(canvas::create_canvas),
        )
        .route(
            "/api/canvas/{id}",
            get(canvas::get_canvas)
                .put(canvas::update_canvas)
                .delete(canvas::delete_canvas),
        )
        .route(
            "/api/google/document/from-url",
            post(google::get_document_from_url),
        )
        .route(
            "/api/google/document/{document_id}",
            get(google::get_document),
        )
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Scholar Sidekick API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// JSON body extractor whose rejections render as validation errors
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Rejects a blank required string field
pub(crate) fn require_text(field: &str, value: &str) -> crate::error::Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Checks `skip`/`limit` query parameters, returning them as `(limit, offset)`
pub(crate) fn paging(skip: Option<i64>, limit: Option<i64>) -> crate::error::Result<(Option<i64>, Option<i64>)> {
    if skip.is_some_and(|s| s < 0) || limit.is_some_and(|l| l < 0) {
        return Err(AppError::Validation(
            "skip and limit must not be negative".to_string(),
        ));
    }
    Ok((limit, skip))
}

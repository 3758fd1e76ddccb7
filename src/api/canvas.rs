//! Canvas endpoints

use super::{double_option, paging, require_text, ApiJson, AppState, ALL_ROWS};
use crate::domain::models::{Canvas, Card};
use crate::error::{AppError, Result};
use crate::ports::storage::CardFilter;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CreateCanvasRequest {
    pub meeting_id: i64,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCanvasRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCanvasesParams {
    pub meeting_id: Option<i64>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// A canvas with the cards placed on it
#[derive(Debug, Serialize)]
pub struct CanvasDetail {
    #[serde(flatten)]
    pub canvas: Canvas,
    pub cards: Vec<Card>,
}

async fn find_canvas(state: &AppState, id: i64) -> Result<Canvas> {
    state
        .storage
        .get_canvas(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Canvas".to_string()))
}

pub async fn create_canvas(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateCanvasRequest>,
) -> Result<(StatusCode, Json<Canvas>)> {
    require_text("title", &request.title)?;
    if state.storage.get_meeting(request.meeting_id).await?.is_none() {
        return Err(AppError::Validation(format!(
            "Meeting {} does not exist",
            request.meeting_id
        )));
    }

    let mut canvas = Canvas::new(request.meeting_id, request.title, request.description);
    canvas.id = Some(state.storage.create_canvas(&canvas).await?);

    Ok((StatusCode::CREATED, Json(canvas)))
}

pub async fn list_canvases(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListCanvasesParams>,
) -> Result<Json<Vec<Canvas>>> {
    let (limit, offset) = paging(params.skip, params.limit)?;
    let canvases = state
        .storage
        .list_canvases(params.meeting_id, limit, offset)
        .await?;
    Ok(Json(canvases))
}

pub async fn get_canvas(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CanvasDetail>> {
    let canvas = find_canvas(&state, id).await?;
    let cards = state
        .storage
        .list_cards(
            CardFilter {
                meeting_id: None,
                canvas_id: Some(id),
            },
            ALL_ROWS,
            None,
        )
        .await?;
    Ok(Json(CanvasDetail { canvas, cards }))
}

pub async fn update_canvas(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateCanvasRequest>,
) -> Result<Json<Canvas>> {
    let mut canvas = find_canvas(&state, id).await?;

    if let Some(title) = request.title {
        require_text("title", &title)?;
        canvas.title = title;
    }
    if let Some(description) = request.description {
        canvas.description = description;
    }

    canvas.touch();
    state.storage.update_canvas(&canvas).await?;
    Ok(Json(canvas))
}

/// Delete a canvas and its cards
pub async fn delete_canvas(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    find_canvas(&state, id).await?;
    state.storage.delete_canvas(id).await?;
    log::info!("Deleted canvas {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::offline_state;
    use crate::domain::models::{CardType, Meeting};
    use crate::ports::storage::StoragePort;
    use chrono::Utc;

    async fn meeting(storage: &impl StoragePort) -> i64 {
        storage
            .create_meeting(&Meeting::new("m".to_string(), "t".to_string(), Utc::now()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_canvas_with_cards() {
        let (state, storage) = offline_state();
        let meeting_id = meeting(&storage).await;

        let (status, Json(canvas)) = create_canvas(
            State(state.clone()),
            ApiJson(CreateCanvasRequest {
                meeting_id,
                title: "Board".to_string(),
                description: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let canvas_id = canvas.id.unwrap();

        let mut card = Card::new(CardType::Question, "Why?".to_string(), "c".to_string());
        card.canvas_id = Some(canvas_id);
        storage.create_card(&card).await.unwrap();

        let Json(detail) = get_canvas(State(state), Path(canvas_id)).await.unwrap();
        assert_eq!(detail.canvas.title, "Board");
        assert_eq!(detail.cards.len(), 1);

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["meeting_id"], meeting_id);
        assert_eq!(value["cards"][0]["card_type"], "question");
    }

    #[tokio::test]
    async fn test_create_canvas_for_missing_meeting() {
        let (state, _) = offline_state();
        let err = create_canvas(
            State(state),
            ApiJson(CreateCanvasRequest {
                meeting_id: 5,
                title: "Board".to_string(),
                description: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_canvases_by_meeting() {
        let (state, storage) = offline_state();
        let first = meeting(&storage).await;
        let second = meeting(&storage).await;
        for meeting_id in [first, second, second] {
            storage
                .create_canvas(&Canvas::default_for(meeting_id, "m"))
                .await
                .unwrap();
        }

        let Json(canvases) = list_canvases(
            State(state),
            Query(ListCanvasesParams {
                meeting_id: Some(second),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(canvases.len(), 2);
        assert!(canvases.iter().all(|c| c.meeting_id == second));
    }

    #[tokio::test]
    async fn test_update_canvas_clears_description() {
        let (state, storage) = offline_state();
        let meeting_id = meeting(&storage).await;
        let id = storage
            .create_canvas(&Canvas::default_for(meeting_id, "m"))
            .await
            .unwrap();

        let Json(canvas) = update_canvas(
            State(state),
            Path(id),
            ApiJson(UpdateCanvasRequest {
                title: Some("Renamed".to_string()),
                description: Some(None),
            }),
        )
        .await
        .unwrap();
        assert_eq!(canvas.title, "Renamed");
        assert_eq!(canvas.description, None);
    }

    #[tokio::test]
    async fn test_delete_canvas_removes_its_cards() {
        let (state, storage) = offline_state();
        let meeting_id = meeting(&storage).await;
        let canvas_id = storage
            .create_canvas(&Canvas::default_for(meeting_id, "m"))
            .await
            .unwrap();
        let mut card = Card::new(CardType::Todo, "t".to_string(), "c".to_string());
        card.canvas_id = Some(canvas_id);
        storage.create_card(&card).await.unwrap();

        let status = delete_canvas(State(state.clone()), Path(canvas_id)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(storage.card_count(), 0);

        let err = get_canvas(State(state), Path(canvas_id)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

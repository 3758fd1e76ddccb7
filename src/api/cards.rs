//! Card endpoints

use super::{double_option, paging, require_text, ApiJson, AppState};
use crate::domain::models::{Card, CardStatus, CardType, CardUpdate};
use crate::error::{AppError, Result};
use crate::ports::storage::CardFilter;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Request to create a hand-authored card
#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub meeting_id: Option<i64>,
    pub canvas_id: Option<i64>,
    pub card_type: CardType,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub status: CardStatus,
    pub parent_card_id: Option<i64>,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position_x: i64,
    #[serde(default)]
    pub position_y: i64,
    pub tags: Option<Vec<String>>,
}

/// Partial card update; `null` clears nullable fields
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCardRequest {
    pub card_type: Option<CardType>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<CardStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_card_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub position_x: Option<i64>,
    pub position_y: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub tags: Option<Option<Vec<String>>>,
}

/// Request to post an update or ping on a card
#[derive(Debug, Deserialize)]
pub struct CreateCardUpdateRequest {
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub is_ping: bool,
    pub pinged_user: Option<String>,
}

/// New canvas coordinates for one card
#[derive(Debug, Deserialize)]
pub struct PositionUpdate {
    pub id: i64,
    pub position_x: Option<i64>,
    pub position_y: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCardsParams {
    pub meeting_id: Option<i64>,
    pub canvas_id: Option<i64>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// A card with its updates (newest first) and child cards
#[derive(Debug, Serialize)]
pub struct CardDetail {
    #[serde(flatten)]
    pub card: Card,
    pub updates: Vec<CardUpdate>,
    pub child_cards: Vec<Card>,
}

async fn find_card(state: &AppState, id: i64) -> Result<Card> {
    state
        .storage
        .get_card(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Card".to_string()))
}

/// Rejects references to rows that do not exist
async fn check_references(
    state: &AppState,
    meeting_id: Option<i64>,
    canvas_id: Option<i64>,
    parent_card_id: Option<i64>,
) -> Result<()> {
    if let Some(id) = meeting_id {
        if state.storage.get_meeting(id).await?.is_none() {
            return Err(AppError::Validation(format!("Meeting {} does not exist", id)));
        }
    }
    if let Some(id) = canvas_id {
        if state.storage.get_canvas(id).await?.is_none() {
            return Err(AppError::Validation(format!("Canvas {} does not exist", id)));
        }
    }
    if let Some(id) = parent_card_id {
        if state.storage.get_card(id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Parent card {} does not exist",
                id
            )));
        }
    }
    Ok(())
}

/// Rejects a parent that is the card itself or one of its descendants
async fn check_parent(state: &AppState, card_id: i64, parent_id: i64) -> Result<()> {
    check_references(state, None, None, Some(parent_id)).await?;

    let mut seen = HashSet::new();
    let mut ancestor = Some(parent_id);
    while let Some(current) = ancestor {
        if current == card_id {
            return Err(AppError::Validation(format!(
                "Card {} cannot be nested under its own descendant {}",
                card_id, parent_id
            )));
        }
        if !seen.insert(current) {
            break;
        }
        ancestor = state
            .storage
            .get_card(current)
            .await?
            .and_then(|card| card.parent_card_id);
    }
    Ok(())
}

/// Create a card
pub async fn create_card(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateCardRequest>,
) -> Result<(StatusCode, Json<Card>)> {
    require_text("title", &request.title)?;
    require_text("content", &request.content)?;
    check_references(
        &state,
        request.meeting_id,
        request.canvas_id,
        request.parent_card_id,
    )
    .await?;

    let mut card = Card::new(request.card_type, request.title, request.content);
    card.meeting_id = request.meeting_id;
    card.canvas_id = request.canvas_id;
    card.status = request.status;
    card.parent_card_id = request.parent_card_id;
    card.assigned_to = request.assigned_to;
    card.due_date = request.due_date;
    card.position_x = request.position_x;
    card.position_y = request.position_y;
    card.tags = request.tags;

    let id = state.storage.create_card(&card).await?;
    card.id = Some(id);
    log::info!("Created {} card {}", card.card_type, id);

    Ok((StatusCode::CREATED, Json(card)))
}

/// List cards, optionally by meeting and/or canvas
pub async fn list_cards(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListCardsParams>,
) -> Result<Json<Vec<Card>>> {
    let (limit, offset) = paging(params.skip, params.limit)?;
    let filter = CardFilter {
        meeting_id: params.meeting_id,
        canvas_id: params.canvas_id,
    };
    Ok(Json(state.storage.list_cards(filter, limit, offset).await?))
}

/// Get a card with its updates and child cards
pub async fn get_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CardDetail>> {
    let card = find_card(&state, id).await?;
    let updates = state.storage.get_card_updates(id).await?;
    let child_cards = state.storage.get_child_cards(id).await?;

    Ok(Json(CardDetail {
        card,
        updates,
        child_cards,
    }))
}

/// Update a card
pub async fn update_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateCardRequest>,
) -> Result<Json<Card>> {
    let mut card = find_card(&state, id).await?;

    if let Some(Some(parent_id)) = request.parent_card_id {
        if parent_id == id {
            return Err(AppError::Validation(
                "A card cannot be its own parent".to_string(),
            ));
        }
        check_parent(&state, id, parent_id).await?;
    }

    if let Some(card_type) = request.card_type {
        card.card_type = card_type;
    }
    if let Some(title) = request.title {
        require_text("title", &title)?;
        card.title = title;
    }
    if let Some(content) = request.content {
        require_text("content", &content)?;
        card.content = content;
    }
    if let Some(status) = request.status {
        card.status = status;
    }
    if let Some(parent_card_id) = request.parent_card_id {
        card.parent_card_id = parent_card_id;
    }
    if let Some(assigned_to) = request.assigned_to {
        card.assigned_to = assigned_to;
    }
    if let Some(due_date) = request.due_date {
        card.due_date = due_date;
    }
    if let Some(x) = request.position_x {
        card.position_x = x;
    }
    if let Some(y) = request.position_y {
        card.position_y = y;
    }
    if let Some(tags) = request.tags {
        card.tags = tags;
    }

    card.touch();
    state.storage.update_card(&card).await?;
    log::info!("Updated card {}", id);

    Ok(Json(card))
}

/// Delete a card and its updates
pub async fn delete_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    find_card(&state, id).await?;
    state.storage.delete_card(id).await?;
    log::info!("Deleted card {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Post an update or ping on a card
pub async fn add_card_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<CreateCardUpdateRequest>,
) -> Result<(StatusCode, Json<CardUpdate>)> {
    find_card(&state, id).await?;
    require_text("author", &request.author)?;
    require_text("content", &request.content)?;

    let mut update = CardUpdate::new(id, request.author, request.content)
        .with_ping(request.is_ping, request.pinged_user);
    update.id = Some(state.storage.create_card_update(&update).await?);

    if update.is_ping {
        log::info!(
            "{} pinged {} on card {}",
            update.author,
            update.pinged_user.as_deref().unwrap_or("nobody"),
            id
        );
    }

    Ok((StatusCode::CREATED, Json(update)))
}

/// Updates of a card, newest first
pub async fn get_card_updates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<CardUpdate>>> {
    find_card(&state, id).await?;
    Ok(Json(state.storage.get_card_updates(id).await?))
}

/// Move several cards at once; unknown IDs are skipped
pub async fn batch_update_positions(
    State(state): State<Arc<AppState>>,
    ApiJson(updates): ApiJson<Vec<PositionUpdate>>,
) -> Result<Json<Vec<Card>>> {
    let mut moved = Vec::with_capacity(updates.len());

    for update in updates {
        let Some(mut card) = state.storage.get_card(update.id).await? else {
            log::debug!("Skipping position update for unknown card {}", update.id);
            continue;
        };
        card.position_x = update.position_x.unwrap_or(card.position_x);
        card.position_y = update.position_y.unwrap_or(card.position_y);
        card.touch();
        state.storage.update_card(&card).await?;
        moved.push(card);
    }

    Ok(Json(moved))
}

/// Look up the transcript snippet backing a card and store it on the card
pub async fn extract_card_segment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Card>> {
    let mut card = find_card(&state, id).await?;
    let meeting_id = card
        .meeting_id
        .ok_or_else(|| AppError::Validation("Card does not belong to a meeting".to_string()))?;
    let meeting = state
        .storage
        .get_meeting(meeting_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Meeting".to_string()))?;

    match state
        .extraction
        .extract_segment_for_card(&meeting.transcript, &card.content)
        .await
    {
        Some(segment) => {
            card.transcript_segment = Some(segment);
            card.touch();
            state.storage.update_card(&card).await?;
        }
        None => log::info!("No supporting segment found for card {}", id),
    }

    Ok(Json(card))
}

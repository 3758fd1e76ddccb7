//! Meeting endpoints
//!
//! Creating a meeting also creates its default canvas, extracts cards from
//! the transcript and records which agenda items went uncovered.

use super::{double_option, paging, require_text, ApiJson, AppState, ALL_ROWS};
use crate::domain::models::{Canvas, Card, CardCandidate, CardType, Meeting};
use crate::error::{AppError, Result};
use crate::extraction::ExtractionOutcome;
use crate::ports::storage::CardFilter;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request to create a meeting
#[derive(Debug, Deserialize)]
pub struct CreateMeetingRequest {
    pub title: String,
    pub description: Option<String>,
    pub transcript: String,
    pub agenda_items: Option<Vec<String>>,
    pub meeting_date: DateTime<Utc>,
    #[serde(default = "CardType::default_requested")]
    pub requested_card_types: Vec<CardType>,
}

/// Partial meeting update; `null` clears nullable fields
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMeetingRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub transcript: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub agenda_items: Option<Option<Vec<String>>>,
    pub meeting_date: Option<DateTime<Utc>>,
}

/// Request to re-run card extraction on a stored transcript
#[derive(Debug, Default, Deserialize)]
pub struct ReextractRequest {
    #[serde(default)]
    pub requested_card_types: Vec<CardType>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListMeetingsParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// A meeting with its cards and canvases
#[derive(Debug, Serialize)]
pub struct MeetingDetail {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub cards: Vec<Card>,
    pub canvases: Vec<Canvas>,
}

async fn find_meeting(state: &AppState, id: i64) -> Result<Meeting> {
    state
        .storage
        .get_meeting(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Meeting".to_string()))
}

async fn meeting_detail(state: &AppState, meeting: Meeting) -> Result<MeetingDetail> {
    let meeting_id = meeting.id.unwrap_or_default();
    let cards = state
        .storage
        .list_cards(
            CardFilter {
                meeting_id: Some(meeting_id),
                canvas_id: None,
            },
            ALL_ROWS,
            None,
        )
        .await?;
    let canvases = state
        .storage
        .list_canvases(Some(meeting_id), ALL_ROWS, None)
        .await?;

    Ok(MeetingDetail {
        meeting,
        cards,
        canvases,
    })
}

fn cards_from(candidates: Vec<CardCandidate>, meeting_id: i64, canvas_id: i64) -> Vec<Card> {
    candidates
        .into_iter()
        .map(|candidate| Card::from_candidate(candidate, meeting_id, canvas_id))
        .collect()
}

/// An empty selection means the default card types
fn requested_or_default(requested: Vec<CardType>) -> Vec<CardType> {
    if requested.is_empty() {
        CardType::default_requested()
    } else {
        requested
    }
}

/// Creates the default canvas, the generated cards and the agenda coverage
/// of a freshly stored meeting
async fn populate_meeting(
    state: &AppState,
    meeting: &mut Meeting,
    meeting_id: i64,
    requested: &[CardType],
) -> Result<()> {
    let canvas = Canvas::default_for(meeting_id, &meeting.title);
    let canvas_id = state.storage.create_canvas(&canvas).await?;

    let candidates = state
        .extraction
        .extract_cards(&meeting.transcript, meeting.agenda(), requested)
        .await
        .into_items();
    let cards = cards_from(candidates, meeting_id, canvas_id);
    let created = state.storage.create_cards_batch(&cards).await?;
    log::info!(
        "Meeting {} created with {} generated cards",
        meeting_id,
        created.len()
    );

    if !meeting.agenda().is_empty() {
        let coverage = state
            .extraction
            .find_uncovered_agenda_items(meeting.agenda(), &meeting.transcript)
            .await;
        // Unset means the analysis failed, Some(vec![]) means everything was covered
        if let ExtractionOutcome::Extracted(uncovered) = coverage {
            meeting.uncovered_agenda_items = Some(uncovered);
            state.storage.update_meeting(meeting).await?;
        }
    }

    Ok(())
}

/// Create a meeting and populate it from its transcript
///
/// If any later write fails the meeting is deleted again, taking its
/// canvas and cards with it.
pub async fn create_meeting(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateMeetingRequest>,
) -> Result<(StatusCode, Json<MeetingDetail>)> {
    require_text("title", &request.title)?;
    require_text("transcript", &request.transcript)?;

    log::info!("Creating meeting: {}", request.title);

    let requested = requested_or_default(request.requested_card_types);
    let mut meeting = Meeting::new(request.title, request.transcript, request.meeting_date)
        .with_description(request.description)
        .with_agenda_items(request.agenda_items);

    let meeting_id = state.storage.create_meeting(&meeting).await?;
    meeting.id = Some(meeting_id);

    if let Err(e) = populate_meeting(&state, &mut meeting, meeting_id, &requested).await {
        log::error!("Failed to populate meeting {}, removing it: {}", meeting_id, e);
        if let Err(cleanup) = state.storage.delete_meeting(meeting_id).await {
            log::error!("Failed to remove meeting {}: {}", meeting_id, cleanup);
        }
        return Err(e);
    }

    let detail = meeting_detail(&state, meeting).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// List meetings
pub async fn list_meetings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListMeetingsParams>,
) -> Result<Json<Vec<Meeting>>> {
    let (limit, offset) = paging(params.skip, params.limit)?;
    let meetings = state.storage.list_meetings(limit, offset).await?;
    Ok(Json(meetings))
}

/// Get a meeting with its cards and canvases
pub async fn get_meeting(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<MeetingDetail>> {
    let meeting = find_meeting(&state, id).await?;
    Ok(Json(meeting_detail(&state, meeting).await?))
}

/// Drops uncovered items that are no longer on the agenda
fn still_on_agenda(
    uncovered: Option<Vec<String>>,
    agenda: Option<&[String]>,
) -> Option<Vec<String>> {
    let agenda = agenda?;
    uncovered.map(|items| {
        items
            .into_iter()
            .filter(|item| agenda.contains(item))
            .collect()
    })
}

/// Update a meeting
pub async fn update_meeting(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<UpdateMeetingRequest>,
) -> Result<Json<Meeting>> {
    let mut meeting = find_meeting(&state, id).await?;

    if let Some(title) = request.title {
        require_text("title", &title)?;
        meeting.title = title;
    }
    if let Some(description) = request.description {
        meeting.description = description;
    }
    if let Some(transcript) = request.transcript {
        require_text("transcript", &transcript)?;
        meeting.transcript = transcript;
    }
    if let Some(agenda_items) = request.agenda_items {
        meeting.uncovered_agenda_items =
            still_on_agenda(meeting.uncovered_agenda_items.take(), agenda_items.as_deref());
        meeting.agenda_items = agenda_items;
    }
    if let Some(meeting_date) = request.meeting_date {
        meeting.meeting_date = meeting_date;
    }

    meeting.touch();
    state.storage.update_meeting(&meeting).await?;
    log::info!("Updated meeting {}", id);

    Ok(Json(meeting))
}

/// Delete a meeting with its canvases and cards
pub async fn delete_meeting(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    find_meeting(&state, id).await?;
    state.storage.delete_meeting(id).await?;
    log::info!("Deleted meeting {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Replace a meeting's generated cards with a fresh extraction
///
/// Hand-authored cards are kept. When extraction fails the previous
/// generated cards stay in place.
pub async fn reextract_cards(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<ReextractRequest>,
) -> Result<Json<MeetingDetail>> {
    let meeting = find_meeting(&state, id).await?;

    let requested = requested_or_default(request.requested_card_types);

    let canvas_id = match state
        .storage
        .list_canvases(Some(id), Some(1), None)
        .await?
        .into_iter()
        .find_map(|c| c.id)
    {
        Some(canvas_id) => canvas_id,
        None => {
            let canvas = Canvas::default_for(id, &meeting.title);
            state.storage.create_canvas(&canvas).await?
        }
    };

    match state
        .extraction
        .extract_cards(&meeting.transcript, meeting.agenda(), &requested)
        .await
    {
        ExtractionOutcome::Extracted(candidates) => {
            let cards = cards_from(candidates, id, canvas_id);
            let (removed, created) = state.storage.replace_generated_cards(id, &cards).await?;
            log::info!(
                "Re-extracted meeting {}: replaced {} generated cards with {}",
                id,
                removed,
                created.len()
            );
        }
        ExtractionOutcome::Failed(e) => {
            log::warn!("Keeping existing cards for meeting {}: {}", id, e);
        }
    }

    Ok(Json(meeting_detail(&state, meeting).await?))
}

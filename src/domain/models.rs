/// Domain models for Scholar Sidekick
///
/// These models represent core business entities and are storage-agnostic.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of card shown on a canvas.
///
/// The wire label (`as_str`) is the only representation used outside the
/// process: JSON bodies, SQL columns and prompts all go through it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum CardType {
    /// Short summary of the whole meeting
    Tldr,
    Todo,
    Decision,
    Question,
    /// Task with an owner and a deliverable
    ActionItem,
    DiscussionPoint,
    FollowUp,
    Custom,
}

impl CardType {
    pub const ALL: [CardType; 8] = [
        CardType::Tldr,
        CardType::Todo,
        CardType::Decision,
        CardType::Question,
        CardType::ActionItem,
        CardType::DiscussionPoint,
        CardType::FollowUp,
        CardType::Custom,
    ];

    /// Types extracted when a meeting is created without an explicit request
    pub fn default_requested() -> Vec<CardType> {
        vec![CardType::Tldr, CardType::Todo, CardType::ActionItem]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Tldr => "tldr",
            CardType::Todo => "todo",
            CardType::Decision => "decision",
            CardType::Question => "question",
            CardType::ActionItem => "action_item",
            CardType::DiscussionPoint => "discussion_point",
            CardType::FollowUp => "follow_up",
            CardType::Custom => "custom",
        }
    }
}

impl FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CardType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Invalid card type: {}", s))
    }
}

impl TryFrom<String> for CardType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CardType> for String {
    fn from(value: CardType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status of a card
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(try_from = "String", into = "String")]
pub enum CardStatus {
    #[default]
    Draft,
    Active,
    Completed,
    Archived,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Draft => "draft",
            CardStatus::Active => "active",
            CardStatus::Completed => "completed",
            CardStatus::Archived => "archived",
        }
    }
}

impl FromStr for CardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CardStatus::Draft),
            "active" => Ok(CardStatus::Active),
            "completed" => Ok(CardStatus::Completed),
            "archived" => Ok(CardStatus::Archived),
            _ => Err(format!("Invalid card status: {}", s)),
        }
    }
}

impl TryFrom<String> for CardStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CardStatus> for String {
    fn from(value: CardStatus) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for CardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a meeting with its transcript and agenda
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meeting {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub transcript: String,
    pub agenda_items: Option<Vec<String>>,
    /// Agenda items the transcript did not cover, derived by extraction
    pub uncovered_agenda_items: Option<Vec<String>>,
    pub meeting_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    /// Creates a new meeting instance
    pub fn new(title: String, transcript: String, meeting_date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title,
            description: None,
            transcript,
            agenda_items: None,
            uncovered_agenda_items: None,
            meeting_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description (builder pattern)
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets the agenda items (builder pattern)
    pub fn with_agenda_items(mut self, agenda_items: Option<Vec<String>>) -> Self {
        self.agenda_items = agenda_items;
        self
    }

    /// Agenda items as a slice, empty when none were given
    pub fn agenda(&self) -> &[String] {
        self.agenda_items.as_deref().unwrap_or(&[])
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A workspace grouping cards with 2D layout coordinates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Canvas {
    pub id: Option<i64>,
    pub meeting_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Canvas {
    /// Creates a new canvas
    pub fn new(meeting_id: i64, title: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            meeting_id,
            title,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    /// The canvas every meeting gets on creation
    pub fn default_for(meeting_id: i64, meeting_title: &str) -> Self {
        Self::new(
            meeting_id,
            format!("{} - Canvas", meeting_title),
            Some("Main canvas for meeting cards".to_string()),
        )
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A card extracted from a transcript or authored by hand
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub id: Option<i64>,
    pub meeting_id: Option<i64>,
    pub canvas_id: Option<i64>,
    pub card_type: CardType,
    pub title: String,
    pub content: String,
    pub status: CardStatus,
    /// True when the card came out of transcript extraction
    pub is_generated: bool,
    pub transcript_segment: Option<String>,
    pub parent_card_id: Option<i64>,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub position_x: i64,
    pub position_y: i64,
    pub tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Creates a new hand-authored card in draft status
    pub fn new(card_type: CardType, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            meeting_id: None,
            canvas_id: None,
            card_type,
            title,
            content,
            status: CardStatus::Draft,
            is_generated: false,
            transcript_segment: None,
            parent_card_id: None,
            assigned_to: None,
            due_date: None,
            position_x: 0,
            position_y: 0,
            tags: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Converts an extraction candidate into a card placed on a meeting canvas
    pub fn from_candidate(candidate: CardCandidate, meeting_id: i64, canvas_id: i64) -> Self {
        let mut card = Self::new(candidate.category, candidate.title, candidate.body);
        card.meeting_id = Some(meeting_id);
        card.canvas_id = Some(canvas_id);
        card.is_generated = true;
        card.transcript_segment = Some(candidate.quote);
        card.position_x = candidate.position_x;
        card.position_y = candidate.position_y;
        card
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// An update or ping posted on a card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardUpdate {
    pub id: Option<i64>,
    pub card_id: i64,
    pub author: String,
    pub content: String,
    pub is_ping: bool,
    pub pinged_user: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CardUpdate {
    /// Creates a new card update
    pub fn new(card_id: i64, author: String, content: String) -> Self {
        Self {
            id: None,
            card_id,
            author,
            content,
            is_ping: false,
            pinged_user: None,
            created_at: Utc::now(),
        }
    }

    /// Marks the update as a ping for the given user (builder pattern)
    pub fn with_ping(mut self, is_ping: bool, pinged_user: Option<String>) -> Self {
        self.is_ping = is_ping;
        self.pinged_user = pinged_user;
        self
    }
}

/// A card produced by transcript extraction, before it is persisted
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CardCandidate {
    pub category: CardType,
    pub title: String,
    pub body: String,
    /// Supporting quote from the transcript, empty when the model gave none
    pub quote: String,
    pub position_x: i64,
    pub position_y: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_type_labels() {
        for card_type in CardType::ALL {
            assert_eq!(card_type.as_str().parse::<CardType>(), Ok(card_type));
        }
        assert_eq!(CardType::ActionItem.to_string(), "action_item");
        assert!("action-item".parse::<CardType>().is_err());
    }

    #[test]
    fn test_card_type_serde_rejects_unknown_label() {
        let parsed: CardType = serde_json::from_str("\"follow_up\"").unwrap();
        assert_eq!(parsed, CardType::FollowUp);

        let err = serde_json::from_str::<CardType>("\"meeting_notes\"").unwrap_err();
        assert!(err.to_string().contains("Invalid card type"));
    }

    #[test]
    fn test_card_status_default_and_serde() {
        assert_eq!(CardStatus::default(), CardStatus::Draft);
        assert_eq!(
            serde_json::to_string(&CardStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert!(serde_json::from_str::<CardStatus>("\"done\"").is_err());
    }

    #[test]
    fn test_card_from_candidate() {
        let candidate = CardCandidate {
            category: CardType::Decision,
            title: "Use Postgres".to_string(),
            body: "Team agreed to migrate".to_string(),
            quote: "let's just go with postgres".to_string(),
            position_x: 300,
            position_y: 200,
        };

        let card = Card::from_candidate(candidate, 7, 9);
        assert_eq!(card.meeting_id, Some(7));
        assert_eq!(card.canvas_id, Some(9));
        assert!(card.is_generated);
        assert_eq!(card.status, CardStatus::Draft);
        assert_eq!(card.card_type, CardType::Decision);
        assert_eq!(
            card.transcript_segment.as_deref(),
            Some("let's just go with postgres")
        );
        assert_eq!((card.position_x, card.position_y), (300, 200));
    }

    #[test]
    fn test_default_canvas_title() {
        let canvas = Canvas::default_for(3, "Sprint Review");
        assert_eq!(canvas.meeting_id, 3);
        assert_eq!(canvas.title, "Sprint Review - Canvas");
    }

    #[test]
    fn test_meeting_agenda_defaults_to_empty() {
        let meeting = Meeting::new("Standup".to_string(), "hi".to_string(), Utc::now());
        assert!(meeting.agenda().is_empty());

        let meeting = meeting.with_agenda_items(Some(vec!["Budget".to_string()]));
        assert_eq!(meeting.agenda(), ["Budget".to_string()]);
    }
}

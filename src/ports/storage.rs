/// Storage port trait
///
/// Defines the interface for database operations.
/// Implementation: SQLite adapter
///
/// Deleting a meeting removes its canvases and cards, deleting a canvas
/// removes its cards, deleting a card removes its updates and detaches its
/// child cards.
use crate::domain::models::{Canvas, Card, CardUpdate, Meeting};
use crate::error::Result;
use async_trait::async_trait;

/// Default page size for list operations
pub const DEFAULT_LIMIT: i64 = 100;

/// Optional filters for listing cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub meeting_id: Option<i64>,
    pub canvas_id: Option<i64>,
}

/// Port trait for storage operations
#[async_trait]
pub trait StoragePort: Send + Sync {
    // Meeting operations
    /// Create a new meeting
    async fn create_meeting(&self, meeting: &Meeting) -> Result<i64>;

    /// Get a meeting by ID
    async fn get_meeting(&self, id: i64) -> Result<Option<Meeting>>;

    /// List meetings in insertion order
    async fn list_meetings(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Vec<Meeting>>;

    /// Update a meeting
    async fn update_meeting(&self, meeting: &Meeting) -> Result<()>;

    /// Delete a meeting and all related data
    async fn delete_meeting(&self, id: i64) -> Result<()>;

    // Canvas operations
    /// Create a new canvas
    async fn create_canvas(&self, canvas: &Canvas) -> Result<i64>;

    /// Get a canvas by ID
    async fn get_canvas(&self, id: i64) -> Result<Option<Canvas>>;

    /// List canvases, optionally only those of one meeting
    async fn list_canvases(
        &self,
        meeting_id: Option<i64>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Canvas>>;

    /// Update a canvas
    async fn update_canvas(&self, canvas: &Canvas) -> Result<()>;

    /// Delete a canvas and its cards
    async fn delete_canvas(&self, id: i64) -> Result<()>;

    // Card operations
    /// Create a new card
    async fn create_card(&self, card: &Card) -> Result<i64>;

    /// Batch insert cards (used when persisting extracted cards)
    async fn create_cards_batch(&self, cards: &[Card]) -> Result<Vec<i64>>;

    /// Get a card by ID
    async fn get_card(&self, id: i64) -> Result<Option<Card>>;

    /// List cards matching the filter
    async fn list_cards(
        &self,
        filter: CardFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Card>>;

    /// Get the cards whose parent is the given card
    async fn get_child_cards(&self, parent_card_id: i64) -> Result<Vec<Card>>;

    /// Update a card
    async fn update_card(&self, card: &Card) -> Result<()>;

    /// Delete a card and its updates
    async fn delete_card(&self, id: i64) -> Result<()>;

    /// Swap a meeting's extracted cards for new ones, keeping hand-authored ones
    ///
    /// Runs as one unit: on error the previous generated cards are untouched.
    /// Returns the number of cards removed and the IDs of the inserted cards.
    async fn replace_generated_cards(
        &self,
        meeting_id: i64,
        cards: &[Card],
    ) -> Result<(usize, Vec<i64>)>;

    // Card update operations
    /// Create a new card update
    async fn create_card_update(&self, update: &CardUpdate) -> Result<i64>;

    /// Get updates for a card, newest first
    async fn get_card_updates(&self, card_id: i64) -> Result<Vec<CardUpdate>>;
}

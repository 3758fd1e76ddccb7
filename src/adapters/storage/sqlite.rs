/// SQLite storage adapter
///
/// Implements StoragePort for SQLite database operations.
use crate::domain::models::{Canvas, Card, CardStatus, CardType, CardUpdate, Meeting};
use crate::error::{AppError, Result};
use crate::ports::storage::{CardFilter, StoragePort, DEFAULT_LIMIT};
use async_trait::async_trait;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const MEETING_COLUMNS: &str = "id, title, description, transcript, agenda_items, \
     uncovered_agenda_items, meeting_date, created_at, updated_at";

const CANVAS_COLUMNS: &str = "id, meeting_id, title, description, created_at, updated_at";

const CARD_COLUMNS: &str = "id, meeting_id, canvas_id, card_type, title, content, status, \
     is_generated, transcript_segment, parent_card_id, assigned_to, due_date, position_x, \
     position_y, tags, created_at, updated_at";

const CARD_UPDATE_COLUMNS: &str =
    "id, card_id, author, content, is_ping, pinged_user, created_at";

const INSERT_CARD: &str = "INSERT INTO cards (meeting_id, canvas_id, card_type, title, content, \
     status, is_generated, transcript_segment, parent_card_id, assigned_to, due_date, \
     position_x, position_y, tags, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)";

impl ToSql for CardType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CardType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

impl ToSql for CardStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CardStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Serializes an optional string list into a JSON text column
fn json_list(list: &Option<Vec<String>>) -> Result<Option<String>> {
    list.as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(AppError::from)
}

/// Reads a JSON text column back into an optional string list
fn json_list_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Vec<String>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|text| {
        serde_json::from_str(&text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn meeting_from_row(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    Ok(Meeting {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        transcript: row.get(3)?,
        agenda_items: json_list_column(row, 4)?,
        uncovered_agenda_items: json_list_column(row, 5)?,
        meeting_date: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn canvas_from_row(row: &Row<'_>) -> rusqlite::Result<Canvas> {
    Ok(Canvas {
        id: Some(row.get(0)?),
        meeting_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: Some(row.get(0)?),
        meeting_id: row.get(1)?,
        canvas_id: row.get(2)?,
        card_type: row.get(3)?,
        title: row.get(4)?,
        content: row.get(5)?,
        status: row.get(6)?,
        is_generated: row.get(7)?,
        transcript_segment: row.get(8)?,
        parent_card_id: row.get(9)?,
        assigned_to: row.get(10)?,
        due_date: row.get(11)?,
        position_x: row.get(12)?,
        position_y: row.get(13)?,
        tags: json_list_column(row, 14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn card_update_from_row(row: &Row<'_>) -> rusqlite::Result<CardUpdate> {
    Ok(CardUpdate {
        id: Some(row.get(0)?),
        card_id: row.get(1)?,
        author: row.get(2)?,
        content: row.get(3)?,
        is_ping: row.get(4)?,
        pinged_user: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Inserts cards through one prepared statement, returning their new IDs
fn insert_cards(conn: &Connection, cards: &[Card]) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(INSERT_CARD)?;
    let mut ids = Vec::with_capacity(cards.len());

    for card in cards {
        stmt.execute(params![
            card.meeting_id,
            card.canvas_id,
            card.card_type,
            card.title,
            card.content,
            card.status,
            card.is_generated,
            card.transcript_segment,
            card.parent_card_id,
            card.assigned_to,
            card.due_date,
            card.position_x,
            card.position_y,
            json_list(&card.tags)?,
            card.created_at,
            card.updated_at,
        ])?;
        ids.push(conn.last_insert_rowid());
    }

    Ok(ids)
}

/// SQLite storage implementation
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Create a new SQLite storage with the given database path
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(db_path)?)
    }

    /// Create a storage backed by a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Cascading deletes rely on this
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run database migrations
    pub fn run_migrations(&self) -> Result<()> {
        use rusqlite_migration::{Migrations, M};

        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../../migrations/001_initial.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Other("Database connection lock poisoned".to_string()))
    }
}

#[async_trait]
impl StoragePort for SqliteStorage {
    async fn create_meeting(&self, meeting: &Meeting) -> Result<i64> {
        let agenda_items = json_list(&meeting.agenda_items)?;
        let uncovered = json_list(&meeting.uncovered_agenda_items)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO meetings (title, description, transcript, agenda_items,
             uncovered_agenda_items, meeting_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                meeting.title,
                meeting.description,
                meeting.transcript,
                agenda_items,
                uncovered,
                meeting.meeting_date,
                meeting.created_at,
                meeting.updated_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn get_meeting(&self, id: i64) -> Result<Option<Meeting>> {
        let conn = self.conn()?;
        let meeting = conn
            .query_row(
                &format!("SELECT {} FROM meetings WHERE id = ?1", MEETING_COLUMNS),
                params![id],
                meeting_from_row,
            )
            .optional()?;
        Ok(meeting)
    }

    async fn list_meetings(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Vec<Meeting>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM meetings ORDER BY id LIMIT ?1 OFFSET ?2",
            MEETING_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![limit.unwrap_or(DEFAULT_LIMIT), offset.unwrap_or(0)],
            meeting_from_row,
        )?;

        let mut meetings = Vec::new();
        for meeting_result in rows {
            meetings.push(meeting_result?);
        }

        Ok(meetings)
    }

    async fn update_meeting(&self, meeting: &Meeting) -> Result<()> {
        let agenda_items = json_list(&meeting.agenda_items)?;
        let uncovered = json_list(&meeting.uncovered_agenda_items)?;

        let conn = self.conn()?;
        conn.execute(
            "UPDATE meetings SET title = ?1, description = ?2, transcript = ?3,
             agenda_items = ?4, uncovered_agenda_items = ?5, meeting_date = ?6,
             updated_at = ?7 WHERE id = ?8",
            params![
                meeting.title,
                meeting.description,
                meeting.transcript,
                agenda_items,
                uncovered,
                meeting.meeting_date,
                meeting.updated_at,
                meeting.id,
            ],
        )?;
        Ok(())
    }

    async fn delete_meeting(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM meetings WHERE id = ?1", params![id])?;
        Ok(())
    }

    async fn create_canvas(&self, canvas: &Canvas) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO canvases (meeting_id, title, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                canvas.meeting_id,
                canvas.title,
                canvas.description,
                canvas.created_at,
                canvas.updated_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn get_canvas(&self, id: i64) -> Result<Option<Canvas>> {
        let conn = self.conn()?;
        let canvas = conn
            .query_row(
                &format!("SELECT {} FROM canvases WHERE id = ?1", CANVAS_COLUMNS),
                params![id],
                canvas_from_row,
            )
            .optional()?;
        Ok(canvas)
    }

    async fn list_canvases(
        &self,
        meeting_id: Option<i64>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Canvas>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM canvases WHERE (?1 IS NULL OR meeting_id = ?1)
             ORDER BY id LIMIT ?2 OFFSET ?3",
            CANVAS_COLUMNS
        ))?;

        let canvases = stmt
            .query_map(
                params![meeting_id, limit.unwrap_or(DEFAULT_LIMIT), offset.unwrap_or(0)],
                canvas_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(canvases)
    }

    async fn update_canvas(&self, canvas: &Canvas) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE canvases SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![canvas.title, canvas.description, canvas.updated_at, canvas.id],
        )?;
        Ok(())
    }

    async fn delete_canvas(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM canvases WHERE id = ?1", params![id])?;
        Ok(())
    }

    async fn create_card(&self, card: &Card) -> Result<i64> {
        let tags = json_list(&card.tags)?;

        let conn = self.conn()?;
        conn.execute(
            INSERT_CARD,
            params![
                card.meeting_id,
                card.canvas_id,
                card.card_type,
                card.title,
                card.content,
                card.status,
                card.is_generated,
                card.transcript_segment,
                card.parent_card_id,
                card.assigned_to,
                card.due_date,
                card.position_x,
                card.position_y,
                tags,
                card.created_at,
                card.updated_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn create_cards_batch(&self, cards: &[Card]) -> Result<Vec<i64>> {
        let conn = self.conn()?;

        let tx = conn.unchecked_transaction()?;
        let ids = insert_cards(&tx, cards)?;
        tx.commit()?;

        Ok(ids)
    }

    async fn get_card(&self, id: i64) -> Result<Option<Card>> {
        let conn = self.conn()?;
        let card = conn
            .query_row(
                &format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS),
                params![id],
                card_from_row,
            )
            .optional()?;
        Ok(card)
    }

    async fn list_cards(
        &self,
        filter: CardFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Card>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cards
             WHERE (?1 IS NULL OR meeting_id = ?1) AND (?2 IS NULL OR canvas_id = ?2)
             ORDER BY id LIMIT ?3 OFFSET ?4",
            CARD_COLUMNS
        ))?;

        let cards = stmt
            .query_map(
                params![
                    filter.meeting_id,
                    filter.canvas_id,
                    limit.unwrap_or(DEFAULT_LIMIT),
                    offset.unwrap_or(0)
                ],
                card_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(cards)
    }

    async fn get_child_cards(&self, parent_card_id: i64) -> Result<Vec<Card>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cards WHERE parent_card_id = ?1 ORDER BY id",
            CARD_COLUMNS
        ))?;

        let cards = stmt
            .query_map(params![parent_card_id], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(cards)
    }

    async fn update_card(&self, card: &Card) -> Result<()> {
        let tags = json_list(&card.tags)?;

        let conn = self.conn()?;
        conn.execute(
            "UPDATE cards SET meeting_id = ?1, canvas_id = ?2, card_type = ?3, title = ?4,
             content = ?5, status = ?6, transcript_segment = ?7, parent_card_id = ?8,
             assigned_to = ?9, due_date = ?10, position_x = ?11, position_y = ?12,
             tags = ?13, updated_at = ?14 WHERE id = ?15",
            params![
                card.meeting_id,
                card.canvas_id,
                card.card_type,
                card.title,
                card.content,
                card.status,
                card.transcript_segment,
                card.parent_card_id,
                card.assigned_to,
                card.due_date,
                card.position_x,
                card.position_y,
                tags,
                card.updated_at,
                card.id,
            ],
        )?;
        Ok(())
    }

    async fn delete_card(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM cards WHERE id = ?1", params![id])?;
        Ok(())
    }

    async fn replace_generated_cards(
        &self,
        meeting_id: i64,
        cards: &[Card],
    ) -> Result<(usize, Vec<i64>)> {
        let conn = self.conn()?;

        // Dropping the transaction without a commit restores the deleted cards
        let tx = conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM cards WHERE meeting_id = ?1 AND is_generated = 1",
            params![meeting_id],
        )?;
        let ids = insert_cards(&tx, cards)?;
        tx.commit()?;

        Ok((removed, ids))
    }

    async fn create_card_update(&self, update: &CardUpdate) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO card_updates (card_id, author, content, is_ping, pinged_user, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                update.card_id,
                update.author,
                update.content,
                update.is_ping,
                update.pinged_user,
                update.created_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn get_card_updates(&self, card_id: i64) -> Result<Vec<CardUpdate>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM card_updates WHERE card_id = ?1 ORDER BY created_at DESC, id DESC",
            CARD_UPDATE_COLUMNS
        ))?;

        let updates = stmt
            .query_map(params![card_id], card_update_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(updates)
    }
}

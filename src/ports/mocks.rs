//! Mock implementations for testing

use crate::domain::models::{Canvas, Card, CardUpdate, Meeting};
use crate::error::{AppError, Result};
use crate::ports::storage::{CardFilter, StoragePort, DEFAULT_LIMIT};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    meetings: BTreeMap<i64, Meeting>,
    canvases: BTreeMap<i64, Canvas>,
    cards: BTreeMap<i64, Card>,
    card_updates: Vec<CardUpdate>,
    next_id: i64,
    fail_card_inserts: bool,
}

impl MockState {
    fn check_card_inserts(&self) -> Result<()> {
        if self.fail_card_inserts {
            return Err(AppError::Other("card insert failed".to_string()));
        }
        Ok(())
    }

    fn insert_card(&mut self, card: &Card) -> i64 {
        let id = self.next_id();
        let mut c = card.clone();
        c.id = Some(id);
        self.cards.insert(id, c);
        id
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Removes matching cards with their updates and detaches their children
    fn remove_cards(&mut self, doomed: impl Fn(&Card) -> bool) -> usize {
        let ids: HashSet<i64> = self
            .cards
            .iter()
            .filter(|(_, card)| doomed(card))
            .map(|(id, _)| *id)
            .collect();

        self.cards.retain(|id, _| !ids.contains(id));
        self.card_updates.retain(|u| !ids.contains(&u.card_id));
        for card in self.cards.values_mut() {
            if card.parent_card_id.is_some_and(|p| ids.contains(&p)) {
                card.parent_card_id = None;
            }
        }
        ids.len()
    }
}

fn page<T>(items: impl Iterator<Item = T>, limit: Option<i64>, offset: Option<i64>) -> Vec<T> {
    items
        .skip(offset.unwrap_or(0).max(0) as usize)
        .take(limit.unwrap_or(DEFAULT_LIMIT).max(0) as usize)
        .collect()
}

/// Mock storage implementation for testing
#[derive(Clone, Default)]
pub struct MockStorage {
    state: Arc<Mutex<MockState>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn card_count(&self) -> usize {
        self.state.lock().unwrap().cards.len()
    }

    /// Make every later card insert fail without writing anything
    pub fn fail_card_inserts(&self) {
        self.state.lock().unwrap().fail_card_inserts = true;
    }
}

#[async_trait]
impl StoragePort for MockStorage {
    async fn create_meeting(&self, meeting: &Meeting) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let mut m = meeting.clone();
        m.id = Some(id);
        state.meetings.insert(id, m);
        Ok(id)
    }

    async fn get_meeting(&self, id: i64) -> Result<Option<Meeting>> {
        Ok(self.state.lock().unwrap().meetings.get(&id).cloned())
    }

    async fn list_meetings(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Vec<Meeting>> {
        let state = self.state.lock().unwrap();
        Ok(page(state.meetings.values().cloned(), limit, offset))
    }

    async fn update_meeting(&self, meeting: &Meeting) -> Result<()> {
        if let Some(id) = meeting.id {
            self.state.lock().unwrap().meetings.insert(id, meeting.clone());
        }
        Ok(())
    }

    async fn delete_meeting(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let canvas_ids: HashSet<i64> = state
            .canvases
            .values()
            .filter(|c| c.meeting_id == id)
            .filter_map(|c| c.id)
            .collect();
        state.remove_cards(|card| {
            card.meeting_id == Some(id) || card.canvas_id.is_some_and(|c| canvas_ids.contains(&c))
        });
        state.canvases.retain(|_, c| c.meeting_id != id);
        state.meetings.remove(&id);
        Ok(())
    }

    async fn create_canvas(&self, canvas: &Canvas) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let mut c = canvas.clone();
        c.id = Some(id);
        state.canvases.insert(id, c);
        Ok(id)
    }

    async fn get_canvas(&self, id: i64) -> Result<Option<Canvas>> {
        Ok(self.state.lock().unwrap().canvases.get(&id).cloned())
    }

    async fn list_canvases(
        &self,
        meeting_id: Option<i64>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Canvas>> {
        let state = self.state.lock().unwrap();
        let matching = state
            .canvases
            .values()
            .filter(|c| meeting_id.map_or(true, |m| c.meeting_id == m))
            .cloned();
        Ok(page(matching, limit, offset))
    }

    async fn update_canvas(&self, canvas: &Canvas) -> Result<()> {
        if let Some(id) = canvas.id {
            self.state.lock().unwrap().canvases.insert(id, canvas.clone());
        }
        Ok(())
    }

    async fn delete_canvas(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.remove_cards(|card| card.canvas_id == Some(id));
        state.canvases.remove(&id);
        Ok(())
    }

    async fn create_card(&self, card: &Card) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        state.check_card_inserts()?;
        Ok(state.insert_card(card))
    }

    async fn create_cards_batch(&self, cards: &[Card]) -> Result<Vec<i64>> {
        let mut state = self.state.lock().unwrap();
        state.check_card_inserts()?;
        Ok(cards.iter().map(|card| state.insert_card(card)).collect())
    }

    async fn get_card(&self, id: i64) -> Result<Option<Card>> {
        Ok(self.state.lock().unwrap().cards.get(&id).cloned())
    }

    async fn list_cards(
        &self,
        filter: CardFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Card>> {
        let state = self.state.lock().unwrap();
        let matching = state
            .cards
            .values()
            .filter(|c| filter.meeting_id.map_or(true, |m| c.meeting_id == Some(m)))
            .filter(|c| filter.canvas_id.map_or(true, |m| c.canvas_id == Some(m)))
            .cloned();
        Ok(page(matching, limit, offset))
    }

    async fn get_child_cards(&self, parent_card_id: i64) -> Result<Vec<Card>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .cards
            .values()
            .filter(|c| c.parent_card_id == Some(parent_card_id))
            .cloned()
            .collect())
    }

    async fn update_card(&self, card: &Card) -> Result<()> {
        if let Some(id) = card.id {
            self.state.lock().unwrap().cards.insert(id, card.clone());
        }
        Ok(())
    }

    async fn delete_card(&self, id: i64) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .remove_cards(|card| card.id == Some(id));
        Ok(())
    }

    async fn replace_generated_cards(
        &self,
        meeting_id: i64,
        cards: &[Card],
    ) -> Result<(usize, Vec<i64>)> {
        let mut state = self.state.lock().unwrap();
        state.check_card_inserts()?;
        let removed =
            state.remove_cards(|card| card.meeting_id == Some(meeting_id) && card.is_generated);
        let ids = cards.iter().map(|card| state.insert_card(card)).collect();
        Ok((removed, ids))
    }

    async fn create_card_update(&self, update: &CardUpdate) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let mut u = update.clone();
        u.id = Some(id);
        state.card_updates.push(u);
        Ok(id)
    }

    async fn get_card_updates(&self, card_id: i64) -> Result<Vec<CardUpdate>> {
        let mut updates: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .card_updates
            .iter()
            .filter(|u| u.card_id == card_id)
            .cloned()
            .collect();
        updates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(updates)
    }
}

// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::error::StoreError;
use crate::store::SchedulerStore;
use crate::store::Versioned;
use crate::store::check_version;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::card::DeckId;
use crate::types::memory_state::MemoryState;

/// A store that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cards: BTreeMap<CardId, Card>,
    states: BTreeMap<CardId, Versioned<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card together with its default memory state.
    pub fn add_card(&self, card: Card) -> Result<(), StoreError> {
        let mut inner = self.acquire()?;
        let state = MemoryState::new(card.created_at());
        inner
            .states
            .insert(card.id().clone(), Versioned::new(1, state));
        inner.cards.insert(card.id().clone(), card);
        Ok(())
    }

    /// Add a card without a memory state, as if it was never initialised.
    pub fn add_card_without_state(&self, card: Card) -> Result<(), StoreError> {
        let mut inner = self.acquire()?;
        inner.cards.insert(card.id().clone(), card);
        Ok(())
    }

    /// Overwrite a card's state unconditionally, bumping its version.
    pub fn put(&self, card_id: &CardId, state: MemoryState) -> Result<u64, StoreError> {
        let mut inner = self.acquire()?;
        if !inner.cards.contains_key(card_id) {
            return Err(StoreError::UnknownCard(card_id.clone()));
        }
        let version = inner.states.get(card_id).map_or(1, |v| v.version + 1);
        inner
            .states
            .insert(card_id.clone(), Versioned::new(version, state));
        Ok(version)
    }

    /// Remove a card and its state. Returns whether the card existed.
    pub fn delete_card(&self, card_id: &CardId) -> Result<bool, StoreError> {
        let mut inner = self.acquire()?;
        inner.states.remove(card_id);
        Ok(inner.cards.remove(card_id).is_some())
    }

    fn acquire(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl SchedulerStore for MemoryStore {
    async fn load(&self, card_id: &CardId) -> Result<Option<Versioned<MemoryState>>, StoreError> {
        let inner = self.acquire()?;
        Ok(inner.states.get(card_id).cloned())
    }

    async fn save(
        &self,
        card_id: &CardId,
        state: &MemoryState,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.acquire()?;
        if !inner.cards.contains_key(card_id) {
            return Err(StoreError::UnknownCard(card_id.clone()));
        }
        let found = inner.states.get(card_id).map(|v| v.version);
        check_version(card_id, expected_version, found)?;
        let version = found.map_or(1, |v| v + 1);
        inner
            .states
            .insert(card_id.clone(), Versioned::new(version, state.clone()));
        Ok(version)
    }

    async fn load_deck(
        &self,
        deck_id: &DeckId,
    ) -> Result<BTreeMap<CardId, Versioned<MemoryState>>, StoreError> {
        let inner = self.acquire()?;
        let mut deck = BTreeMap::new();
        for card in inner.cards.values().filter(|c| c.deck_id() == deck_id) {
            if let Some(state) = inner.states.get(card.id()) {
                deck.insert(card.id().clone(), state.clone());
            }
        }
        Ok(deck)
    }

    async fn load_cards(&self, deck_id: &DeckId) -> Result<Vec<Card>, StoreError> {
        let inner = self.acquire()?;
        Ok(inner
            .cards
            .values()
            .filter(|c| c.deck_id() == deck_id)
            .cloned()
            .collect())
    }
}

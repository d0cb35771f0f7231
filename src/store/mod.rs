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

//! Persistence of card memory state.
//!
//! The scheduler treats storage as a key-value map from card IDs to memory
//! states, last write wins per key. Every stored state carries a version,
//! and writes name the version they were computed from, so that two devices
//! reviewing the same card cannot silently overwrite each other.

pub mod memory;
pub mod sqlite;

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::card::DeckId;
use crate::types::memory_state::MemoryState;

/// A stored value and the version it was stored at. Versions start at 1
/// and grow by one on every write.
#[derive(Clone, PartialEq, Debug)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }
}

#[allow(async_fn_in_trait)]
pub trait SchedulerStore {
    /// Load a card's memory state. `None` if the card has no stored state.
    async fn load(&self, card_id: &CardId) -> Result<Option<Versioned<MemoryState>>, StoreError>;

    /// Write a card's memory state, returning the new version.
    ///
    /// `expected_version` is the version the state was computed from, or
    /// `None` if the card had no stored state. If the stored version differs
    /// the write fails with `StoreError::Conflict` and nothing changes.
    async fn save(
        &self,
        card_id: &CardId,
        state: &MemoryState,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError>;

    /// Load the memory state of every card in a deck that has one.
    async fn load_deck(
        &self,
        deck_id: &DeckId,
    ) -> Result<BTreeMap<CardId, Versioned<MemoryState>>, StoreError>;

    /// Load the cards in a deck, ordered by ID.
    async fn load_cards(&self, deck_id: &DeckId) -> Result<Vec<Card>, StoreError>;
}

/// Check a versioned write against what is stored.
pub(crate) fn check_version(
    card_id: &CardId,
    expected: Option<u64>,
    found: Option<u64>,
) -> Result<(), StoreError> {
    if expected == found {
        Ok(())
    } else {
        log::warn!("Write conflict on card {card_id}: expected {expected:?}, found {found:?}");
        Err(StoreError::Conflict {
            card_id: card_id.clone(),
            expected,
            found,
        })
    }
}

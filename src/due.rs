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

//! Which cards are due, and when the next one will be.
//!
//! This answers the question a reminder dispatcher asks. It never sends a
//! notification itself.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::SchedulerError;
use crate::store::SchedulerStore;
use crate::store::Versioned;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::card::DeckId;
use crate::types::memory_state::MemoryState;
use crate::types::timestamp::Timestamp;

/// The due card IDs of a deck, oldest due first, ties broken by ID.
///
/// Iterating is lazy over a snapshot of the deck taken when the query ran.
/// Clone the iterator to walk the same snapshot again; query again with a
/// later `now` to pick up newly due cards.
#[derive(Clone, Debug)]
pub struct DueCards {
    schedule: std::vec::IntoIter<(Timestamp, CardId)>,
    now: Timestamp,
}

impl Iterator for DueCards {
    type Item = CardId;

    fn next(&mut self) -> Option<CardId> {
        let now = self.now;
        self.schedule
            .by_ref()
            .find(|(due_at, _)| *due_at <= now)
            .map(|(_, card_id)| card_id)
    }
}

/// What a reminder dispatcher should do for a deck.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Reminder {
    /// Cards are due now.
    DueNow { count: usize },
    /// Nothing is due yet; the next card is due at this instant.
    At { due_at: Timestamp },
    /// The deck has no cards.
    Idle,
}

pub async fn due_cards<S: SchedulerStore>(
    store: &S,
    deck_id: &DeckId,
    now: Timestamp,
) -> Result<DueCards, SchedulerError> {
    let schedule = deck_schedule(store, deck_id).await?;
    let schedule: Vec<(Timestamp, CardId)> = schedule
        .into_iter()
        .map(|(due_at, card)| (due_at, card.id().clone()))
        .collect();
    Ok(DueCards {
        schedule: schedule.into_iter(),
        now,
    })
}

/// The earliest due date in a deck, or `None` if the deck is empty.
pub async fn next_due_at<S: SchedulerStore>(
    store: &S,
    deck_id: &DeckId,
) -> Result<Option<Timestamp>, SchedulerError> {
    let schedule = deck_schedule(store, deck_id).await?;
    Ok(schedule.first().map(|(due_at, _)| *due_at))
}

pub async fn reminder<S: SchedulerStore>(
    store: &S,
    deck_id: &DeckId,
    now: Timestamp,
) -> Result<Reminder, SchedulerError> {
    let schedule = deck_schedule(store, deck_id).await?;
    let count = schedule.iter().filter(|(due_at, _)| *due_at <= now).count();
    let reminder = match schedule.first() {
        None => Reminder::Idle,
        Some(_) if count > 0 => Reminder::DueNow { count },
        Some((due_at, _)) => Reminder::At { due_at: *due_at },
    };
    Ok(reminder)
}

/// Every card in a deck with its due date, sorted by due date then ID.
/// Stored states are validated; a card without one is due from its
/// creation.
pub(crate) async fn deck_schedule<S: SchedulerStore>(
    store: &S,
    deck_id: &DeckId,
) -> Result<Vec<(Timestamp, Card)>, SchedulerError> {
    let cards = store.load_cards(deck_id).await?;
    let states = store.load_deck(deck_id).await?;
    schedule(cards, &states)
}

fn schedule(
    cards: Vec<Card>,
    states: &BTreeMap<CardId, Versioned<MemoryState>>,
) -> Result<Vec<(Timestamp, Card)>, SchedulerError> {
    let mut schedule = Vec::with_capacity(cards.len());
    for card in cards {
        let due_at = match states.get(card.id()) {
            Some(stored) => {
                checked(card.id(), &stored.value)?;
                stored.value.due_at
            }
            None => card.created_at(),
        };
        schedule.push((due_at, card));
    }
    schedule.sort_by(|(a_due, a), (b_due, b)| a_due.cmp(b_due).then_with(|| a.id().cmp(b.id())));
    Ok(schedule)
}

/// Validate a loaded state, attaching the card ID to any violation.
pub(crate) fn checked(card_id: &CardId, state: &MemoryState) -> Result<(), SchedulerError> {
    state
        .validate()
        .map_err(|violation| SchedulerError::InvariantViolation {
            card_id: card_id.clone(),
            violation,
        })
}

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

use serde::Serialize;

use crate::due::checked;
use crate::due::deck_schedule;
use crate::error::SchedulerError;
use crate::policy::Policy;
use crate::store::SchedulerStore;
use crate::types::card::Card;
use crate::types::card::DeckId;
use crate::types::memory_state::MemoryState;
use crate::types::rating::Rating;
use crate::types::review_event::ReviewEvent;
use crate::types::timestamp::Timestamp;

/// One pass through the cards of a deck that were due when it started.
///
/// The queue is fixed at start: cards that become due later wait for the
/// next session. Every rating is written to the store before the session
/// moves on, so dropping a session loses nothing but the unreviewed rest
/// of the queue.
#[derive(Debug)]
pub struct Session {
    deck_id: DeckId,
    queue: Vec<Card>,
    position: usize,
    counts: RatingCounts,
    events: Vec<ReviewEvent>,
    started_at: Timestamp,
    policy: Policy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RatingCounts {
    pub again: usize,
    pub hard: usize,
    pub good: usize,
    pub easy: usize,
}

impl RatingCounts {
    fn record(&mut self, rating: Rating) {
        match rating {
            Rating::Again => self.again += 1,
            Rating::Hard => self.hard += 1,
            Rating::Good => self.good += 1,
            Rating::Easy => self.easy += 1,
        }
    }

    pub fn get(&self, rating: Rating) -> usize {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }

    pub fn total(&self) -> usize {
        self.again + self.hard + self.good + self.easy
    }
}

/// What is left of a session after it ends.
#[derive(Debug)]
pub struct SessionSummary {
    pub deck_id: DeckId,
    pub started_at: Timestamp,
    pub counts: RatingCounts,
    pub events: Vec<ReviewEvent>,
    /// Cards that were due but never rated.
    pub unreviewed: usize,
}

impl Session {
    /// Start a session over the cards of `deck_id` due at `now`.
    pub async fn start<S: SchedulerStore>(
        store: &S,
        deck_id: &DeckId,
        now: Timestamp,
    ) -> Result<Self, SchedulerError> {
        let queue: Vec<Card> = deck_schedule(store, deck_id)
            .await?
            .into_iter()
            .filter(|(due_at, _)| *due_at <= now)
            .map(|(_, card)| card)
            .collect();
        log::debug!("Starting session on deck {deck_id}: {} cards due.", queue.len());
        Ok(Self {
            deck_id: deck_id.clone(),
            queue,
            position: 0,
            counts: RatingCounts::default(),
            events: Vec::new(),
            started_at: now,
            policy: Policy::default(),
        })
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// The card to review next, or `None` once the session is complete.
    pub fn current_card(&self) -> Option<&Card> {
        self.queue.get(self.position)
    }

    /// Rate the current card and move on to the next one.
    ///
    /// The card's state is read from the store right before grading, so a
    /// rating made on another device since the session started is built
    /// upon rather than overwritten. If the write fails, the session stays
    /// on the same card and the call can be repeated.
    pub async fn submit_rating<S: SchedulerStore>(
        &mut self,
        store: &S,
        rating: Rating,
        now: Timestamp,
    ) -> Result<MemoryState, SchedulerError> {
        let card = match self.current_card() {
            Some(card) => card.clone(),
            None => return Err(SchedulerError::SessionAlreadyComplete),
        };
        let (current, expected_version) = match store.load(card.id()).await? {
            Some(stored) => (stored.value, Some(stored.version)),
            None => (MemoryState::new(card.created_at()), None),
        };
        checked(card.id(), &current)?;
        let event = self.policy.review(card.id(), &current, rating, now);
        store
            .save(card.id(), event.resulting(), expected_version)
            .await?;
        let next = event.resulting().clone();
        log::debug!(
            "{} {} I={:.2}d EF={:.2} due={}",
            card.id(),
            rating,
            next.interval_days,
            next.ease_factor,
            next.due_at
        );
        self.position += 1;
        self.counts.record(rating);
        self.events.push(event);
        Ok(next)
    }

    /// End the session. Ratings already submitted stay saved.
    pub fn abandon(self) -> SessionSummary {
        let unreviewed = self.remaining();
        if unreviewed == 0 {
            log::debug!("Session on deck {} completed.", self.deck_id);
        } else {
            log::debug!(
                "Session on deck {} abandoned with {unreviewed} cards left.",
                self.deck_id
            );
        }
        SessionSummary {
            deck_id: self.deck_id,
            started_at: self.started_at,
            counts: self.counts,
            events: self.events,
            unreviewed,
        }
    }

    /// End a session whose queue has been fully reviewed. Fails, leaving
    /// nothing changed, if cards are left.
    pub fn finish(self) -> Result<SessionSummary, SchedulerError> {
        if !self.is_complete() {
            return Err(SchedulerError::SessionIncomplete {
                remaining: self.remaining(),
            });
        }
        Ok(self.abandon())
    }

    pub fn deck_id(&self) -> &DeckId {
        &self.deck_id
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// The number of cards in the queue, reviewed or not.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len() - self.position
    }

    pub fn is_complete(&self) -> bool {
        self.position >= self.queue.len()
    }

    pub fn counts(&self) -> RatingCounts {
        self.counts
    }

    pub fn events(&self) -> &[ReviewEvent] {
        &self.events
    }
}

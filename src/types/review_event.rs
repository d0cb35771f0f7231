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

use serde::Deserialize;
use serde::Serialize;

use crate::types::card::CardId;
use crate::types::memory_state::MemoryState;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

/// A record of one review. Never mutated once created.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    card_id: CardId,
    rating: Rating,
    reviewed_at: Timestamp,
    previous: MemoryState,
    resulting: MemoryState,
}

impl ReviewEvent {
    pub fn new(
        card_id: CardId,
        rating: Rating,
        reviewed_at: Timestamp,
        previous: MemoryState,
        resulting: MemoryState,
    ) -> Self {
        Self {
            card_id,
            rating,
            reviewed_at,
            previous,
            resulting,
        }
    }

    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    pub fn reviewed_at(&self) -> Timestamp {
        self.reviewed_at
    }

    pub fn previous(&self) -> &MemoryState {
        &self.previous
    }

    pub fn resulting(&self) -> &MemoryState {
        &self.resulting
    }

    pub fn into_resulting(self) -> MemoryState {
        self.resulting
    }
}

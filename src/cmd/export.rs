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
use duecards::clock::Clock;
use duecards::error::Fallible;
use duecards::store::sqlite::SessionId;
use duecards::types::card::CardId;
use duecards::types::card::DeckId;
use duecards::types::memory_state::MemoryState;
use duecards::types::review_event::ReviewEvent;
use duecards::types::timestamp::Timestamp;
use serde::Serialize;

use crate::collection::Collection;

pub fn export_collection<C: Clock>(coll: &Collection<C>) -> Fallible<()> {
    let export: Export = get_export(coll)?;
    let json: String = serde_json::to_string_pretty(&export)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export {
    cards: Vec<CardExport>,
    sessions: Vec<SessionExport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CardExport {
    id: CardId,
    deck_id: DeckId,
    front: String,
    back: String,
    created_at: Timestamp,
    memory: Option<MemoryExport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MemoryExport {
    version: u64,
    #[serde(flatten)]
    state: MemoryState,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionExport {
    id: SessionId,
    deck_id: DeckId,
    started_at: Timestamp,
    ended_at: Timestamp,
    reviews: Vec<ReviewEvent>,
}

fn get_export<C: Clock>(coll: &Collection<C>) -> Fallible<Export> {
    let mut states = coll.store.all_states()?;
    let cards: Vec<CardExport> = coll
        .store
        .all_cards()?
        .into_iter()
        .map(|card| CardExport {
            memory: states.remove(card.id()).map(|stored| MemoryExport {
                version: stored.version,
                state: stored.value,
            }),
            id: card.id().clone(),
            deck_id: card.deck_id().clone(),
            front: card.front().to_owned(),
            back: card.back().to_owned(),
            created_at: card.created_at(),
        })
        .collect();
    let sessions: Vec<SessionExport> = coll
        .store
        .sessions()?
        .into_iter()
        .map(|session| SessionExport {
            id: session.session_id,
            deck_id: session.deck_id,
            started_at: session.started_at,
            ended_at: session.ended_at,
            reviews: session.events,
        })
        .collect();
    Ok(Export { cards, sessions })
}

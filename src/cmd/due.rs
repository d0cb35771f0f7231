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
use duecards::due::Reminder;
use duecards::due::due_cards;
use duecards::due::reminder;
use duecards::error::Fallible;
use duecards::types::card::Card;
use duecards::types::card::DeckId;

use crate::collection::Collection;

pub async fn print_due<C: Clock>(coll: &Collection<C>, deck: &str) -> Fallible<()> {
    let cards = list_due(coll, &DeckId::new(deck)).await?;
    if cards.is_empty() {
        println!("No cards due.");
    }
    for card in cards {
        println!("{}\t{}", card.id(), first_line(card.front()));
    }
    Ok(())
}

pub async fn print_next<C: Clock>(coll: &Collection<C>, deck: &str) -> Fallible<()> {
    let reminder = reminder(&coll.store, &DeckId::new(deck), coll.clock.now()).await?;
    println!("{}", describe(&reminder));
    Ok(())
}

async fn list_due<C: Clock>(coll: &Collection<C>, deck_id: &DeckId) -> Fallible<Vec<Card>> {
    let mut cards = Vec::new();
    for card_id in due_cards(&coll.store, deck_id, coll.clock.now()).await? {
        // A card deleted since the schedule was read is skipped.
        if let Some(card) = coll.store.get_card(&card_id)? {
            cards.push(card);
        }
    }
    Ok(cards)
}

fn describe(reminder: &Reminder) -> String {
    match reminder {
        Reminder::DueNow { count: 1 } => "1 card due now.".to_string(),
        Reminder::DueNow { count } => format!("{count} cards due now."),
        Reminder::At { due_at } => format!("Next card due at {due_at}."),
        Reminder::Idle => "Deck is empty.".to_string(),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

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
use std::collections::BTreeSet;
use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use duecards::clock::Clock;
use duecards::error::Fallible;
use duecards::types::card::DeckId;
use duecards::types::memory_state::CardState;
use serde::Serialize;

use crate::collection::Collection;

#[derive(ValueEnum, Clone)]
pub enum StatsFormat {
    /// Plain text output.
    Text,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    card_count: usize,
    deck_count: usize,
    new_count: usize,
    learning_count: usize,
    review_count: usize,
    relearning_count: usize,
    due_now_count: usize,
    today_review_count: usize,
}

pub fn print_stats<C: Clock>(coll: &Collection<C>, format: StatsFormat) -> Fallible<()> {
    let stats = get_stats(coll)?;
    match format {
        StatsFormat::Text => {
            println!("Cards:          {}", stats.card_count);
            println!("Decks:          {}", stats.deck_count);
            println!("New:            {}", stats.new_count);
            println!("Learning:       {}", stats.learning_count);
            println!("Review:         {}", stats.review_count);
            println!("Relearning:     {}", stats.relearning_count);
            println!("Due now:        {}", stats.due_now_count);
            println!("Reviewed today: {}", stats.today_review_count);
        }
        StatsFormat::Json => {
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{}", stats_json);
        }
    }
    Ok(())
}

fn get_stats<C: Clock>(coll: &Collection<C>) -> Fallible<Stats> {
    let now = coll.clock.now();
    let cards = coll.store.all_cards()?;
    let states = coll.store.all_states()?;
    let decks: BTreeSet<&DeckId> = cards.iter().map(|card| card.deck_id()).collect();

    let mut stats = Stats {
        card_count: cards.len(),
        deck_count: decks.len(),
        new_count: 0,
        learning_count: 0,
        review_count: 0,
        relearning_count: 0,
        due_now_count: 0,
        today_review_count: coll.store.review_count_since(now.start_of_local_day())?,
    };
    for card in &cards {
        let Some(stored) = states.get(card.id()) else {
            // No state yet: a new card, due since it was created.
            stats.new_count += 1;
            if card.created_at() <= now {
                stats.due_now_count += 1;
            }
            continue;
        };
        let state = &stored.value;
        match state.state {
            CardState::New => stats.new_count += 1,
            CardState::Learning => stats.learning_count += 1,
            CardState::Review => stats.review_count += 1,
            CardState::Relearning => stats.relearning_count += 1,
        }
        if state.is_due(now) {
            stats.due_now_count += 1;
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use duecards::policy::grade;
    use duecards::store::SchedulerStore;
    use duecards::types::rating::Rating;

    use super::*;
    use crate::cmd::card::add_card;
    use crate::helper::at;
    use crate::helper::create_tmp_collection;

    #[test]
    fn test_empty_stats() -> Fallible<()> {
        let (_dir, coll) = create_tmp_collection(at(1000))?;
        let stats = get_stats(&coll)?;
        assert_eq!(stats.card_count, 0);
        assert_eq!(stats.deck_count, 0);
        assert_eq!(stats.due_now_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_stats() -> Fallible<()> {
        let (_dir, coll) = create_tmp_collection(at(1000))?;
        let a = add_card(&coll, "geo", "Q1", "A1", None)?;
        let b = add_card(&coll, "geo", "Q2", "A2", None)?;
        add_card(&coll, "history", "Q3", "A3", None)?;

        let state = coll.store.load(&a).await?.unwrap().value;
        coll.store
            .save(&a, &grade(&state, Rating::Good, at(1000)), Some(1))
            .await?;
        let state = coll.store.load(&b).await?.unwrap().value;
        coll.store
            .save(&b, &grade(&state, Rating::Again, at(1000)), Some(1))
            .await?;

        let stats = get_stats(&coll)?;
        assert_eq!(stats.card_count, 3);
        assert_eq!(stats.deck_count, 2);
        assert_eq!(stats.new_count, 1);
        assert_eq!(stats.review_count, 1);
        assert_eq!(stats.relearning_count, 1);
        // Only the untouched card; the relapsed one waits out its step.
        assert_eq!(stats.due_now_count, 1);
        assert_eq!(stats.today_review_count, 0);
        Ok(())
    }

    #[test]
    fn test_print_json() -> Fallible<()> {
        let (_dir, coll) = create_tmp_collection(at(1000))?;
        add_card(&coll, "geo", "Q", "A", None)?;
        print_stats(&coll, StatsFormat::Json)
    }

    #[test]
    fn test_json_keys() -> Fallible<()> {
        let (_dir, coll) = create_tmp_collection(at(1000))?;
        let json = serde_json::to_value(get_stats(&coll)?)?;
        assert!(json.get("dueNowCount").is_some());
        assert!(json.get("todayReviewCount").is_some());
        Ok(())
    }
}

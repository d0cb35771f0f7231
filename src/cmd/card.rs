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
use duecards::error::fail;
use duecards::types::card::Card;
use duecards::types::card::CardId;
use duecards::types::card::DeckId;

use crate::collection::Collection;

pub fn add_card<C: Clock>(
    coll: &Collection<C>,
    deck: &str,
    front: &str,
    back: &str,
    id: Option<String>,
) -> Fallible<CardId> {
    if front.trim().is_empty() || back.trim().is_empty() {
        return fail("a card needs both a front and a back.");
    }
    let deck_id = DeckId::new(deck);
    let card_id = match id {
        Some(id) => CardId::new(id),
        None => CardId::derive(&deck_id, front, back),
    };
    if coll.store.get_card(&card_id)?.is_some() {
        return fail(format!("card {card_id} already exists."));
    }
    let card = Card::new(card_id.clone(), deck_id, front, back, coll.clock.now());
    coll.store.add_card(&card)?;
    Ok(card_id)
}

pub fn delete_card<C: Clock>(coll: &Collection<C>, id: &str) -> Fallible<()> {
    let card_id = CardId::new(id);
    if !coll.store.delete_card(&card_id)? {
        return fail(format!("no card with ID {card_id}."));
    }
    Ok(())
}

/// Throw away a card's scheduling history and make it due now.
pub fn reset_card<C: Clock>(coll: &Collection<C>, id: &str) -> Fallible<()> {
    let card_id = CardId::new(id);
    coll.store.reset_card(&card_id, coll.clock.now())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use duecards::store::SchedulerStore;
    use duecards::types::memory_state::MemoryState;

    use super::*;
    use crate::helper::at;
    use crate::helper::create_tmp_collection;

    #[tokio::test]
    async fn test_add_card() -> Fallible<()> {
        let (_dir, coll) = create_tmp_collection(at(1000))?;
        let id = add_card(&coll, "geo", "Capital of France?", "Paris", None)?;
        assert_eq!(id, CardId::derive(&DeckId::new("geo"), "Capital of France?", "Paris"));
        let state = coll.store.load(&id).await?.unwrap();
        assert_eq!(state.value, MemoryState::new(at(1000)));
        Ok(())
    }

    #[test]
    fn test_add_card_with_id() -> Fallible<()> {
        let (_dir, coll) = create_tmp_collection(at(1000))?;
        let id = add_card(&coll, "geo", "Q", "A", Some("c1".to_string()))?;
        assert_eq!(id.as_str(), "c1");
        Ok(())
    }

    #[test]
    fn test_add_duplicate() -> Fallible<()> {
        let (_dir, coll) = create_tmp_collection(at(1000))?;
        add_card(&coll, "geo", "Q", "A", None)?;
        let result = add_card(&coll, "geo", "Q", "A", None);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_add_empty() -> Fallible<()> {
        let (_dir, coll) = create_tmp_collection(at(1000))?;
        assert!(add_card(&coll, "geo", " ", "A", None).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_card() -> Fallible<()> {
        let (_dir, coll) = create_tmp_collection(at(1000))?;
        let id = add_card(&coll, "geo", "Q", "A", None)?;
        delete_card(&coll, id.as_str())?;
        assert!(coll.store.load(&id).await?.is_none());
        assert!(delete_card(&coll, id.as_str()).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_card() -> Fallible<()> {
        let (_dir, coll) = create_tmp_collection(at(1000))?;
        let id = add_card(&coll, "geo", "Q", "A", None)?;
        coll.clock.set(at(5000));
        reset_card(&coll, id.as_str())?;
        let state = coll.store.load(&id).await?.unwrap();
        assert_eq!(state.version, 2);
        assert_eq!(state.value, MemoryState::new(at(5000)));
        assert!(reset_card(&coll, "ghost").is_err());
        Ok(())
    }
}

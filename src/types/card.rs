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

use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::types::timestamp::Timestamp;

/// Number of hex digits kept from a content hash when deriving a card ID.
const DERIVED_ID_LEN: usize = 16;

/// Identifies a card. Unique within its deck, ordered by string comparison.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an ID from the card's content, so that re-adding the same card
    /// to the same deck yields the same ID.
    pub fn derive(deck_id: &DeckId, front: &str, back: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in [deck_id.as_str(), front, back] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        let hex = hasher.finalize().to_hex();
        Self(hex[..DERIVED_ID_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CardId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for CardId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for CardId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Ok(CardId(string))
    }
}

/// Identifies a deck.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckId(String);

impl DeckId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DeckId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for DeckId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for DeckId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Ok(DeckId(string))
    }
}

/// A flashcard. The scheduler never looks at the front or back.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    id: CardId,
    deck_id: DeckId,
    front: String,
    back: String,
    created_at: Timestamp,
}

impl Card {
    pub fn new(
        id: CardId,
        deck_id: DeckId,
        front: impl Into<String>,
        back: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            deck_id,
            front: front.into(),
            back: back.into(),
            created_at,
        }
    }

    pub fn id(&self) -> &CardId {
        &self.id
    }

    pub fn deck_id(&self) -> &DeckId {
        &self.deck_id
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_id_is_stable() {
        let deck = DeckId::new("geography");
        let a = CardId::derive(&deck, "Capital of France?", "Paris");
        let b = CardId::derive(&deck, "Capital of France?", "Paris");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 16);
    }

    #[test]
    fn test_derived_id_depends_on_content() {
        let deck = DeckId::new("geography");
        let a = CardId::derive(&deck, "Capital of France?", "Paris");
        let b = CardId::derive(&deck, "Capital of France?", "Pariz");
        let c = CardId::derive(&DeckId::new("history"), "Capital of France?", "Paris");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_derived_id_separates_fields() {
        let deck = DeckId::new("d");
        let a = CardId::derive(&deck, "ab", "c");
        let b = CardId::derive(&deck, "a", "bc");
        assert_ne!(a, b);
    }

    #[test]
    fn test_card_id_ordering() {
        let mut ids = vec![CardId::new("c3"), CardId::new("c1"), CardId::new("c2")];
        ids.sort();
        assert_eq!(ids, vec![CardId::new("c1"), CardId::new("c2"), CardId::new("c3")]);
    }
}

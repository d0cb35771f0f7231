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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::InvariantViolation;
use crate::types::timestamp::Timestamp;

/// The lowest ease factor a card can have.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// The ease factor of a card that has never been reviewed.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Where a card is in its learning lifecycle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    /// Never reviewed.
    New,
    /// Reviewed, but not yet recalled successfully.
    Learning,
    /// Recalled successfully at least once since the last lapse.
    Review,
    /// Forgotten, and being learned again.
    Relearning,
}

impl CardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }
}

impl TryFrom<&str> for CardState {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "new" => Ok(CardState::New),
            "learning" => Ok(CardState::Learning),
            "review" => Ok(CardState::Review),
            "relearning" => Ok(CardState::Relearning),
            _ => Err(format!("invalid card state: {value}")),
        }
    }
}

impl ToSql for CardState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CardState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        CardState::try_from(string.as_str()).map_err(|e| FromSqlError::Other(e.into()))
    }
}

/// A card's scheduling state.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    /// Days between the last review and the next one.
    pub interval_days: f64,
    /// Multiplier for interval growth.
    pub ease_factor: f64,
    /// Consecutive successful reviews since the last lapse.
    pub repetitions: u32,
    /// Number of times the card was forgotten.
    pub lapses: u32,
    /// When the card is next due.
    pub due_at: Timestamp,
    /// When the card was last reviewed, if ever.
    pub last_reviewed_at: Option<Timestamp>,
    pub state: CardState,
}

impl MemoryState {
    /// The state of a card that has never been reviewed. It is due as soon
    /// as it exists.
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            interval_days: 0.0,
            ease_factor: DEFAULT_EASE_FACTOR,
            repetitions: 0,
            lapses: 0,
            due_at: created_at,
            last_reviewed_at: None,
            state: CardState::New,
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.due_at <= now
    }

    /// Check the state's invariants, returning the first one that fails.
    ///
    /// Corrupted state is reported, never repaired: the caller decides
    /// whether to reset the card or give up.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if !self.interval_days.is_finite() {
            return Err(InvariantViolation::NonFiniteInterval);
        }
        if self.interval_days < 0.0 {
            return Err(InvariantViolation::NegativeInterval(self.interval_days));
        }
        if !self.ease_factor.is_finite() {
            return Err(InvariantViolation::NonFiniteEase);
        }
        if self.ease_factor < MIN_EASE_FACTOR {
            return Err(InvariantViolation::EaseBelowFloor(self.ease_factor));
        }
        match (self.state, self.last_reviewed_at) {
            (CardState::New, None) => {
                if self.repetitions != 0 || self.lapses != 0 || self.interval_days != 0.0 {
                    return Err(InvariantViolation::NewStateReviewed);
                }
            }
            (CardState::New, Some(_)) => {
                return Err(InvariantViolation::NewStateReviewed);
            }
            (_, None) => {
                return Err(InvariantViolation::ReviewedStateMissingTimestamp);
            }
            (_, Some(last_reviewed_at)) => {
                if self.due_at < last_reviewed_at {
                    return Err(InvariantViolation::DueBeforeLastReview);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_seconds(secs).unwrap()
    }

    fn reviewed() -> MemoryState {
        MemoryState {
            interval_days: 6.0,
            ease_factor: 2.5,
            repetitions: 2,
            lapses: 0,
            due_at: at(1000).plus_days(6.0),
            last_reviewed_at: Some(at(1000)),
            state: CardState::Review,
        }
    }

    #[test]
    fn test_default_state() {
        let s = MemoryState::new(at(1000));
        assert_eq!(s.interval_days, 0.0);
        assert_eq!(s.ease_factor, 2.5);
        assert_eq!(s.repetitions, 0);
        assert_eq!(s.lapses, 0);
        assert_eq!(s.due_at, at(1000));
        assert_eq!(s.last_reviewed_at, None);
        assert_eq!(s.state, CardState::New);
        assert!(s.validate().is_ok());
        assert!(s.is_due(at(1000)));
        assert!(!s.is_due(at(999)));
    }

    #[test]
    fn test_valid_reviewed_state() {
        assert!(reviewed().validate().is_ok());
    }

    #[test]
    fn test_negative_interval() {
        let s = MemoryState {
            interval_days: -1.0,
            ..reviewed()
        };
        assert_eq!(s.validate(), Err(InvariantViolation::NegativeInterval(-1.0)));
    }

    #[test]
    fn test_non_finite_values() {
        let s = MemoryState {
            interval_days: f64::INFINITY,
            ..reviewed()
        };
        assert_eq!(s.validate(), Err(InvariantViolation::NonFiniteInterval));
        let s = MemoryState {
            ease_factor: f64::NAN,
            ..reviewed()
        };
        assert_eq!(s.validate(), Err(InvariantViolation::NonFiniteEase));
    }

    #[test]
    fn test_ease_below_floor() {
        let s = MemoryState {
            ease_factor: 1.2,
            ..reviewed()
        };
        assert_eq!(s.validate(), Err(InvariantViolation::EaseBelowFloor(1.2)));
    }

    #[test]
    fn test_due_before_last_review() {
        let s = MemoryState {
            due_at: at(500),
            ..reviewed()
        };
        assert_eq!(s.validate(), Err(InvariantViolation::DueBeforeLastReview));
    }

    #[test]
    fn test_new_state_with_history() {
        let s = MemoryState {
            last_reviewed_at: Some(at(900)),
            ..MemoryState::new(at(1000))
        };
        assert_eq!(s.validate(), Err(InvariantViolation::NewStateReviewed));
        let s = MemoryState {
            repetitions: 3,
            ..MemoryState::new(at(1000))
        };
        assert_eq!(s.validate(), Err(InvariantViolation::NewStateReviewed));
    }

    #[test]
    fn test_reviewed_state_without_timestamp() {
        let s = MemoryState {
            last_reviewed_at: None,
            ..reviewed()
        };
        assert_eq!(
            s.validate(),
            Err(InvariantViolation::ReviewedStateMissingTimestamp)
        );
    }

    #[test]
    fn test_card_state_strings() {
        for state in [
            CardState::New,
            CardState::Learning,
            CardState::Review,
            CardState::Relearning,
        ] {
            assert_eq!(CardState::try_from(state.as_str()), Ok(state));
        }
        assert!(CardState::try_from("graduated").is_err());
    }
}

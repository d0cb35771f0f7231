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

use thiserror::Error;

use crate::types::card::CardId;

/// Errors returned by the scheduling core.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A rating value outside `Again`, `Hard`, `Good` and `Easy`.
    #[error("invalid rating: {0}")]
    InvalidRating(String),

    /// A loaded memory state failed validation.
    #[error("card {card_id} has an invalid memory state: {violation}")]
    InvariantViolation {
        card_id: CardId,
        violation: InvariantViolation,
    },

    /// A rating was submitted to a session with no cards left.
    #[error("the review session is already complete")]
    SessionAlreadyComplete,

    /// A session was finished with cards still left to review.
    #[error("the review session still has {remaining} cards left")]
    SessionIncomplete { remaining: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The first invariant a memory state breaks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("interval is negative ({0} days)")]
    NegativeInterval(f64),

    #[error("interval is not a finite number")]
    NonFiniteInterval,

    #[error("ease factor {0} is below the floor of 1.3")]
    EaseBelowFloor(f64),

    #[error("ease factor is not a finite number")]
    NonFiniteEase,

    #[error("due date is before the last review")]
    DueBeforeLastReview,

    #[error("a new card carries review history")]
    NewStateReviewed,

    #[error("a reviewed card has no last review timestamp")]
    ReviewedStateMissingTimestamp,
}

/// Failures of a scheduler store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Another writer updated the card since it was loaded.
    #[error("write conflict on card {card_id}: expected version {expected:?}, found {found:?}")]
    Conflict {
        card_id: CardId,
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("unknown card: {0}")]
    UnknownCard(CardId),

    #[error("unknown session: {0}")]
    UnknownSession(i64),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The error type used by the command-line interface.
#[derive(Debug)]
pub struct ErrorReport {
    message: String,
}

impl ErrorReport {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl std::error::Error for ErrorReport {}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(msg))
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport::new(format!("I/O error: {value}"))
    }
}

impl From<rusqlite::Error> for ErrorReport {
    fn from(value: rusqlite::Error) -> Self {
        ErrorReport::new(format!("database error: {value}"))
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport::new(format!("JSON error: {value}"))
    }
}

impl From<toml::de::Error> for ErrorReport {
    fn from(value: toml::de::Error) -> Self {
        ErrorReport::new(format!("invalid configuration: {value}"))
    }
}

impl From<SchedulerError> for ErrorReport {
    fn from(value: SchedulerError) -> Self {
        ErrorReport::new(value.to_string())
    }
}

impl From<StoreError> for ErrorReport {
    fn from(value: StoreError) -> Self {
        ErrorReport::new(value.to_string())
    }
}

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
use std::str::FromStr;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::SchedulerError;

/// How well the user recalled a card.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// The position of the rating on a 0 to 3 quality scale.
    pub fn quality(self) -> u8 {
        match self {
            Rating::Again => 0,
            Rating::Hard => 1,
            Rating::Good => 2,
            Rating::Easy => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Button numbering: 1 = Again, 2 = Hard, 3 = Good, 4 = Easy.
impl TryFrom<u8> for Rating {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            _ => Err(SchedulerError::InvalidRating(value.to_string())),
        }
    }
}

impl FromStr for Rating {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" => Ok(Rating::Again),
            "hard" => Ok(Rating::Hard),
            "good" => Ok(Rating::Good),
            "easy" => Ok(Rating::Easy),
            _ => Err(SchedulerError::InvalidRating(s.to_string())),
        }
    }
}

impl ToSql for Rating {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Rating {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Rating::from_str(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_scale() {
        let qualities: Vec<u8> = Rating::ALL.iter().map(|r| r.quality()).collect();
        assert_eq!(qualities, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_from_button_number() {
        assert_eq!(Rating::try_from(1).unwrap(), Rating::Again);
        assert_eq!(Rating::try_from(4).unwrap(), Rating::Easy);
        assert!(matches!(
            Rating::try_from(0),
            Err(SchedulerError::InvalidRating(_))
        ));
        assert!(matches!(
            Rating::try_from(5),
            Err(SchedulerError::InvalidRating(_))
        ));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Good".parse::<Rating>().unwrap(), Rating::Good);
        assert_eq!(" hard ".parse::<Rating>().unwrap(), Rating::Hard);
        let err = "medium".parse::<Rating>().unwrap_err();
        assert_eq!(err.to_string(), "invalid rating: medium");
    }

    #[test]
    fn test_serde_rejects_unknown() {
        assert_eq!(
            serde_json::from_str::<Rating>("\"easy\"").unwrap(),
            Rating::Easy
        );
        assert!(serde_json::from_str::<Rating>("\"perfect\"").is_err());
    }
}

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

use chrono::DateTime;
use chrono::Duration;
use chrono::Local;
use chrono::NaiveTime;
use chrono::SecondsFormat;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// 9999-12-31T23:59:59.999Z, the last instant with a four-digit year.
/// Later instants have no RFC 3339 form.
const LATEST_MILLIS: i64 = 253_402_300_799_999;

/// An instant in UTC.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts)
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// The instant `secs` seconds after the Unix epoch, if representable.
    pub fn from_unix_seconds(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self)
    }

    /// Milliseconds since the Unix epoch, rounded down.
    pub fn unix_millis(self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    /// The end of year 9999.
    pub fn latest() -> Self {
        match DateTime::from_timestamp_millis(LATEST_MILLIS) {
            Some(ts) => Self(ts),
            None => Self(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Add a duration, saturating at [`Timestamp::latest`].
    pub fn plus(self, duration: Duration) -> Self {
        match self.0.checked_add_signed(duration) {
            Some(ts) if ts.timestamp_millis() <= LATEST_MILLIS => Self(ts),
            _ => Self::latest(),
        }
    }

    /// Add a fractional number of days, rounded to the millisecond.
    /// Negative or non-finite inputs add nothing.
    pub fn plus_days(self, days: f64) -> Self {
        if !days.is_finite() || days <= 0.0 {
            return self;
        }
        let millis = (days * MILLIS_PER_DAY).round();
        match Duration::try_milliseconds(millis as i64) {
            Some(duration) => self.plus(duration),
            None => Self::latest(),
        }
    }

    /// Local midnight on the day this instant falls on.
    pub fn start_of_local_day(self) -> Self {
        let local = self.0.with_timezone(&Local);
        let midnight = local
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_local_timezone(Local)
            .earliest();
        match midnight {
            Some(midnight) => Self(midnight.with_timezone(&Utc)),
            None => self,
        }
    }

    pub fn to_rfc3339(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn parse_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        let ts = DateTime::parse_from_rfc3339(s)?;
        Ok(Self(ts.with_timezone(&Utc)))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_rfc3339()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Timestamp::parse_rfc3339(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        Timestamp::parse_rfc3339(&string).map_err(serde::de::Error::custom)
    }
}

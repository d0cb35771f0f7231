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

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::StoreError;
use crate::store::SchedulerStore;
use crate::store::Versioned;
use crate::store::check_version;
use crate::types::card::Card;
use crate::types::card::CardId;
use crate::types::card::DeckId;
use crate::types::memory_state::MemoryState;
use crate::types::review_event::ReviewEvent;
use crate::types::timestamp::Timestamp;

const STATE_COLUMNS: &str = "interval_days, ease_factor, repetitions, lapses, due_at, last_reviewed_at, state, version";

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

/// A review session as stored in the database.
pub struct SessionRecord {
    pub session_id: SessionId,
    pub deck_id: DeckId,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub events: Vec<ReviewEvent>,
}

pub type SessionId = i64;

impl SqliteStore {
    pub fn open(database_path: &str) -> Result<Self, StoreError> {
        log::debug!("Opening database at {database_path}");
        let conn = Connection::open(database_path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self, StoreError> {
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating database schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Add a card together with its default memory state.
    ///
    /// If a card with the given ID exists, returns an error.
    pub fn add_card(&self, card: &Card) -> Result<(), StoreError> {
        log::debug!("Adding card {} to deck {}", card.id(), card.deck_id());
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        tx.execute(
            "insert into cards (card_id, deck_id, front, back, created_at) values (?, ?, ?, ?, ?);",
            (
                card.id(),
                card.deck_id(),
                card.front(),
                card.back(),
                card.created_at(),
            ),
        )?;
        insert_state(&tx, card.id(), &MemoryState::new(card.created_at()), 1)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a card, its memory state and its review history. Returns
    /// whether the card existed.
    pub fn delete_card(&self, card_id: &CardId) -> Result<bool, StoreError> {
        log::debug!("Deleting card {card_id}");
        let conn = self.acquire()?;
        let count = conn.execute("delete from cards where card_id = ?;", [card_id])?;
        Ok(count > 0)
    }

    /// Replace a card's memory state with a fresh one, due at `now`,
    /// regardless of what is stored. Returns the new version.
    pub fn reset_card(&self, card_id: &CardId, now: Timestamp) -> Result<u64, StoreError> {
        log::debug!("Resetting card {card_id}");
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        if !card_exists(&tx, card_id)? {
            return Err(StoreError::UnknownCard(card_id.clone()));
        }
        let found = stored_version(&tx, card_id)?;
        let state = MemoryState::new(now);
        let version = match found {
            Some(v) => {
                update_state(&tx, card_id, &state, v)?;
                v + 1
            }
            None => {
                insert_state(&tx, card_id, &state, 1)?;
                1
            }
        };
        tx.commit()?;
        Ok(version)
    }

    pub fn get_card(&self, card_id: &CardId) -> Result<Option<Card>, StoreError> {
        let conn = self.acquire()?;
        let card = conn
            .query_row(
                "select card_id, deck_id, front, back, created_at from cards where card_id = ?;",
                [card_id],
                read_card,
            )
            .optional()?;
        Ok(card)
    }

    /// Every card in the database, ordered by ID.
    pub fn all_cards(&self) -> Result<Vec<Card>, StoreError> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(
            "select card_id, deck_id, front, back, created_at from cards order by card_id;",
        )?;
        let cards = stmt
            .query_map([], read_card)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    /// Every stored memory state, unvalidated.
    pub fn all_states(&self) -> Result<BTreeMap<CardId, Versioned<MemoryState>>, StoreError> {
        let conn = self.acquire()?;
        let sql = format!("select card_id, {STATE_COLUMNS} from memory_states;");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut states = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let card_id: CardId = row.get(0)?;
            states.insert(card_id, read_state(row, 1)?);
        }
        Ok(states)
    }

    /// Open a session log for a deck. It stays open, with `ended_at`
    /// equal to `started_at`, until [`SqliteStore::close_session`].
    pub fn open_session(
        &self,
        deck_id: &DeckId,
        started_at: Timestamp,
    ) -> Result<SessionId, StoreError> {
        let conn = self.acquire()?;
        let session_id: SessionId = conn.query_row(
            "insert into sessions (deck_id, started_at, ended_at) values (?, ?, ?) returning session_id;",
            (deck_id, started_at, started_at),
            |row| row.get(0),
        )?;
        log::debug!("Opened session {session_id} on deck {deck_id}.");
        Ok(session_id)
    }

    /// Append one review to an open session.
    pub fn append_review(
        &self,
        session_id: SessionId,
        event: &ReviewEvent,
    ) -> Result<(), StoreError> {
        let conn = self.acquire()?;
        conn.execute(
            "insert into review_events (session_id, card_id, rating, reviewed_at, reviewed_at_ms, previous, resulting) values (?, ?, ?, ?, ?, ?, ?);",
            (
                session_id,
                event.card_id(),
                event.rating(),
                event.reviewed_at(),
                event.reviewed_at().unix_millis(),
                serde_json::to_string(event.previous())?,
                serde_json::to_string(event.resulting())?,
            ),
        )?;
        Ok(())
    }

    pub fn close_session(&self, session_id: SessionId, ended_at: Timestamp) -> Result<(), StoreError> {
        let conn = self.acquire()?;
        let count = conn.execute(
            "update sessions set ended_at = ? where session_id = ?;",
            (ended_at, session_id),
        )?;
        if count == 0 {
            return Err(StoreError::UnknownSession(session_id));
        }
        log::debug!("Closed session {session_id}.");
        Ok(())
    }

    /// Every stored session with its reviews, oldest first.
    pub fn sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let conn = self.acquire()?;
        let mut sessions = Vec::new();
        {
            let mut stmt = conn.prepare(
                "select session_id, deck_id, started_at, ended_at from sessions order by session_id;",
            )?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                sessions.push(SessionRecord {
                    session_id: row.get(0)?,
                    deck_id: row.get(1)?,
                    started_at: row.get(2)?,
                    ended_at: row.get(3)?,
                    events: Vec::new(),
                });
            }
        }
        let mut stmt = conn.prepare(
            "select card_id, rating, reviewed_at, previous, resulting from review_events where session_id = ? order by review_id;",
        )?;
        for session in sessions.iter_mut() {
            let mut rows = stmt.query([session.session_id])?;
            while let Some(row) = rows.next()? {
                let previous: String = row.get(3)?;
                let resulting: String = row.get(4)?;
                session.events.push(ReviewEvent::new(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    serde_json::from_str(&previous)?,
                    serde_json::from_str(&resulting)?,
                ));
            }
        }
        Ok(sessions)
    }

    /// The number of reviews made at or after `since`, which is taken to
    /// the millisecond.
    pub fn review_count_since(&self, since: Timestamp) -> Result<usize, StoreError> {
        let conn = self.acquire()?;
        let count: i64 = conn.query_row(
            "select count(*) from review_events where reviewed_at_ms >= ?;",
            [since.unix_millis()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn acquire(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database lock poisoned".to_string()))
    }
}

impl SchedulerStore for SqliteStore {
    async fn load(&self, card_id: &CardId) -> Result<Option<Versioned<MemoryState>>, StoreError> {
        let conn = self.acquire()?;
        let sql = format!("select {STATE_COLUMNS} from memory_states where card_id = ?;");
        let state = conn
            .query_row(&sql, [card_id], |row| read_state(row, 0))
            .optional()?;
        Ok(state)
    }

    async fn save(
        &self,
        card_id: &CardId,
        state: &MemoryState,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        if !card_exists(&tx, card_id)? {
            return Err(StoreError::UnknownCard(card_id.clone()));
        }
        let found = stored_version(&tx, card_id)?;
        check_version(card_id, expected_version, found)?;
        let version = match found {
            Some(v) => {
                update_state(&tx, card_id, state, v)?;
                v + 1
            }
            None => {
                insert_state(&tx, card_id, state, 1)?;
                1
            }
        };
        tx.commit()?;
        Ok(version)
    }

    async fn load_deck(
        &self,
        deck_id: &DeckId,
    ) -> Result<BTreeMap<CardId, Versioned<MemoryState>>, StoreError> {
        let conn = self.acquire()?;
        let sql = format!(
            "select m.card_id, {} from memory_states m join cards c on c.card_id = m.card_id where c.deck_id = ?;",
            prefixed_state_columns("m")
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([deck_id])?;
        let mut deck = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let card_id: CardId = row.get(0)?;
            deck.insert(card_id, read_state(row, 1)?);
        }
        Ok(deck)
    }

    async fn load_cards(&self, deck_id: &DeckId) -> Result<Vec<Card>, StoreError> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(
            "select card_id, deck_id, front, back, created_at from cards where deck_id = ? order by card_id;",
        )?;
        let cards = stmt
            .query_map([deck_id], read_card)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }
}

fn read_card(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card::new(
        row.get(0)?,
        row.get(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, String>(3)?,
        row.get(4)?,
    ))
}

/// Read the state columns starting at `offset`.
fn read_state(row: &Row<'_>, offset: usize) -> rusqlite::Result<Versioned<MemoryState>> {
    let state = MemoryState {
        interval_days: row.get(offset)?,
        ease_factor: row.get(offset + 1)?,
        repetitions: row.get(offset + 2)?,
        lapses: row.get(offset + 3)?,
        due_at: row.get(offset + 4)?,
        last_reviewed_at: row.get(offset + 5)?,
        state: row.get(offset + 6)?,
    };
    let version: i64 = row.get(offset + 7)?;
    Ok(Versioned::new(version as u64, state))
}

fn prefixed_state_columns(prefix: &str) -> String {
    STATE_COLUMNS
        .split(", ")
        .map(|column| format!("{prefix}.{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn card_exists(tx: &Transaction, card_id: &CardId) -> Result<bool, StoreError> {
    let count: i64 = tx.query_row(
        "select count(*) from cards where card_id = ?;",
        [card_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn stored_version(tx: &Transaction, card_id: &CardId) -> Result<Option<u64>, StoreError> {
    let version = tx
        .query_row(
            "select version from memory_states where card_id = ?;",
            [card_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(version.map(|v| v as u64))
}

fn insert_state(
    tx: &Transaction,
    card_id: &CardId,
    state: &MemoryState,
    version: u64,
) -> Result<(), StoreError> {
    let sql = format!("insert into memory_states (card_id, {STATE_COLUMNS}) values (?, ?, ?, ?, ?, ?, ?, ?, ?);");
    tx.execute(
        &sql,
        (
            card_id,
            state.interval_days,
            state.ease_factor,
            state.repetitions,
            state.lapses,
            state.due_at,
            state.last_reviewed_at,
            state.state,
            version as i64,
        ),
    )?;
    Ok(())
}

/// Overwrite a state row, but only if it is still at `version`.
fn update_state(
    tx: &Transaction,
    card_id: &CardId,
    state: &MemoryState,
    version: u64,
) -> Result<(), StoreError> {
    let sql = "update memory_states set interval_days = ?, ease_factor = ?, repetitions = ?, lapses = ?, due_at = ?, last_reviewed_at = ?, state = ?, version = ? where card_id = ? and version = ?;";
    let count = tx.execute(
        sql,
        (
            state.interval_days,
            state.ease_factor,
            state.repetitions,
            state.lapses,
            state.due_at,
            state.last_reviewed_at,
            state.state,
            (version + 1) as i64,
            card_id,
            version as i64,
        ),
    )?;
    if count == 0 {
        return Err(StoreError::Conflict {
            card_id: card_id.clone(),
            expected: Some(version),
            found: None,
        });
    }
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Result<bool, StoreError> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}

// SQLite persistence layer for series snapshots and in-progress drafts.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::draft::{Action, EntityId, HistoryEntry, Team};
use crate::series::{GameRecord, SeriesFormat, SeriesState};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failure modes when reading a saved series back.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("no saved data under key `{key}`")]
    NoSavedData { key: String },

    #[error("saved data under key `{key}` is corrupt: {message}")]
    Corrupt { key: String, message: String },

    #[error("storage failure: {message}")]
    Storage { message: String },
}

impl From<anyhow::Error> for PersistError {
    fn from(e: anyhow::Error) -> Self {
        PersistError::Storage {
            message: format!("{e:#}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Saved series format
// ---------------------------------------------------------------------------

/// On-disk shape of a saved series. The pool is stored for readers of the
/// raw JSON; loading always rebuilds it from the records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedSeries {
    format: SeriesFormat,
    current_game_number: u32,
    game_records: Vec<GameRecord>,
    fearless_pool: Vec<EntityId>,
    saved_at: DateTime<Utc>,
}

impl SavedSeries {
    fn capture(series: &SeriesState) -> Self {
        SavedSeries {
            format: series.format(),
            current_game_number: series.current_game(),
            game_records: series.records().to_vec(),
            fearless_pool: series.fearless_pool().iter().cloned().collect(),
            saved_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// SQLite-backed persistence: a key-value store for JSON state plus a
/// per-draft selection history used for crash recovery.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Key for the id of the draft currently being autosaved.
    const DRAFT_ID_KEY: &'static str = "current_draft_id";

    /// Key for the autosaved series of the running session.
    pub const AUTOSAVE_SERIES_KEY: &'static str = "autosave_series";

    /// Key for the autosaved fearless toggle.
    pub const AUTOSAVE_FEARLESS_KEY: &'static str = "autosave_fearless";

    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS app_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS draft_history (
                draft_id  TEXT NOT NULL,
                cursor    INTEGER NOT NULL,
                entity_id TEXT NOT NULL,
                team      TEXT NOT NULL,
                action    TEXT NOT NULL,
                timestamp TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (draft_id, cursor)
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// A poisoned lock still guards a usable connection; SQLite rolls back
    /// any statement that was interrupted.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Key-value state
    // ------------------------------------------------------------------

    /// Persist an arbitrary JSON value under `key`, replacing any previous
    /// value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load the raw text stored under `key`.
    fn load_raw(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM app_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;
        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query app state")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to read state row")?)),
            None => Ok(None),
        }
    }

    /// Load a previously saved JSON value by `key`. Returns `None` if the
    /// key does not exist.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        match self.load_raw(key)? {
            Some(text) => {
                let value = serde_json::from_str(&text)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Series snapshots
    // ------------------------------------------------------------------

    /// Save `series` under `key`, stamped with the current time.
    pub fn save_series(&self, key: &str, series: &SeriesState) -> Result<()> {
        let saved = SavedSeries::capture(series);
        let value = serde_json::to_value(&saved).context("failed to serialize series")?;
        self.save_state(key, &value)
    }

    /// Load the series saved under `key`.
    ///
    /// The fearless pool is recomputed from the records; a stored pool that
    /// disagrees is logged and ignored.
    pub fn load_series(&self, key: &str) -> Result<SeriesState, PersistError> {
        let text = self.load_raw(key)?.ok_or_else(|| PersistError::NoSavedData {
            key: key.to_string(),
        })?;
        let corrupt = |message: String| PersistError::Corrupt {
            key: key.to_string(),
            message,
        };

        let saved: SavedSeries =
            serde_json::from_str(&text).map_err(|e| corrupt(e.to_string()))?;
        let saved_pool_len = saved.fearless_pool.len();
        let saved_pool: std::collections::BTreeSet<EntityId> =
            saved.fearless_pool.into_iter().collect();

        let series = SeriesState::from_parts(
            saved.format,
            saved.current_game_number,
            saved.game_records,
        )
        .ok_or_else(|| corrupt("records violate the series format".into()))?;

        if &saved_pool != series.fearless_pool() || saved_pool_len != saved_pool.len() {
            warn!(
                "Saved fearless pool under `{}` disagrees with its records; using the records",
                key
            );
        }
        Ok(series)
    }

    /// When the series under `key` was last saved.
    pub fn series_saved_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let Some(value) = self.load_state(key)? else {
            return Ok(None);
        };
        Ok(value
            .get("savedAt")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc)))
    }

    // ------------------------------------------------------------------
    // Draft history
    // ------------------------------------------------------------------

    /// Replace the stored history of `draft_id` with `entries`.
    pub fn save_draft_history(&self, draft_id: &str, entries: &[HistoryEntry]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute(
            "DELETE FROM draft_history WHERE draft_id = ?1",
            params![draft_id],
        )
        .context("failed to clear draft history")?;
        for entry in entries {
            tx.execute(
                "INSERT INTO draft_history (draft_id, cursor, entity_id, team, action)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    draft_id,
                    entry.cursor as i64,
                    entry.entity_id.as_str(),
                    entry.team.display_str(),
                    entry.action.display_str(),
                ],
            )
            .context("failed to record draft history entry")?;
        }
        tx.commit().context("failed to commit draft history")?;
        Ok(())
    }

    /// Load the stored history of `draft_id`, ordered by cursor. Rows whose
    /// side or action cannot be parsed are skipped.
    pub fn load_draft_history(&self, draft_id: &str) -> Result<Vec<HistoryEntry>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT cursor, entity_id, team, action
                 FROM draft_history WHERE draft_id = ?1 ORDER BY cursor",
            )
            .context("failed to prepare load_draft_history query")?;

        let rows = stmt
            .query_map(params![draft_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .context("failed to query draft history")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft history rows")?;

        let mut entries = Vec::with_capacity(rows.len());
        for (cursor, entity_id, team, action) in rows {
            match (
                usize::try_from(cursor).ok(),
                Team::from_str_team(&team),
                Action::from_str_action(&action),
            ) {
                (Some(cursor), Some(team), Some(action)) => entries.push(HistoryEntry {
                    cursor,
                    entity_id: EntityId::new(entity_id),
                    team,
                    action,
                }),
                _ => warn!(
                    "Skipping unreadable history row {} ({} {} {})",
                    cursor, entity_id, team, action
                ),
            }
        }
        Ok(entries)
    }

    // ------------------------------------------------------------------
    // Draft ID management
    // ------------------------------------------------------------------

    /// The id of the draft being autosaved, if any.
    pub fn get_draft_id(&self) -> Result<Option<String>> {
        let value = self.load_state(Self::DRAFT_ID_KEY)?;
        Ok(value.and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    pub fn set_draft_id(&self, draft_id: &str) -> Result<()> {
        self.save_state(
            Self::DRAFT_ID_KEY,
            &serde_json::Value::String(draft_id.to_string()),
        )
    }

    /// A new draft id from the current UTC time, e.g.
    /// `draft_20260228_143022_123`.
    pub fn generate_draft_id() -> String {
        Utc::now().format("draft_%Y%m%d_%H%M%S_%3f").to_string()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

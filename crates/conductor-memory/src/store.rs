use crate::entry::{
    decode_value, encode_value, MemoryEntry, MemoryStats, NewMemory, Session, ValueType,
    KNOWN_CATEGORIES,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use conductor_core::{ConductorError, ConductorResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Persistent key/value storage with expiry and session tracking.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert or overwrite the value under `memory.key`.
    async fn store(&self, memory: NewMemory) -> ConductorResult<()>;

    /// The unexpired entry under `key`.
    async fn retrieve(&self, key: &str) -> ConductorResult<Option<MemoryEntry>>;

    /// Unexpired entries of a category, most recently updated first.
    async fn list(&self, category: &str) -> ConductorResult<Vec<MemoryEntry>>;

    /// Returns whether an entry was removed.
    async fn delete(&self, key: &str) -> ConductorResult<bool>;

    /// Counts and size of the store.
    async fn stats(&self) -> ConductorResult<MemoryStats>;

    /// Remove expired entries and return how many were removed.
    async fn cleanup_expired(&self) -> ConductorResult<usize>;

    /// Create a session, or refresh its context and activity time.
    async fn create_session(&self, session_id: &str, context: Value) -> ConductorResult<()>;

    /// The session with `session_id`.
    async fn session(&self, session_id: &str) -> ConductorResult<Option<Session>>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS memory_storage (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    memory_key TEXT UNIQUE NOT NULL,
    category TEXT NOT NULL,
    value TEXT NOT NULL,
    value_type TEXT NOT NULL DEFAULT 'string',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    expires_at TEXT,
    session_id TEXT,
    metadata TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_memory_category ON memory_storage(category);
CREATE INDEX IF NOT EXISTS idx_memory_session ON memory_storage(session_id);
CREATE INDEX IF NOT EXISTS idx_memory_expires ON memory_storage(expires_at);

CREATE TABLE IF NOT EXISTS session_tracking (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT UNIQUE NOT NULL,
    created_at TEXT NOT NULL,
    last_active TEXT NOT NULL,
    context_data TEXT NOT NULL DEFAULT '{}',
    is_active INTEGER NOT NULL DEFAULT 1
);
"#;

const ENTRY_COLUMNS: &str = "memory_key, category, value, value_type, created_at, updated_at, \
                             expires_at, session_id, metadata";

/// Unexpired rows, with `?1` bound to the current time.
const LIVE: &str = "(expires_at IS NULL OR expires_at > ?1)";

pub(crate) fn db_err(e: rusqlite::Error) -> ConductorError {
    ConductorError::Database(e.to_string())
}

// Fixed-width UTC text, so SQL string comparison orders timestamps.
fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(text: &str) -> ConductorResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ConductorError::Database(format!("Bad timestamp '{text}': {e}")))
}

struct EntryRow {
    key: String,
    category: String,
    value: String,
    value_type: String,
    created_at: String,
    updated_at: String,
    expires_at: Option<String>,
    session_id: Option<String>,
    metadata: String,
}

impl EntryRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get(0)?,
            category: row.get(1)?,
            value: row.get(2)?,
            value_type: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            expires_at: row.get(6)?,
            session_id: row.get(7)?,
            metadata: row.get(8)?,
        })
    }

    fn into_entry(self) -> ConductorResult<MemoryEntry> {
        let value_type: ValueType = self.value_type.parse().map_err(ConductorError::Database)?;
        Ok(MemoryEntry {
            value: decode_value(&self.value, value_type),
            value_type,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
            expires_at: self.expires_at.as_deref().map(parse_ts).transpose()?,
            metadata: serde_json::from_str(&self.metadata)?,
            key: self.key,
            category: self.category,
            session_id: self.session_id,
        })
    }
}

/// [`MemoryStore`] over a single SQLite connection. Queries run on the
/// blocking thread pool.
pub struct SqliteMemoryStore {
    conn: Arc<Mutex<Connection>>,
}

fn join_err(e: tokio::task::JoinError) -> ConductorError {
    ConductorError::Database(format!("Task join error: {e}"))
}

impl SqliteMemoryStore {
    /// Open (or create) the database file, creating parent directories.
    pub async fn open(path: impl AsRef<Path>) -> ConductorResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let db_path = path.clone();
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path).map_err(db_err)?;
            conn.execute_batch(SCHEMA).map_err(db_err)?;
            Ok::<_, ConductorError>(conn)
        })
        .await
        .map_err(join_err)??;
        info!(path = %path.display(), "Memory store opened");
        Ok(Self::from_connection(conn))
    }

    /// A store that lives only as long as the value.
    pub fn in_memory() -> ConductorResult<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against the connection on a blocking thread.
    async fn with_conn<T, F>(&self, f: F) -> ConductorResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> ConductorResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .map_err(join_err)?
    }
}

fn count(conn: &Connection, sql: &str, now: Option<&str>) -> ConductorResult<u64> {
    let n: i64 = match now {
        Some(now) => conn.query_row(sql, params![now], |r| r.get(0)),
        None => conn.query_row(sql, [], |r| r.get(0)),
    }
    .map_err(db_err)?;
    Ok(u64::try_from(n).unwrap_or(0))
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn store(&self, memory: NewMemory) -> ConductorResult<()> {
        if memory.key.is_empty() {
            return Err(ConductorError::Memory("Memory key must not be empty".into()));
        }
        let now = ts(Utc::now());
        let value_type = ValueType::of(&memory.value);
        let memory = self
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO memory_storage
                        (memory_key, category, value, value_type, created_at, updated_at,
                         expires_at, session_id, metadata)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?8)
                     ON CONFLICT(memory_key) DO UPDATE SET
                        category = excluded.category,
                        value = excluded.value,
                        value_type = excluded.value_type,
                        updated_at = excluded.updated_at,
                        expires_at = excluded.expires_at,
                        session_id = excluded.session_id,
                        metadata = excluded.metadata",
                    params![
                        memory.key,
                        memory.category,
                        encode_value(&memory.value),
                        value_type.as_str(),
                        now,
                        memory.expires_at.map(ts),
                        memory.session_id,
                        memory.metadata.to_string(),
                    ],
                )
                .map_err(db_err)?;
                Ok(memory)
            })
            .await?;
        info!(key = %memory.key, category = %memory.category, "Stored memory");
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> ConductorResult<Option<MemoryEntry>> {
        let key = key.to_string();
        let row = self
            .with_conn(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {ENTRY_COLUMNS} FROM memory_storage WHERE {LIVE} AND memory_key = ?2"
                    ),
                    params![ts(Utc::now()), key],
                    EntryRow::read,
                )
                .optional()
                .map_err(db_err)
            })
            .await?;
        row.map(EntryRow::into_entry).transpose()
    }

    async fn list(&self, category: &str) -> ConductorResult<Vec<MemoryEntry>> {
        let category = category.to_string();
        let rows = self
            .with_conn(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {ENTRY_COLUMNS} FROM memory_storage WHERE {LIVE} AND category = ?2
                         ORDER BY updated_at DESC, memory_key ASC"
                    ))
                    .map_err(db_err)?;
                let rows = stmt
                    .query_map(params![ts(Utc::now()), category], EntryRow::read)
                    .map_err(db_err)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(db_err)?;
                Ok(rows)
            })
            .await?;
        rows.into_iter().map(EntryRow::into_entry).collect()
    }

    async fn delete(&self, key: &str) -> ConductorResult<bool> {
        let owned = key.to_string();
        let removed = self
            .with_conn(move |conn| {
                conn.execute("DELETE FROM memory_storage WHERE memory_key = ?1", params![owned])
                    .map_err(db_err)
            })
            .await?;
        if removed > 0 {
            info!(key = %key, "Deleted memory");
        }
        Ok(removed > 0)
    }

    async fn stats(&self) -> ConductorResult<MemoryStats> {
        let now = ts(Utc::now());
        self.with_conn(move |conn| {
            let now = Some(now.as_str());
            let total_entries = count(
                conn,
                &format!("SELECT COUNT(*) FROM memory_storage WHERE {LIVE}"),
                now,
            )?;
            let expired_entries = count(
                conn,
                "SELECT COUNT(*) FROM memory_storage WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                now,
            )?;
            let sessions = count(conn, "SELECT COUNT(*) FROM session_tracking", None)?;
            let database_size_bytes = count(
                conn,
                "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
                None,
            )?;

            let mut stmt = conn
                .prepare(&format!(
                    "SELECT category, COUNT(*) FROM memory_storage WHERE {LIVE} GROUP BY category"
                ))
                .map_err(db_err)?;
            let category_breakdown = stmt
                .query_map(params![now], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))
                .map_err(db_err)?
                .map(|r| r.map(|(c, n)| (c, u64::try_from(n).unwrap_or(0))))
                .collect::<rusqlite::Result<BTreeMap<_, _>>>()
                .map_err(db_err)?;

            Ok(MemoryStats {
                total_entries,
                category_breakdown,
                expired_entries,
                sessions,
                database_size_bytes,
                categories_available: KNOWN_CATEGORIES.iter().map(|c| (*c).to_string()).collect(),
            })
        })
        .await
    }

    async fn cleanup_expired(&self) -> ConductorResult<usize> {
        let removed = self
            .with_conn(|conn| {
                conn.execute(
                    "DELETE FROM memory_storage WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![ts(Utc::now())],
                )
                .map_err(db_err)
            })
            .await?;
        if removed > 0 {
            info!(removed, "Cleaned up expired memory entries");
        } else {
            debug!("No expired memory entries");
        }
        Ok(removed)
    }

    async fn create_session(&self, session_id: &str, context: Value) -> ConductorResult<()> {
        if session_id.is_empty() {
            return Err(ConductorError::Memory("Session id must not be empty".into()));
        }
        let now = ts(Utc::now());
        let owned = session_id.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO session_tracking (session_id, created_at, last_active, context_data, is_active)
                 VALUES (?1, ?2, ?2, ?3, 1)
                 ON CONFLICT(session_id) DO UPDATE SET
                    last_active = excluded.last_active,
                    context_data = excluded.context_data,
                    is_active = 1",
                params![owned, now, context.to_string()],
            )
            .map_err(db_err)
        })
        .await?;
        info!(session = %session_id, "Created/updated session");
        Ok(())
    }

    async fn session(&self, session_id: &str) -> ConductorResult<Option<Session>> {
        let owned = session_id.to_string();
        let row = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT session_id, created_at, last_active, context_data, is_active
                     FROM session_tracking WHERE session_id = ?1",
                    params![owned],
                    |r| {
                        Ok((
                            r.get::<_, String>(0)?,
                            r.get::<_, String>(1)?,
                            r.get::<_, String>(2)?,
                            r.get::<_, String>(3)?,
                            r.get::<_, bool>(4)?,
                        ))
                    },
                )
                .optional()
                .map_err(db_err)
            })
            .await?;

        row.map(|(id, created, active, context, is_active)| {
            Ok(Session {
                session_id: id,
                created_at: parse_ts(&created)?,
                last_active: parse_ts(&active)?,
                context_data: serde_json::from_str(&context)?,
                is_active,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamps_sort_as_text() {
        let early = Utc::now();
        let late = early + chrono::Duration::milliseconds(1500);
        assert!(ts(early) < ts(late));
        assert_eq!(ts(early).len(), ts(late).len());
        assert_eq!(parse_ts(&ts(early)).unwrap().timestamp_millis(), early.timestamp_millis());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_writers_share_one_connection() {
        let store = Arc::new(SqliteMemoryStore::in_memory().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .store(NewMemory::new(format!("k{i}"), json!(i)))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.stats().await.unwrap().total_entries, 8);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let store = SqliteMemoryStore::in_memory().unwrap();
        assert!(store.store(NewMemory::new("", json!(1))).await.is_err());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_created_at() {
        let store = SqliteMemoryStore::in_memory().unwrap();
        store.store(NewMemory::new("k", json!("one"))).await.unwrap();
        let first = store.retrieve("k").await.unwrap().unwrap();
        store
            .store(NewMemory::new("k", json!({"n": 2})).category("dashboard"))
            .await
            .unwrap();
        let second = store.retrieve("k").await.unwrap().unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.value, json!({"n": 2}));
        assert_eq!(second.value_type, ValueType::Json);
        assert_eq!(second.category, "dashboard");
    }
}

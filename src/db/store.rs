//! Shared store: the append-only log every pipeline stage writes to.
//!
//! One SQLite connection behind one mutex. Each operation takes the lock
//! for a single statement and releases it before returning, so callers
//! never hold it across an await point or an outbound call.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};

use super::{open_database, open_memory_database, DatabaseError};
use crate::models::*;

/// Append and full-scan access to the three record kinds.
///
/// Implementations assign the timestamp at write time and never mutate
/// or delete a row once written.
pub trait SharedStore: Send + Sync {
    fn record_metadata(
        &self,
        source: &str,
        classification: &Classification,
    ) -> Result<i64, DatabaseError>;

    fn record_fields(&self, agent: &str, data: &serde_json::Value) -> Result<i64, DatabaseError>;

    fn record_conversation(
        &self,
        conversation_id: &str,
        metadata: &serde_json::Value,
    ) -> Result<i64, DatabaseError>;

    fn metadata(&self) -> Result<Vec<MetadataRecord>, DatabaseError>;

    fn fields(&self) -> Result<Vec<FieldsRecord>, DatabaseError>;

    fn conversations(&self) -> Result<Vec<ConversationRecord>, DatabaseError>;
}

/// File-backed (or in-memory) SQLite implementation of [`SharedStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = open_database(path)?;
        tracing::info!(path = %path.display(), "Shared store opened");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(table: &'static str, value: String) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidTimestamp { table, value })
}

impl SharedStore for SqliteStore {
    fn record_metadata(
        &self,
        source: &str,
        classification: &Classification,
    ) -> Result<i64, DatabaseError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO metadata (source, type, intent, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                source,
                classification.format.as_str(),
                classification.intent.as_str(),
                now_timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn record_fields(&self, agent: &str, data: &serde_json::Value) -> Result<i64, DatabaseError> {
        let payload = serde_json::to_string(data)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO extracted_fields (agent, data, timestamp) VALUES (?1, ?2, ?3)",
            params![agent, payload, now_timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn record_conversation(
        &self,
        conversation_id: &str,
        metadata: &serde_json::Value,
    ) -> Result<i64, DatabaseError> {
        let payload = serde_json::to_string(metadata)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO conversations (conversation_id, metadata, timestamp) VALUES (?1, ?2, ?3)",
            params![conversation_id, payload, now_timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn metadata(&self) -> Result<Vec<MetadataRecord>, DatabaseError> {
        let rows = {
            let conn = self.lock()?;
            let mut stmt =
                conn.prepare("SELECT id, source, type, intent, timestamp FROM metadata ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(MetadataRow {
                        id: row.get(0)?,
                        source: row.get(1)?,
                        format: row.get(2)?,
                        intent: row.get(3)?,
                        timestamp: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        rows.into_iter().map(metadata_from_row).collect()
    }

    fn fields(&self) -> Result<Vec<FieldsRecord>, DatabaseError> {
        let rows = {
            let conn = self.lock()?;
            let mut stmt =
                conn.prepare("SELECT id, agent, data, timestamp FROM extracted_fields ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(PayloadRow {
                        id: row.get(0)?,
                        key: row.get(1)?,
                        payload: row.get(2)?,
                        timestamp: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        rows.into_iter()
            .map(|row| {
                Ok(FieldsRecord {
                    id: row.id,
                    agent: row.key,
                    data: serde_json::from_str(&row.payload)?,
                    timestamp: parse_timestamp("extracted_fields", row.timestamp)?,
                })
            })
            .collect()
    }

    fn conversations(&self) -> Result<Vec<ConversationRecord>, DatabaseError> {
        let rows = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, metadata, timestamp FROM conversations ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(PayloadRow {
                        id: row.get(0)?,
                        key: row.get(1)?,
                        payload: row.get(2)?,
                        timestamp: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        rows.into_iter()
            .map(|row| {
                Ok(ConversationRecord {
                    id: row.id,
                    conversation_id: row.key,
                    metadata: serde_json::from_str(&row.payload)?,
                    timestamp: parse_timestamp("conversations", row.timestamp)?,
                })
            })
            .collect()
    }
}

// Internal row types, converted outside the lock
struct MetadataRow {
    id: i64,
    source: String,
    format: String,
    intent: String,
    timestamp: String,
}

struct PayloadRow {
    id: i64,
    key: String,
    payload: String,
    timestamp: String,
}

fn metadata_from_row(row: MetadataRow) -> Result<MetadataRecord, DatabaseError> {
    Ok(MetadataRecord {
        id: row.id,
        source: row.source,
        format: Format::from_str(&row.format)?,
        intent: Intent::from_str(&row.intent)?,
        timestamp: parse_timestamp("metadata", row.timestamp)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn fields_round_trip_structurally() {
        let store = SqliteStore::open_in_memory().unwrap();
        let payload = json!({
            "id": "123",
            "nested": {"list": [1, 2.5, null, "x"], "flag": true},
            "unicode": "café ✓",
        });
        store.record_fields("JSONAgent", &payload).unwrap();

        let rows = store.fields().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].agent, "JSONAgent");
        assert_eq!(rows[0].data, payload);
    }

    #[test]
    fn metadata_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let before = Utc::now();
        store
            .record_metadata("user_input", &Classification::new(Format::Email, Intent::Rfq))
            .unwrap();

        let rows = store.metadata().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, "user_input");
        assert_eq!(rows[0].format, Format::Email);
        assert_eq!(rows[0].intent, Intent::Rfq);
        assert!(rows[0].timestamp >= before - chrono::Duration::seconds(1));
    }

    #[test]
    fn conversations_append_without_merging() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .record_conversation("abc-1", &json!({"sender": "Alice"}))
            .unwrap();
        store
            .record_conversation("abc-1", &json!({"sender": "Bob"}))
            .unwrap();

        let rows = store.conversations().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.conversation_id == "abc-1"));
        assert_eq!(rows[0].metadata["sender"], "Alice");
        assert_eq!(rows[1].metadata["sender"], "Bob");
    }

    #[test]
    fn ids_are_monotonic_per_table() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.record_fields("a", &json!({})).unwrap();
        let b = store.record_fields("b", &json!({})).unwrap();
        assert!(b > a);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .record_metadata("upload", &Classification::new(Format::Pdf, Intent::Invoice))
                .unwrap();
            store.record_fields("PDFAgent", &json!({"invoice_total": 42.0})).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let meta = store.metadata().unwrap();
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].format, Format::Pdf);
        let fields = store.fields().unwrap();
        assert_eq!(fields[0].data["invoice_total"], 42.0);
    }

    #[test]
    fn concurrent_writers_lose_nothing() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store
                            .record_fields("worker", &json!({"thread": t, "i": i}))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.fields().unwrap().len(), 200);
    }

    #[test]
    fn corrupt_payload_surfaces_error() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO extracted_fields (agent, data, timestamp) VALUES ('x', 'not json', ?1)",
            params![now_timestamp()],
        )
        .unwrap();
        let store = SqliteStore::from_connection(conn);
        assert!(matches!(store.fields(), Err(DatabaseError::Payload(_))));
    }
}

//! SQLite-backed record store.
//!
//! Key-attribute layout: one row per (kind, record_id, attribute). A
//! record exists iff it has at least one attribute row.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::info;

use super::{Record, RecordStore};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS attributes (
    kind TEXT NOT NULL,
    record_id TEXT NOT NULL,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (kind, record_id, name)
);
CREATE INDEX IF NOT EXISTS idx_attributes_kind ON attributes (kind);
";

#[derive(Clone)]
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open record store at {:?}", path))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("failed to create record store schema")?;
        info!("Record store ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // Poisoning only happens if a holder panicked; propagate the panic.
        self.conn.lock().unwrap()
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn list_all(&self, kind: &str) -> Result<Vec<Record>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT record_id, name, value FROM attributes
             WHERE kind = ?1 ORDER BY record_id, name",
        )?;
        let rows = stmt.query_map(params![kind], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut records: Vec<Record> = Vec::new();
        for row in rows {
            let (record_id, name, value) = row?;
            match records.last_mut() {
                Some(last) if last.id == record_id => {
                    last.attrs.insert(name, value);
                }
                _ => {
                    let mut record = Record::new(record_id);
                    record.attrs.insert(name, value);
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    async fn get_by_id(&self, kind: &str, id: &str) -> Result<Option<Record>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT name, value FROM attributes WHERE kind = ?1 AND record_id = ?2",
        )?;
        let rows = stmt.query_map(params![kind, id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut attrs = BTreeMap::new();
        for row in rows {
            let (name, value) = row?;
            attrs.insert(name, value);
        }

        if attrs.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Record {
                id: id.to_string(),
                attrs,
            }))
        }
    }

    async fn create(&self, kind: &str, id: &str, attrs: &BTreeMap<String, String>) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        for (name, value) in attrs {
            tx.execute(
                "INSERT OR REPLACE INTO attributes (kind, record_id, name, value)
                 VALUES (?1, ?2, ?3, ?4)",
                params![kind, id, name, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn update(
        &self,
        kind: &str,
        id: &str,
        patch: &BTreeMap<String, String>,
    ) -> Result<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM attributes WHERE kind = ?1 AND record_id = ?2)",
            params![kind, id],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(false);
        }

        for (name, value) in patch {
            tx.execute(
                "INSERT OR REPLACE INTO attributes (kind, record_id, name, value)
                 VALUES (?1, ?2, ?3, ?4)",
                params![kind, id, name, value],
            )?;
        }
        tx.commit()?;
        Ok(true)
    }

    async fn delete(&self, kind: &str, id: &str) -> Result<bool> {
        let conn = self.lock();
        let removed = conn.execute(
            "DELETE FROM attributes WHERE kind = ?1 AND record_id = ?2",
            params![kind, id],
        )?;
        Ok(removed > 0)
    }
}

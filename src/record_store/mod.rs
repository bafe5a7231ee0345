//! Record Store
//!
//! The data-access collaborator consumed by tool handlers. Records are
//! flat attribute maps keyed by entity kind and id; multi-valued fields
//! (e.g. tags) are stored pre-serialized as opaque strings that handlers
//! parse themselves.

mod sqlite_store;

pub use sqlite_store::SqliteRecordStore;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

/// Entity kind for task records.
pub const KIND_TASK: &str = "task";

/// One stored record: its id plus named attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub attrs: BTreeMap<String, String>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// Storage backend abstraction.
///
/// Absent records are `Ok(None)` / `Ok(false)`, not errors: "not found" is
/// a first-class domain outcome. Individual operations are atomic per
/// record; nothing here coordinates across records or requests.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records of a kind.
    async fn list_all(&self, kind: &str) -> Result<Vec<Record>>;

    /// One record by id, if present.
    async fn get_by_id(&self, kind: &str, id: &str) -> Result<Option<Record>>;

    /// Create a record with the given attributes.
    async fn create(&self, kind: &str, id: &str, attrs: &BTreeMap<String, String>) -> Result<()>;

    /// Upsert the given attributes on an existing record. Returns false
    /// when no such record exists (nothing written).
    async fn update(&self, kind: &str, id: &str, patch: &BTreeMap<String, String>)
        -> Result<bool>;

    /// Delete a record. Returns false when no such record exists.
    async fn delete(&self, kind: &str, id: &str) -> Result<bool>;
}

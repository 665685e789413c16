mod books;
mod commits;
mod memory;
pub mod paragraphs;
mod schema;
mod sqlite;

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub use books::{BookLookup, ExistingBook, StoreBookLookup};
pub use commits::{insert as insert_commit, latest as latest_commit, list as list_commits};
pub use memory::MemoryStore;
pub use paragraphs::ParagraphError;
pub use schema::create_tables;
pub use sqlite::SqliteStore;

/// Properties of one stored document, a JSON object.
pub type PropertySet = serde_json::Map<String, serde_json::Value>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid document {id}: {reason}")]
    InvalidDocument { id: String, reason: String },
}

/// Half-open key interval `[start, end)` in byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub start: String,
    pub end: String,
}

impl KeyRange {
    /// Every key beginning with `prefix`.
    pub fn prefix(prefix: &str) -> Self {
        KeyRange {
            start: prefix.to_string(),
            end: format!("{}\u{10FFFF}", prefix),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        key >= self.start.as_str() && key < self.end.as_str()
    }
}

/// Key/value document store the history is written to. Documents are
/// addressed by composite string keys and queried by key range.
pub trait DocumentStore {
    fn get(&self, id: &str) -> Result<Option<PropertySet>, StoreError>;

    fn put(&self, id: &str, properties: PropertySet) -> Result<(), StoreError>;

    /// Documents whose key falls in `range`, ordered by key.
    fn query(&self, range: &KeyRange) -> Result<Vec<(String, PropertySet)>, StoreError>;

    /// Runs `f` atomically: either every write it made is kept or none is.
    fn transaction(
        &self,
        f: &mut dyn FnMut(&dyn DocumentStore) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;
}

pub fn to_properties<T: Serialize>(id: &str, value: &T) -> Result<PropertySet, StoreError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(StoreError::InvalidDocument {
            id: id.to_string(),
            reason: "not a JSON object".to_string(),
        }),
    }
}

pub fn from_properties<T: DeserializeOwned>(id: &str, properties: PropertySet) -> Result<T, StoreError> {
    serde_json::from_value(serde_json::Value::Object(properties)).map_err(|e| {
        StoreError::InvalidDocument {
            id: id.to_string(),
            reason: e.to_string(),
        }
    })
}

// Convert ParagraphError to EditorError
impl From<ParagraphError> for crate::EditorError {
    fn from(err: ParagraphError) -> Self {
        match err {
            ParagraphError::NotFound(id) => crate::EditorError::DocumentNotFound(id),
            ParagraphError::Store(e) => crate::EditorError::Store(e),
        }
    }
}

/// Opens a connection to the SQLite database
///
/// Enables WAL mode for better concurrency and performance
pub fn open_connection(path: &Path) -> rusqlite::Result<Connection> {
    info!("Opening database connection: {:?}", path);

    let conn = Connection::open(path)?;

    // journal_mode returns a value, so it has to go through query_row
    let _journal_mode = conn.query_row("PRAGMA journal_mode = WAL", [], |row| {
        row.get::<_, String>(0)
    })?;

    conn.busy_timeout(std::time::Duration::from_secs(5))?;

    info!("Database connection opened successfully");
    Ok(conn)
}

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use super::{create_tables, open_connection, DocumentStore, KeyRange, PropertySet, StoreError};

/// `DocumentStore` over one SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_connection(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        create_tables(&conn)?;
        Ok(SqliteStore { conn })
    }

    fn decode(id: &str, raw: &str) -> Result<PropertySet, StoreError> {
        match serde_json::from_str(raw)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(StoreError::InvalidDocument {
                id: id.to_string(),
                reason: "stored properties are not an object".to_string(),
            }),
        }
    }
}

impl DocumentStore for SqliteStore {
    fn get(&self, id: &str) -> Result<Option<PropertySet>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT properties FROM documents WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| Self::decode(id, &raw)).transpose()
    }

    fn put(&self, id: &str, properties: PropertySet) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&properties)?;
        self.conn.execute(
            "INSERT INTO documents (id, properties) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                properties = excluded.properties,
                updated_at = datetime('now')",
            params![id, raw],
        )?;
        Ok(())
    }

    fn query(&self, range: &KeyRange) -> Result<Vec<(String, PropertySet)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, properties FROM documents
             WHERE id >= ?1 AND id < ?2
             ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![range.start, range.end], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, raw)| {
                let properties = Self::decode(&id, &raw)?;
                Ok((id, properties))
            })
            .collect()
    }

    fn transaction(
        &self,
        f: &mut dyn FnMut(&dyn DocumentStore) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        // Dropping `tx` without commit rolls back.
        f(self)?;
        tx.commit()?;
        debug!("Committed store transaction");
        Ok(())
    }
}

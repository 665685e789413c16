use rusqlite::{Connection, Result};
use tracing::info;

/// Creates the document table and its indexes
///
/// Every record (paragraph versions, successor links, conflict markers,
/// commits) lives in `documents` under a composite key; range queries
/// over `id` replace secondary tables.
pub fn create_tables(conn: &Connection) -> Result<()> {
    info!("Creating database schema");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY NOT NULL,
            properties TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        ) WITHOUT ROWID",
        [],
    )?;

    info!("Database schema created successfully");
    Ok(())
}

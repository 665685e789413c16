use std::path::PathBuf;

use tempfile::TempDir;
use usx_editor::database::SqliteStore;
use usx_editor::models::BookKey;

pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn read_data(name: &str) -> String {
    std::fs::read_to_string(data_path(name)).unwrap()
}

/// Database file in a fresh temporary directory. Keep the `TempDir` alive
/// for as long as the database is used.
pub fn temp_database() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("editor.db");
    (dir, path)
}

#[allow(dead_code)]
pub fn open_store(path: &PathBuf) -> SqliteStore {
    SqliteStore::open(path).unwrap()
}

#[allow(dead_code)]
pub fn ruth_key() -> BookKey {
    BookKey::new("en", "RUT", "draft")
}

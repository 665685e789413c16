use tracing::info;

use super::{from_properties, to_properties, DocumentStore, KeyRange, StoreError};
use crate::models::{BookKey, Commit};

/// Percent-encodes the characters that delimit key components.
fn escape(component: &str) -> String {
    let mut escaped = String::with_capacity(component.len());
    for ch in component.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            ':' => escaped.push_str("%3A"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn commit_prefix(book: &BookKey) -> String {
    format!(
        "commit:{}/{}/{}:",
        escape(&book.language_id),
        escape(&book.code),
        escape(&book.identifier)
    )
}

/// Appends a commit for its book. Commit keys carry a zero-padded sequence
/// number so key order is commit order.
pub fn insert(store: &dyn DocumentStore, commit: &Commit) -> Result<String, StoreError> {
    let prefix = commit_prefix(&commit.book);
    let sequence = store.query(&KeyRange::prefix(&prefix))?.len() + 1;
    let key = format!("{}{:010}", prefix, sequence);

    store.put(&key, to_properties(&key, commit)?)?;
    info!(
        "Recorded commit {} for {} ({} paragraphs)",
        sequence,
        commit.book,
        commit.version_ids().count()
    );
    Ok(key)
}

/// Every commit of `book`, oldest first.
pub fn list(store: &dyn DocumentStore, book: &BookKey) -> Result<Vec<Commit>, StoreError> {
    store
        .query(&KeyRange::prefix(&commit_prefix(book)))?
        .into_iter()
        .map(|(key, properties)| from_properties(&key, properties))
        .collect()
}

pub fn latest(store: &dyn DocumentStore, book: &BookKey) -> Result<Option<Commit>, StoreError> {
    match store.query(&KeyRange::prefix(&commit_prefix(book)))?.pop() {
        Some((key, properties)) => from_properties(&key, properties).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[test]
    fn test_latest_commit_wins() {
        let store = MemoryStore::new();
        let key = BookKey::new("en", "RUT", "draft");
        assert!(latest(&store, &key).unwrap().is_none());

        let first = Commit::new(key.clone(), "Ruth");
        let mut second = Commit::new(key.clone(), "Ruth");
        second.introduction.push("v1".to_string());

        insert(&store, &first).unwrap();
        let stored_key = insert(&store, &second).unwrap();

        assert!(stored_key.ends_with(":0000000002"));
        assert_eq!(latest(&store, &key).unwrap(), Some(second));
        assert_eq!(list(&store, &key).unwrap().len(), 2);
    }

    #[test]
    fn test_commits_are_kept_per_book() {
        let store = MemoryStore::new();
        let web = BookKey::new("en", "RUT", "web");
        let web2 = BookKey::new("en", "RUT", "web2");
        insert(&store, &Commit::new(web2.clone(), "Ruth")).unwrap();

        assert!(latest(&store, &web).unwrap().is_none());
        assert!(latest(&store, &web2).unwrap().is_some());
    }

    #[test]
    fn test_separators_in_identifier_do_not_leak_between_books() {
        let store = MemoryStore::new();
        let web = BookKey::new("en", "RUT", "web");
        insert(&store, &Commit::new(web.clone(), "Ruth")).unwrap();
        for identifier in ["web:2", "web/x", "web%3A2"] {
            let other = BookKey::new("en", "RUT", identifier);
            insert(&store, &Commit::new(other.clone(), "Ruth")).unwrap();
            assert_eq!(list(&store, &other).unwrap().len(), 1);
        }

        let commits = list(&store, &web).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(latest(&store, &web).unwrap().unwrap().book, web);
        let key = insert(&store, &Commit::new(web.clone(), "Ruth")).unwrap();
        assert!(key.ends_with("web:0000000002"));
    }
}

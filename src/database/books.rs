use std::collections::BTreeMap;
use tracing::debug;

use super::paragraphs::{self, ParagraphError};
use super::{commits, DocumentStore};
use crate::models::{Book, BookKey, Chapter, Commit, ParagraphVersion, Unit};

/// The current state of a stored book, as recorded by its latest commit.
#[derive(Debug, Clone)]
pub struct ExistingBook {
    pub commit: Commit,
    pub introduction: Vec<ParagraphVersion>,
    pub chapters: BTreeMap<u32, Vec<ParagraphVersion>>,
}

impl ExistingBook {
    /// Loads every version `commit` refers to.
    pub fn load(store: &dyn DocumentStore, commit: Commit) -> Result<Self, ParagraphError> {
        let load = |ids: &[String]| -> Result<Vec<ParagraphVersion>, ParagraphError> {
            ids.iter().map(|id| paragraphs::require(store, id)).collect()
        };

        let introduction = load(&commit.introduction)?;
        let mut chapters = BTreeMap::new();
        for chapter in &commit.chapters {
            chapters.insert(chapter.index, load(&chapter.paragraphs)?);
        }

        Ok(ExistingBook {
            commit,
            introduction,
            chapters,
        })
    }

    pub fn unit(&self, unit: Unit) -> &[ParagraphVersion] {
        match unit {
            Unit::Introduction => &self.introduction,
            Unit::Chapter(index) => self.chapters.get(&index).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Rebuilds the book tree, regrouping chapter paragraphs into sections.
    pub fn to_book(&self, heading_styles: &[String]) -> Book {
        let mut book = Book::new(&self.commit.book.code, &self.commit.name);
        book.introduction = self.introduction.iter().map(|v| v.paragraph.clone()).collect();
        book.chapters = self
            .chapters
            .iter()
            .map(|(index, versions)| {
                let paragraphs = versions.iter().map(|v| v.paragraph.clone()).collect();
                Chapter::from_paragraphs(*index, paragraphs, heading_styles)
            })
            .collect();
        book
    }
}

/// Finds the stored state of a book, if it was imported before.
pub trait BookLookup {
    fn find_existing_book(&self, key: &BookKey) -> Result<Option<ExistingBook>, ParagraphError>;
}

/// `BookLookup` over a `DocumentStore`, reading the book's latest commit.
pub struct StoreBookLookup<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> StoreBookLookup<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        StoreBookLookup { store }
    }
}

impl BookLookup for StoreBookLookup<'_> {
    fn find_existing_book(&self, key: &BookKey) -> Result<Option<ExistingBook>, ParagraphError> {
        let Some(commit) = commits::latest(self.store, key)? else {
            debug!("No previous import of {}", key);
            return Ok(None);
        };

        ExistingBook::load(self.store, commit).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{insert_commit, MemoryStore};
    use crate::models::{CommitChapter, NewParagraphVersion, Paragraph};

    #[test]
    fn test_lookup_rebuilds_latest_commit() {
        let store = MemoryStore::new();
        let key = BookKey::new("en", "JON", "draft");
        let lookup = StoreBookLookup::new(&store);
        assert!(lookup.find_existing_book(&key).unwrap().is_none());

        let heading = ParagraphVersion::new(NewParagraphVersion {
            created_from: None,
            merged_from: Vec::new(),
            book: key.clone(),
            chapter: Some(1),
            paragraph: Paragraph::new("s1"),
        });
        paragraphs::write(&store, &heading).unwrap();

        let mut commit = Commit::new(key.clone(), "Jonah");
        commit.chapters.push(CommitChapter {
            index: 1,
            paragraphs: vec![heading.paragraph_id.clone()],
        });
        insert_commit(&store, &commit).unwrap();

        let existing = lookup.find_existing_book(&key).unwrap().unwrap();
        assert_eq!(existing.unit(Unit::Chapter(1)).len(), 1);
        assert!(existing.unit(Unit::Chapter(2)).is_empty());
        assert!(existing.unit(Unit::Introduction).is_empty());

        let book = existing.to_book(&["s1".to_string()]);
        assert_eq!(book.name, "Jonah");
        assert_eq!(book.chapter(1).unwrap().sections.len(), 1);
    }
}

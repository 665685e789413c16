use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::book::BookKey;
use super::paragraph::Paragraph;

/// One persisted version of a paragraph. Versions are never rewritten;
/// `is_deprecated` is the only field that changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphVersion {
    pub paragraph_id: String,
    /// Predecessor version, `None` for a root.
    pub created_from: Option<String>,
    /// Further predecessors folded into this version by a merge.
    #[serde(default)]
    pub merged_from: Vec<String>,
    pub is_deprecated: bool,
    pub created: DateTime<Utc>,
    pub book: BookKey,
    /// `None` for introduction material.
    pub chapter: Option<u32>,
    pub content_hash: String,
    pub paragraph: Paragraph,
}

/// Represents a new paragraph version to be inserted
#[derive(Debug, Clone)]
pub struct NewParagraphVersion {
    pub created_from: Option<String>,
    pub merged_from: Vec<String>,
    pub book: BookKey,
    pub chapter: Option<u32>,
    pub paragraph: Paragraph,
}

impl ParagraphVersion {
    /// Creates a version with a fresh id and the current timestamp
    pub fn new(new_version: NewParagraphVersion) -> Self {
        ParagraphVersion {
            paragraph_id: Uuid::new_v4().to_string(),
            created_from: new_version.created_from,
            merged_from: new_version.merged_from,
            is_deprecated: false,
            created: Utc::now(),
            book: new_version.book,
            chapter: new_version.chapter,
            content_hash: new_version.paragraph.content_hash(),
            paragraph: new_version.paragraph,
        }
    }

    pub fn is_root(&self) -> bool {
        self.created_from.is_none()
    }

    /// Every version this one was derived from.
    pub fn predecessors(&self) -> impl Iterator<Item = &String> {
        self.created_from.iter().chain(self.merged_from.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitChapter {
    pub index: u32,
    pub paragraphs: Vec<String>,
}

/// Snapshot of a book's current paragraph order after an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub commit_id: String,
    pub book: BookKey,
    pub name: String,
    pub created: DateTime<Utc>,
    pub introduction: Vec<String>,
    pub chapters: Vec<CommitChapter>,
}

impl Commit {
    pub fn new(book: BookKey, name: &str) -> Self {
        Commit {
            commit_id: Uuid::new_v4().to_string(),
            book,
            name: name.to_string(),
            created: Utc::now(),
            introduction: Vec::new(),
            chapters: Vec::new(),
        }
    }

    pub fn version_ids(&self) -> impl Iterator<Item = &String> {
        self.introduction
            .iter()
            .chain(self.chapters.iter().flat_map(|c| c.paragraphs.iter()))
    }
}

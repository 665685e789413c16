use serde::{Deserialize, Serialize};
use std::fmt;

use super::paragraph::Paragraph;
use super::section::Chapter;
use super::usx::{escape_attr, escape_text, USX_VERSION};
use super::verse::VerseRange;

/// Identifies a book within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookKey {
    pub language_id: String,
    pub code: String,
    pub identifier: String,
}

impl BookKey {
    pub fn new(language_id: &str, code: &str, identifier: &str) -> Self {
        BookKey {
            language_id: language_id.to_string(),
            code: code.to_string(),
            identifier: identifier.to_string(),
        }
    }
}

impl fmt::Display for BookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.language_id, self.code, self.identifier)
    }
}

/// Unit of matching within a book: the introduction or one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Unit {
    Introduction,
    Chapter(u32),
}

impl Unit {
    pub fn chapter(self) -> Option<u32> {
        match self {
            Unit::Introduction => None,
            Unit::Chapter(index) => Some(index),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Introduction => write!(f, "introduction"),
            Unit::Chapter(index) => write!(f, "chapter {}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub code: String,
    pub name: String,
    /// Paragraphs before the first chapter marker.
    pub introduction: Vec<Paragraph>,
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(code: &str, name: &str) -> Self {
        Book {
            code: code.to_string(),
            name: name.to_string(),
            introduction: Vec::new(),
            chapters: Vec::new(),
        }
    }

    pub fn chapter(&self, index: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.index == index)
    }

    pub fn range(&self) -> Option<VerseRange> {
        VerseRange::union_all(self.chapters.iter().map(Chapter::range))
    }

    /// Paragraphs of `unit` in document order; empty if the unit is absent.
    pub fn unit_paragraphs(&self, unit: Unit) -> Vec<Paragraph> {
        match unit {
            Unit::Introduction => self.introduction.clone(),
            Unit::Chapter(index) => self
                .chapter(index)
                .map(|c| c.paragraphs().cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// The introduction followed by every chapter, in document order.
    pub fn units(&self) -> impl Iterator<Item = Unit> + '_ {
        std::iter::once(Unit::Introduction).chain(self.chapters.iter().map(|c| Unit::Chapter(c.index)))
    }

    pub fn paragraph_count(&self) -> usize {
        self.introduction.len() + self.chapters.iter().map(|c| c.paragraphs().count()).sum::<usize>()
    }

    /// The `<book>` element and everything that belongs to it, without the
    /// `<usx>` wrapper.
    pub fn to_usx_fragment(&self) -> String {
        let mut out = format!(
            "<book code=\"{}\" style=\"id\">{}</book>\n",
            escape_attr(&self.code),
            escape_text(&self.name)
        );
        for paragraph in &self.introduction {
            out.push_str(&paragraph.to_usx());
            out.push('\n');
        }
        for chapter in &self.chapters {
            out.push_str(&chapter.to_usx());
        }
        out
    }

    pub fn to_usx(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<usx version=\"{}\">\n{}</usx>\n",
            USX_VERSION,
            self.to_usx_fragment()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_key_display() {
        let key = BookKey::new("en", "GEN", "web");
        assert_eq!(key.to_string(), "en/GEN/web");
    }

    #[test]
    fn test_units_in_document_order() {
        let mut book = Book::new("JON", "Jonah");
        book.chapters.push(Chapter::from_paragraphs(1, vec![Paragraph::new("p")], &[]));
        book.chapters.push(Chapter::from_paragraphs(2, vec![], &[]));

        let units: Vec<Unit> = book.units().collect();
        assert_eq!(units, vec![Unit::Introduction, Unit::Chapter(1), Unit::Chapter(2)]);
        assert_eq!(book.unit_paragraphs(Unit::Chapter(1)).len(), 1);
        assert!(book.unit_paragraphs(Unit::Chapter(7)).is_empty());
        assert_eq!(Unit::Chapter(3).to_string(), "chapter 3");
    }

    #[test]
    fn test_empty_book_usx() {
        let book = Book::new("RUT", "Ruth");
        let usx = book.to_usx();
        assert!(usx.contains("<usx version=\"3.0\">"));
        assert!(usx.contains("<book code=\"RUT\" style=\"id\">Ruth</book>"));
        assert!(usx.trim_end().ends_with("</usx>"));
    }
}

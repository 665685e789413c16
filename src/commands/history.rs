use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::paragraphs;
use crate::database::DocumentStore;
use crate::error::Result;
use crate::history::Reconciler;
use crate::models::{Paragraph, ParagraphVersion};

/// One version in a paragraph's history, as shown to a translator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub paragraph_id: String,
    pub created: DateTime<Utc>,
    pub is_deprecated: bool,
    pub is_conflict_root: bool,
    pub live_successors: usize,
    pub text: String,
}

impl HistoryEntry {
    fn load(store: &dyn DocumentStore, version: ParagraphVersion) -> Result<Self> {
        let id = version.paragraph_id;
        Ok(HistoryEntry {
            is_conflict_root: paragraphs::is_conflict_root(store, &id)?,
            live_successors: paragraphs::live_successor_count(store, &id)?,
            created: version.created,
            is_deprecated: version.is_deprecated,
            text: version.paragraph.text(),
            paragraph_id: id,
        })
    }
}

/// History of `id` from the version itself back to its root.
pub fn paragraph_history(store: &dyn DocumentStore, id: &str) -> Result<Vec<HistoryEntry>> {
    Reconciler::new(store)
        .history(id)?
        .into_iter()
        .map(|version| HistoryEntry::load(store, version))
        .collect()
}

/// Records a translator's edit of version `id`.
pub fn edit_paragraph(store: &dyn DocumentStore, id: &str, paragraph: Paragraph) -> Result<HistoryEntry> {
    let version = Reconciler::new(store).record_edit(id, paragraph)?;
    HistoryEntry::load(store, version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::{BookKey, CharData, NewParagraphVersion, Para, TextElement};

    fn paragraph(text: &str) -> Paragraph {
        let mut p = Paragraph::new("p");
        p.content.push(Para::Text(TextElement {
            content: vec![CharData::plain(text)],
        }));
        p
    }

    #[test]
    fn test_edits_show_up_in_history() {
        let store = MemoryStore::new();
        let root = ParagraphVersion::new(NewParagraphVersion {
            created_from: None,
            merged_from: Vec::new(),
            book: BookKey::new("en", "RUT", "draft"),
            chapter: Some(1),
            paragraph: paragraph("first"),
        });
        paragraphs::write(&store, &root).unwrap();

        let edit = edit_paragraph(&store, &root.paragraph_id, paragraph("second")).unwrap();
        edit_paragraph(&store, &root.paragraph_id, paragraph("rival")).unwrap();

        let history = paragraph_history(&store, &edit.paragraph_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "second");
        assert_eq!(history[1].text, "first");
        assert!(history[1].is_conflict_root);
        assert_eq!(history[1].live_successors, 2);
    }
}

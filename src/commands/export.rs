use tracing::info;

use crate::database::{BookLookup, DocumentStore, StoreBookLookup};
use crate::error::{EditorError, Result};
use crate::models::BookKey;
use crate::parsers::ParseOptions;

/// Serializes the current text of a book, as recorded by its latest
/// commit, back to USX.
pub fn export_book(store: &dyn DocumentStore, key: &BookKey, options: &ParseOptions) -> Result<String> {
    let existing = StoreBookLookup::new(store)
        .find_existing_book(key)?
        .ok_or_else(|| EditorError::DocumentNotFound(key.to_string()))?;

    let book = existing.to_book(&options.section_heading_styles);
    info!("Exporting {} ({} paragraphs)", key, book.paragraph_count());
    Ok(book.to_usx())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CancelFlag, Importer};
    use crate::database::MemoryStore;
    use crate::parsers::parse_book;

    const JONAH: &str = r#"<usx version="3.0"><book code="JON" style="id">Jonah</book>
        <para style="ip">A prophet's story.</para>
        <chapter number="1" style="c"/>
        <para style="s1">Jonah Flees</para>
        <para style="p"><verse number="1" style="v"/>Now the word of the <char style="nd">Lord</char> came.</para>
        <para style="s1">The Storm</para>
        <para style="p"><verse number="2-3" style="v"/>But Jonah rose<note caller="+" style="f"><char style="ft">Or fled</char></note> to flee.</para>
    </usx>"#;

    #[test]
    fn test_export_matches_imported_text() {
        let store = MemoryStore::new();
        let options = ParseOptions::default();
        Importer::new(&store, options.clone()).import_document(JONAH, "en", "draft", &CancelFlag::new());

        let usx = export_book(&store, &BookKey::new("en", "JON", "draft"), &options).unwrap();
        assert_eq!(parse_book(&usx).unwrap(), parse_book(JONAH).unwrap());
    }

    #[test]
    fn test_export_of_unknown_book() {
        let store = MemoryStore::new();
        let result = export_book(&store, &BookKey::new("en", "OBA", "draft"), &ParseOptions::default());
        assert!(matches!(result, Err(EditorError::DocumentNotFound(_))));
    }
}

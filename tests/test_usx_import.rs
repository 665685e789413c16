mod helpers;

use pretty_assertions::assert_eq;

use helpers::{data_path, open_store, read_data, ruth_key, temp_database};
use usx_editor::commands::{
    export_book, import_usx_file, paragraph_history, CancelFlag, ImportOutcome, ImportRequest,
    Importer,
};
use usx_editor::database::{latest_commit, list_commits, paragraphs};
use usx_editor::history::Reconciler;
use usx_editor::parsers::{parse_book, ParseOptions};

fn request(database_path: std::path::PathBuf, usx_path: std::path::PathBuf) -> ImportRequest {
    ImportRequest {
        database_path,
        usx_path,
        language_id: "en".to_string(),
        identifier: "draft".to_string(),
        options: ParseOptions::default(),
    }
}

#[tokio::test]
async fn test_import_file_into_sqlite() {
    let (_dir, db) = temp_database();

    let report = import_usx_file(request(db.clone(), data_path("RUT.usx")), CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(report.outcome(), ImportOutcome::Clean);
    assert_eq!(report.books.len(), 1);

    let store = open_store(&db);
    let commit = latest_commit(&store, &ruth_key()).unwrap().unwrap();
    assert_eq!(commit.name, "Ruth");
    assert_eq!(commit.introduction.len(), 1);
    assert_eq!(
        commit.chapters.iter().map(|c| c.paragraphs.len()).collect::<Vec<_>>(),
        vec![5, 1]
    );
}

#[tokio::test]
async fn test_missing_file_is_an_error() {
    let (_dir, db) = temp_database();
    let result = import_usx_file(request(db, data_path("missing.usx")), CancelFlag::new()).await;
    assert!(result.is_err());
}

#[test]
fn test_export_round_trips_through_store() {
    let (_dir, db) = temp_database();
    let store = open_store(&db);
    let usx = read_data("RUT.usx");

    Importer::new(&store, ParseOptions::default()).import_document(
        &usx,
        "en",
        "draft",
        &CancelFlag::new(),
    );
    let exported = export_book(&store, &ruth_key(), &ParseOptions::default()).unwrap();

    assert_eq!(parse_book(&exported).unwrap(), parse_book(&usx).unwrap());
}

#[test]
fn test_reimport_with_split_verse_paragraph() {
    let (_dir, db) = temp_database();
    let store = open_store(&db);
    let importer = Importer::new(&store, ParseOptions::default());
    let original = read_data("RUT.usx");
    importer.import_document(&original, "en", "draft", &CancelFlag::new());
    let first = latest_commit(&store, &ruth_key()).unwrap().unwrap();

    // Verse 5 moves into a paragraph of its own.
    let revised = original.replace(
        r#"<verse number="5" style="v" sid="RUT 1:5"/>"#,
        r#"</para><para style="p"><verse number="5" style="v" sid="RUT 1:5"/>"#,
    );
    let report = importer.import_document(&revised, "en", "draft", &CancelFlag::new());

    assert_eq!(report.outcome(), ImportOutcome::NeedsResolution);
    assert_eq!(list_commits(&store, &ruth_key()).unwrap().len(), 2);

    // Chapter 1 was [s1, p(1-2), p(3-5), s1, q1(6)].
    let split_root = &first.chapters[0].paragraphs[2];
    let reconciler = Reconciler::new(&store);
    assert!(reconciler.is_conflict_root(split_root).unwrap());
    assert!(reconciler.version_splits(split_root).unwrap());
    assert!(paragraphs::require(&store, split_root).unwrap().is_deprecated);

    let second = latest_commit(&store, &ruth_key()).unwrap().unwrap();
    let chapter = &second.chapters[0].paragraphs;
    assert_eq!(chapter.len(), 6);
    assert_eq!(&chapter[..2], &first.chapters[0].paragraphs[..2]);
    for id in &chapter[2..4] {
        let history = paragraph_history(&store, id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(&history[1].paragraph_id, split_root);
        assert!(history[1].is_conflict_root);
    }
    // Untouched chapters keep their versions.
    assert_eq!(second.chapters[1], first.chapters[1]);
    assert_eq!(second.introduction, first.introduction);
}

#[test]
fn test_changed_wording_supersedes_single_paragraph() {
    let (_dir, db) = temp_database();
    let store = open_store(&db);
    let importer = Importer::new(&store, ParseOptions::default());
    let original = read_data("RUT.usx");
    importer.import_document(&original, "en", "draft", &CancelFlag::new());
    let first = latest_commit(&store, &ruth_key()).unwrap().unwrap();

    let revised = original.replace("a relative of her husband's", "a kinsman of her husband's");
    let report = importer.import_document(&revised, "en", "draft", &CancelFlag::new());
    assert_eq!(report.outcome(), ImportOutcome::Clean);

    let second = latest_commit(&store, &ruth_key()).unwrap().unwrap();
    let old_id = &first.chapters[1].paragraphs[0];
    let new_id = &second.chapters[1].paragraphs[0];
    assert_ne!(old_id, new_id);

    let history = paragraph_history(&store, new_id).unwrap();
    assert!(history[0].text.contains("a kinsman of her husband's"));
    assert!(history[1].text.contains("a relative of her husband's"));
    assert_eq!(&history[1].paragraph_id, old_id);
    assert!(history[1].is_deprecated);
    assert!(!history[1].is_conflict_root);
}

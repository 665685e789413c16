use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::database::{insert_commit, BookLookup, DocumentStore, SqliteStore, StoreBookLookup};
use crate::error::{EditorError, Result};
use crate::history::{ParagraphOutcome, Reconciler};
use crate::matching::match_paragraphs;
use crate::models::{Book, BookKey, Commit, CommitChapter, Paragraph, ParagraphVersion, Unit};
use crate::parsers::{parse_usx, ParseOptions};

/// Shared flag a caller sets to stop an import between books.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportOutcome {
    /// Everything imported without conflicts.
    Clean,
    /// Imported, but some paragraphs were split and need a translator.
    NeedsResolution,
    /// At least part of the document was not imported.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitReport {
    pub unit: Unit,
    pub outcomes: Vec<ParagraphOutcome>,
    pub created: usize,
    /// Set when the unit could not be matched, or its reconciliation stopped
    /// part way.
    pub error: Option<String>,
}

impl UnitReport {
    pub fn conflicts(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ParagraphOutcome::SplitRecorded { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookReport {
    pub code: Option<String>,
    /// Key of the commit written for this book.
    pub commit: Option<String>,
    pub units: Vec<UnitReport>,
    pub error: Option<String>,
}

impl BookReport {
    fn failed(code: Option<String>, error: impl ToString) -> Self {
        BookReport {
            code,
            commit: None,
            units: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some() || self.units.iter().any(|u| u.error.is_some())
    }

    pub fn conflicts(&self) -> usize {
        self.units.iter().map(UnitReport::conflicts).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub books: Vec<BookReport>,
    /// Document level failure; no book was imported.
    pub error: Option<String>,
    pub cancelled: bool,
}

impl ImportReport {
    pub fn outcome(&self) -> ImportOutcome {
        if self.error.is_some() || self.cancelled || self.books.iter().any(BookReport::is_failed) {
            ImportOutcome::Failed
        } else if self.books.iter().any(|b| b.conflicts() > 0) {
            ImportOutcome::NeedsResolution
        } else {
            ImportOutcome::Clean
        }
    }
}

/// Runs parse, match and reconcile for a USX document and records one
/// commit per imported book.
pub struct Importer<'a> {
    store: &'a dyn DocumentStore,
    lookup: Box<dyn BookLookup + 'a>,
    options: ParseOptions,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a dyn DocumentStore, options: ParseOptions) -> Self {
        Importer {
            store,
            lookup: Box::new(StoreBookLookup::new(store)),
            options,
        }
    }

    pub fn with_lookup(mut self, lookup: impl BookLookup + 'a) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    pub fn import_document(
        &self,
        xml: &str,
        language_id: &str,
        identifier: &str,
        cancel: &CancelFlag,
    ) -> ImportReport {
        let mut report = ImportReport::default();

        let document = match parse_usx(xml, &self.options) {
            Ok(document) => document,
            Err(e) => {
                error!("Failed to read USX document: {}", e);
                report.error = Some(e.to_string());
                return report;
            }
        };

        for parsed in document.into_books() {
            if cancel.is_cancelled() {
                warn!("Import cancelled after {} book(s)", report.books.len());
                report.cancelled = true;
                break;
            }

            let book = match parsed {
                Ok(book) => book,
                Err(failure) => {
                    report.books.push(BookReport::failed(failure.code.clone(), &failure.error));
                    continue;
                }
            };

            let key = BookKey::new(language_id, &book.code, identifier);
            let code = Some(book.code.clone());
            match self.import_book(book, &key) {
                Ok(book_report) => report.books.push(book_report),
                Err(e) => {
                    error!("Failed to import {}: {}", key, e);
                    report.books.push(BookReport::failed(code, e));
                }
            }
        }

        info!(
            "Import finished: {} book(s), outcome {:?}",
            report.books.len(),
            report.outcome()
        );
        report
    }

    fn import_book(&self, book: Book, key: &BookKey) -> Result<BookReport> {
        info!("Importing {} ({} paragraphs)", key, book.paragraph_count());
        let existing = self.lookup.find_existing_book(key)?;

        let mut units: BTreeSet<Unit> = book.units().collect();
        if let Some(existing) = &existing {
            units.extend(existing.chapters.keys().map(|&index| Unit::Chapter(index)));
        }

        let mut commit = Commit::new(key.clone(), &book.name);
        let mut reports = Vec::new();
        for unit in units {
            let versions = existing.as_ref().map(|e| e.unit(unit)).unwrap_or(&[]);
            let new = book.unit_paragraphs(unit);
            if versions.is_empty() && new.is_empty() {
                continue;
            }

            let (ids, unit_report) = self.reconcile(key, unit, versions, &new);
            reports.push(unit_report);

            match unit {
                Unit::Introduction => commit.introduction = ids,
                Unit::Chapter(index) if !ids.is_empty() => commit.chapters.push(CommitChapter {
                    index,
                    paragraphs: ids,
                }),
                Unit::Chapter(_) => {}
            }
        }

        let commit_key = insert_commit(self.store, &commit)?;
        Ok(BookReport {
            code: Some(book.code),
            commit: Some(commit_key),
            units: reports,
            error: None,
        })
    }

    /// Reconciles one unit. On failure the unit keeps whatever is current
    /// in the store: its previous versions when nothing was written, or the
    /// mix left behind by a reconciliation that stopped part way.
    fn reconcile(
        &self,
        key: &BookKey,
        unit: Unit,
        versions: &[ParagraphVersion],
        new: &[Paragraph],
    ) -> (Vec<String>, UnitReport) {
        let old_ids: Vec<String> = versions.iter().map(|v| v.paragraph_id.clone()).collect();
        let old: Vec<Paragraph> = versions.iter().map(|v| v.paragraph.clone()).collect();

        let Some(pairs) = match_paragraphs(&old, new) else {
            let error = EditorError::MatchFailure {
                book: key.to_string(),
                unit: unit.to_string(),
            };
            warn!("Keeping previous text of {} {}: {}", key, unit, error);
            let report = UnitReport {
                unit,
                outcomes: Vec::new(),
                created: 0,
                error: Some(error.to_string()),
            };
            return (old_ids, report);
        };

        let reconciled =
            Reconciler::new(self.store).reconcile_unit(key, unit, versions, new, &pairs);
        let (result, error) = match reconciled {
            Ok(result) => (result, None),
            Err(e) => {
                warn!("Reconciliation of {} {} stopped: {}", key, unit, e);
                let error = e.to_string();
                (e.partial, Some(error))
            }
        };
        let report = UnitReport {
            unit,
            created: result.created_count(&old_ids),
            outcomes: result.outcomes,
            error,
        };
        (result.current_ids, report)
    }
}

/// Where an import reads from and writes to.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub database_path: PathBuf,
    pub usx_path: PathBuf,
    pub language_id: String,
    pub identifier: String,
    pub options: ParseOptions,
}

/// Imports a USX file on a blocking worker with its own database
/// connection.
pub async fn import_usx_file(request: ImportRequest, cancel: CancelFlag) -> Result<ImportReport> {
    tokio::task::spawn_blocking(move || {
        let xml = std::fs::read_to_string(&request.usx_path)?;
        let store = SqliteStore::open(&request.database_path)?;
        let importer = Importer::new(&store, request.options);
        Ok::<_, EditorError>(importer.import_document(
            &xml,
            &request.language_id,
            &request.identifier,
            &cancel,
        ))
    })
    .await
    .map_err(|e| EditorError::Internal(format!("Import worker failed: {}", e)))?
}

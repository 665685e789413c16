mod export;
mod history;
mod import;

pub use export::export_book;
pub use history::{edit_paragraph, paragraph_history, HistoryEntry};
pub use import::{
    import_usx_file, BookReport, CancelFlag, ImportOutcome, ImportReport, ImportRequest, Importer,
    UnitReport,
};

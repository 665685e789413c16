mod book;
mod char_data;
mod para;
mod paragraph;
mod section;
mod usx;
mod verse;
mod version;

pub use book::{Book, BookKey, Unit};
pub use char_data::{coalesce, concat, push_run, text_of, CharData};
pub use para::{main_text, CrossReference, FootNote, NoteKind, Para, TextElement};
pub use paragraph::Paragraph;
pub use section::{Chapter, Section};
pub use verse::{Verse, VerseRange};
pub use version::{Commit, CommitChapter, NewParagraphVersion, ParagraphVersion};

//! One processor per document level. Each processor decides, per event,
//! whether to keep the event, hand it to a child frame, or finish; the
//! driver in `parsers::driver` owns the frame stack.

mod book;
mod chapter;
mod chars;
mod note;
mod paragraph;
mod section;
mod skip;
mod verse;

pub use book::BookProcessor;
pub use chapter::ChapterProcessor;
pub use chars::{extend_inline, CharMode, CharProcessor};
pub use note::NoteProcessor;
pub use paragraph::ParagraphProcessor;
pub use section::SectionProcessor;
pub use skip::SkipProcessor;
pub use verse::{parse_verse_number, VerseProcessor};

use super::error::ParseError;
use super::events::{StartTag, UsxEvent};
use crate::config::default_section_heading_styles;
use crate::models::{Book, Chapter, Para, Paragraph, Section, Verse};

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub section_heading_styles: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            section_heading_styles: default_section_heading_styles(),
        }
    }
}

impl ParseOptions {
    pub fn is_section_heading(&self, style: &str) -> bool {
        self.section_heading_styles.iter().any(|s| s == style)
    }
}

/// What a processor wants done with the event it was just given.
pub enum Step {
    /// The event was used; stay on this frame.
    Continue,
    /// Push `frame`. If `consumed` is false the same event is replayed to it.
    Delegate { frame: Frame, consumed: bool },
    /// Pop this frame. If `consumed` is false the event is replayed to the
    /// parent.
    Done { consumed: bool },
}

impl Step {
    pub fn delegate(frame: impl Into<Frame>, consumed: bool) -> Step {
        Step::Delegate {
            frame: frame.into(),
            consumed,
        }
    }

    pub fn done() -> Step {
        Step::Done { consumed: true }
    }

    pub fn yield_to_parent() -> Step {
        Step::Done { consumed: false }
    }
}

/// Output of a completed frame, handed to its parent.
#[derive(Debug)]
pub enum Node {
    Book(Book),
    Chapter(Chapter),
    Section(Section),
    Paragraph(Paragraph),
    Verse(Verse),
    Inline(Vec<Para>),
    Note(Para),
    Skipped,
}

impl Node {
    fn kind(&self) -> &'static str {
        match self {
            Node::Book(_) => "book",
            Node::Chapter(_) => "chapter",
            Node::Section(_) => "section",
            Node::Paragraph(_) => "paragraph",
            Node::Verse(_) => "verse",
            Node::Inline(_) => "inline content",
            Node::Note(_) => "note",
            Node::Skipped => "skipped element",
        }
    }

    pub fn unexpected(self, parent: Level) -> ParseError {
        ParseError::Structure(format!("{} cannot contain {}", parent.name(), self.kind()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Book,
    Chapter,
    Section,
    Paragraph,
    Verse,
    Chars,
    Note,
    Skip,
}

impl Level {
    pub fn name(self) -> &'static str {
        match self {
            Level::Book => "book",
            Level::Chapter => "chapter",
            Level::Section => "section",
            Level::Paragraph => "paragraph",
            Level::Verse => "verse",
            Level::Chars => "char run",
            Level::Note => "note",
            Level::Skip => "skipped element",
        }
    }
}

/// Capabilities every level shares. The default event handlers ignore the
/// event, which suits most levels for text and stray end tags.
pub trait LevelProcessor {
    fn level(&self) -> Level;

    fn on_start(&mut self, tag: &StartTag, options: &ParseOptions) -> Result<Step, ParseError>;

    fn on_end(&mut self, _name: &str) -> Result<Step, ParseError> {
        Ok(Step::Continue)
    }

    fn on_text(&mut self, _text: &str) -> Result<Step, ParseError> {
        Ok(Step::Continue)
    }

    /// Receives the node produced by a completed child frame.
    fn accept(&mut self, node: Node) -> Result<(), ParseError>;

    fn generate(self) -> Result<Node, ParseError>;
}

/// Frame on the parser stack, tagged by level.
pub enum Frame {
    Book(BookProcessor),
    Chapter(ChapterProcessor),
    Section(SectionProcessor),
    Paragraph(ParagraphProcessor),
    Verse(VerseProcessor),
    Chars(CharProcessor),
    Note(NoteProcessor),
    Skip(SkipProcessor),
}

macro_rules! each_frame {
    ($frame:expr, $p:ident => $body:expr) => {
        match $frame {
            Frame::Book($p) => $body,
            Frame::Chapter($p) => $body,
            Frame::Section($p) => $body,
            Frame::Paragraph($p) => $body,
            Frame::Verse($p) => $body,
            Frame::Chars($p) => $body,
            Frame::Note($p) => $body,
            Frame::Skip($p) => $body,
        }
    };
}

impl Frame {
    pub fn level(&self) -> Level {
        each_frame!(self, p => p.level())
    }

    pub fn handle(&mut self, event: &UsxEvent, options: &ParseOptions) -> Result<Step, ParseError> {
        match event {
            UsxEvent::Start(tag) => each_frame!(self, p => p.on_start(tag, options)),
            UsxEvent::End(name) => each_frame!(self, p => p.on_end(name)),
            UsxEvent::Text(text) => each_frame!(self, p => p.on_text(text)),
        }
    }

    pub fn accept(&mut self, node: Node) -> Result<(), ParseError> {
        each_frame!(self, p => p.accept(node))
    }

    pub fn generate(self) -> Result<Node, ParseError> {
        each_frame!(self, p => p.generate())
    }

    /// Book code of a book frame, used to label failures.
    pub fn book_code(&self) -> Option<&str> {
        match self {
            Frame::Book(p) => Some(p.code()),
            _ => None,
        }
    }
}

macro_rules! frame_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(impl From<$ty> for Frame {
            fn from(p: $ty) -> Frame {
                Frame::$variant(p)
            }
        })*
    };
}

frame_from! {
    Book => BookProcessor,
    Chapter => ChapterProcessor,
    Section => SectionProcessor,
    Paragraph => ParagraphProcessor,
    Verse => VerseProcessor,
    Chars => CharProcessor,
    Note => NoteProcessor,
    Skip => SkipProcessor,
}

/// Elements that only structure the document and end any inline run.
pub fn is_structural(tag: &StartTag) -> bool {
    tag.opens_chapter() || tag.opens_verse() || tag.is("para") || tag.is("book")
}

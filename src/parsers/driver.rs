use tracing::{debug, warn};

use super::error::{BookFailure, ParseError};
use super::events::{UsxEvent, XmlEventSource};
use super::processors::{BookProcessor, Frame, Level, Node, ParseOptions, Step};
use crate::models::Book;

/// Upper bound on how often one event may be handed back down the stack.
/// Each replay either pops or pushes a frame, so a well-formed stack never
/// gets close.
const MAX_REDISPATCH: usize = 64;

/// Result of parsing one USX document: every book in document order,
/// successfully parsed or not.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    books: Vec<Result<Book, BookFailure>>,
}

impl ParsedDocument {
    pub fn books(&self) -> &[Result<Book, BookFailure>] {
        &self.books
    }

    pub fn into_books(self) -> Vec<Result<Book, BookFailure>> {
        self.books
    }

    pub fn is_clean(&self) -> bool {
        self.books.iter().all(Result::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &BookFailure> {
        self.books.iter().filter_map(|b| b.as_ref().err())
    }
}

/// Push-driven USX parser. Feed it events in document order, then call
/// [`UsxParser::finish`].
pub struct UsxParser {
    options: ParseOptions,
    stack: Vec<Frame>,
    books: Vec<Result<Book, BookFailure>>,
    /// Set after a book failed; events are dropped until the next `<book>`.
    skipping: bool,
}

impl Default for UsxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl UsxParser {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        UsxParser {
            options,
            stack: Vec::new(),
            books: Vec::new(),
            skipping: false,
        }
    }

    pub fn feed(&mut self, event: UsxEvent) {
        if self.skipping {
            match &event {
                UsxEvent::Start(tag) if tag.is("book") => self.skipping = false,
                _ => return,
            }
        }

        if let Err(error) = self.dispatch(&event) {
            self.fail_current_book(error);
        }
    }

    pub fn finish(mut self) -> ParsedDocument {
        while !self.stack.is_empty() {
            if let Err(error) = self.complete_top() {
                self.fail_current_book(error);
            }
        }
        ParsedDocument { books: self.books }
    }

    fn dispatch(&mut self, event: &UsxEvent) -> Result<(), ParseError> {
        for _ in 0..MAX_REDISPATCH {
            let Some(top) = self.stack.last_mut() else {
                return self.document_level(event);
            };

            match top.handle(event, &self.options)? {
                Step::Continue => return Ok(()),
                Step::Delegate { frame, consumed } => {
                    self.stack.push(frame);
                    if consumed {
                        return Ok(());
                    }
                }
                Step::Done { consumed } => {
                    self.complete_top()?;
                    if consumed {
                        return Ok(());
                    }
                }
            }
        }

        Err(ParseError::Structure(format!(
            "event {:?} was never consumed",
            event
        )))
    }

    /// Pops the top frame and hands its node to the new top, or records it
    /// as a finished book.
    fn complete_top(&mut self) -> Result<(), ParseError> {
        let Some(frame) = self.stack.pop() else {
            return Ok(());
        };
        let node = frame.generate()?;

        match self.stack.last_mut() {
            Some(parent) => parent.accept(node),
            None => match node {
                Node::Book(book) => {
                    debug!("Parsed book {}", book.code);
                    self.books.push(Ok(book));
                    Ok(())
                }
                other => Err(other.unexpected(Level::Book)),
            },
        }
    }

    fn document_level(&mut self, event: &UsxEvent) -> Result<(), ParseError> {
        match event {
            UsxEvent::Start(tag) if tag.is("book") => {
                self.stack.push(BookProcessor::start(tag)?.into());
                Ok(())
            }
            UsxEvent::Start(tag) if tag.is("usx") => Ok(()),
            UsxEvent::Start(tag) => Err(ParseError::Structure(format!(
                "<{}> appears outside of any book",
                tag.name
            ))),
            UsxEvent::End(_) | UsxEvent::Text(_) => Ok(()),
        }
    }

    fn fail_current_book(&mut self, error: ParseError) {
        let code = self
            .stack
            .first()
            .and_then(Frame::book_code)
            .map(str::to_string);
        warn!(
            "Discarding book {}: {}",
            code.as_deref().unwrap_or("<unknown>"),
            error
        );

        self.stack.clear();
        self.books.push(Err(BookFailure { code, error }));
        self.skipping = true;
    }
}

/// Parses a whole USX document. Book level problems are reported per book
/// inside the returned document; only a tokenizer failure fails the call.
pub fn parse_usx(xml: &str, options: &ParseOptions) -> Result<ParsedDocument, ParseError> {
    let mut parser = UsxParser::with_options(options.clone());
    for event in XmlEventSource::new(xml) {
        parser.feed(event?);
    }
    Ok(parser.finish())
}

/// Parses a document expected to hold exactly one book.
pub fn parse_book(xml: &str) -> Result<Book, ParseError> {
    parse_usx(xml, &ParseOptions::default())?
        .into_books()
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::Structure("document contains no book".to_string()))?
        .map_err(|failure| failure.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Para, VerseRange};
    use pretty_assertions::assert_eq;

    const GENESIS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<usx version="3.0">
  <book code="GEN" style="id">Genesis</book>
  <para style="ip">An introduction.</para>
  <chapter number="1" style="c"/>
  <para style="s1">The Creation</para>
  <para style="p">
    <verse number="1" style="v"/>In the beginning God created the heavens and the earth.
    <verse number="2" style="v"/>The earth was <char style="add">without form</char> and void.<verse eid="GEN 1:2"/>
  </para>
  <para style="p">
    <verse number="3-4" style="v"/>And God said<note caller="+" style="f"><char style="fr">1.3 </char><char style="ft">Or commanded</char></note>, Let there be light.
  </para>
  <para style="s1">The Second Day</para>
  <para style="p"><verse number="5" style="v"/>Evening and morning.</para>
  <chapter eid="GEN 1"/>
  <chapter number="2" style="c"/>
  <para style="p"><verse number="1" style="v"/>Thus the heavens were finished.</para>
</usx>"#;

    fn parse(xml: &str) -> ParsedDocument {
        parse_usx(xml, &ParseOptions::default()).unwrap()
    }

    #[test]
    fn test_parse_book_structure() {
        let book = parse_book(GENESIS).unwrap();

        assert_eq!(book.code, "GEN");
        assert_eq!(book.name, "Genesis");
        assert_eq!(book.introduction.len(), 1);
        assert_eq!(book.introduction[0].text(), "An introduction.");
        assert_eq!(book.chapters.len(), 2);

        let chapter = book.chapter(1).unwrap();
        assert_eq!(chapter.sections.len(), 2);
        assert_eq!(chapter.sections[0].content.len(), 3);
        assert_eq!(chapter.sections[1].content.len(), 2);
        assert_eq!(chapter.range(), VerseRange::new(1, 5));
        assert_eq!(book.chapter(2).unwrap().range(), Some(VerseRange::single(1)));
    }

    #[test]
    fn test_verse_content_and_milestones() {
        let book = parse_book(GENESIS).unwrap();
        let paragraph = &book.chapter(1).unwrap().sections[0].content[1];

        assert_eq!(paragraph.verses.len(), 2);
        assert_eq!(
            paragraph.verses[0].text(),
            "In the beginning God created the heavens and the earth. "
        );
        // The eid milestone must not split verse 2.
        assert_eq!(paragraph.verses[1].text(), "The earth was without form and void. ");
        assert_eq!(paragraph.verses[1].content.len(), 1);
    }

    #[test]
    fn test_note_inside_verse() {
        let book = parse_book(GENESIS).unwrap();
        let paragraph = &book.chapter(1).unwrap().sections[0].content[2];
        let verse = &paragraph.verses[0];

        assert_eq!(verse.range, VerseRange::new(3, 4).unwrap());
        assert_eq!(verse.content.len(), 3);
        let Para::FootNote(note) = &verse.content[1] else {
            panic!("expected a footnote, got {:?}", verse.content[1]);
        };
        assert_eq!(note.caller, "+");
        assert_eq!(note.origin.as_deref(), Some("1.3"));
        assert_eq!(verse.content[2].text(), ", Let there be light. ");
    }

    #[test]
    fn test_round_trip_is_stable() {
        let book = parse_book(GENESIS).unwrap();
        let reparsed = parse_book(&book.to_usx()).unwrap();
        assert_eq!(reparsed, book);
    }

    #[test]
    fn test_heading_first_in_section_stays_in_it() {
        let xml = r#"<usx><book code="RUT"/><chapter number="1"/>
            <para style="s1">Heading</para><para style="p"><verse number="1"/>a</para>
        </usx>"#;
        let book = parse_book(xml).unwrap();
        let chapter = book.chapter(1).unwrap();
        assert_eq!(chapter.sections.len(), 1);
        assert_eq!(chapter.sections[0].content.len(), 2);
    }

    #[test]
    fn test_bad_verse_number_fails_only_its_book() {
        let xml = r#"<usx>
            <book code="RUT">Ruth</book><chapter number="1"/>
            <para style="p"><verse number="abc"/>text</para>
            <book code="JON">Jonah</book><chapter number="1"/>
            <para style="p"><verse number="1"/>Now the word</para>
        </usx>"#;
        let document = parse(xml);

        assert!(!document.is_clean());
        assert_eq!(document.books().len(), 2);
        let failure = document.books()[0].as_ref().unwrap_err();
        assert_eq!(failure.code.as_deref(), Some("RUT"));
        assert_eq!(
            failure.error,
            ParseError::UnparsableVerseNumber {
                value: "abc".to_string()
            }
        );
        let jonah = document.books()[1].as_ref().unwrap();
        assert_eq!(jonah.code, "JON");
        assert_eq!(jonah.paragraph_count(), 1);
    }

    #[test]
    fn test_chapter_without_number_fails_its_book() {
        let xml = r#"<usx><book code="RUT"/><chapter style="c"/><para style="p">x</para></usx>"#;
        let document = parse(xml);

        let failures: Vec<_> = document.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].error,
            ParseError::MissingChapterIndex {
                book: "RUT".to_string()
            }
        );
    }

    #[test]
    fn test_missing_book_code() {
        let document = parse(r#"<usx><book style="id">Nameless</book></usx>"#);
        let failure = document.books()[0].as_ref().unwrap_err();
        assert_eq!(failure.code, None);
        assert_eq!(failure.error, ParseError::MissingBookCode);
    }

    #[test]
    fn test_unknown_block_elements_are_skipped() {
        let xml = r#"<usx><book code="RUT"/><chapter number="1"/>
            <table><row style="tr"><cell style="tc1">x</cell></row></table>
            <para style="p"><verse number="1"/>kept</para>
        </usx>"#;
        let book = parse_book(xml).unwrap();
        assert_eq!(book.paragraph_count(), 1);
        assert_eq!(book.chapter(1).unwrap().paragraphs().next().unwrap().text(), "kept");
    }

    #[test]
    fn test_malformed_xml_fails_document() {
        let result = parse_usx("<usx><book code=\"RUT\"></usx>", &ParseOptions::default());
        assert!(matches!(result, Err(ParseError::Xml(_))));
    }

    #[test]
    fn test_feed_accepts_events_from_any_source() {
        use crate::parsers::events::StartTag;

        let mut parser = UsxParser::new();
        parser.feed(UsxEvent::Start(StartTag::new("book", &[("code", "OBA")])));
        parser.feed(UsxEvent::Text("Obadiah".to_string()));
        parser.feed(UsxEvent::End("book".to_string()));
        parser.feed(UsxEvent::Start(StartTag::new("chapter", &[("number", "1")])));
        parser.feed(UsxEvent::End("chapter".to_string()));
        parser.feed(UsxEvent::Start(StartTag::new("para", &[("style", "p")])));
        parser.feed(UsxEvent::Start(StartTag::new("verse", &[("number", "1")])));
        parser.feed(UsxEvent::End("verse".to_string()));
        parser.feed(UsxEvent::Text("The vision".to_string()));
        parser.feed(UsxEvent::End("para".to_string()));

        let books = parser.finish().into_books();
        let book = books[0].as_ref().unwrap();
        assert_eq!(book.name, "Obadiah");
        assert_eq!(book.chapter(1).unwrap().range(), Some(VerseRange::single(1)));
    }
}

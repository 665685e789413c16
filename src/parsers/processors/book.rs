use tracing::{debug, warn};

use super::{
    ChapterProcessor, Level, LevelProcessor, Node, ParagraphProcessor, ParseOptions,
    SkipProcessor, Step,
};
use crate::models::{Book, Chapter, Paragraph};
use crate::parsers::error::ParseError;
use crate::parsers::events::StartTag;

/// Top level of one book: the `<book>` element's text is the name, then
/// introduction paragraphs, then chapters until the next book or `</usx>`.
pub struct BookProcessor {
    code: String,
    name: String,
    in_book_element: bool,
    introduction: Vec<Paragraph>,
    chapters: Vec<Chapter>,
}

impl BookProcessor {
    pub fn start(tag: &StartTag) -> Result<Self, ParseError> {
        let code = tag
            .attr("code")
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ParseError::MissingBookCode)?;
        debug!("Parsing book {}", code);

        Ok(BookProcessor {
            code: code.to_string(),
            name: String::new(),
            in_book_element: true,
            introduction: Vec::new(),
            chapters: Vec::new(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl LevelProcessor for BookProcessor {
    fn level(&self) -> Level {
        Level::Book
    }

    fn on_start(&mut self, tag: &StartTag, _options: &ParseOptions) -> Result<Step, ParseError> {
        if tag.is("book") {
            return Ok(Step::yield_to_parent());
        }
        if tag.opens_chapter() {
            let chapter = ChapterProcessor::start(tag, &self.code)?;
            return Ok(Step::delegate(chapter, true));
        }
        if tag.is("chapter") {
            return Ok(Step::Continue);
        }
        if tag.is("para") {
            return Ok(Step::delegate(ParagraphProcessor::start(tag)?, true));
        }

        warn!("Skipping <{}> outside of any chapter in {}", tag.name, self.code);
        Ok(Step::delegate(SkipProcessor::new(&tag.name), true))
    }

    fn on_end(&mut self, name: &str) -> Result<Step, ParseError> {
        match name {
            "book" if self.in_book_element => {
                self.in_book_element = false;
                Ok(Step::Continue)
            }
            "usx" => Ok(Step::yield_to_parent()),
            _ => Ok(Step::Continue),
        }
    }

    fn on_text(&mut self, text: &str) -> Result<Step, ParseError> {
        if self.in_book_element {
            self.name.push_str(text);
        } else if !text.trim().is_empty() {
            warn!("Ignoring stray text outside paragraphs in {}", self.code);
        }
        Ok(Step::Continue)
    }

    fn accept(&mut self, node: Node) -> Result<(), ParseError> {
        match node {
            Node::Paragraph(paragraph) => self.introduction.push(paragraph),
            Node::Chapter(chapter) => self.chapters.push(chapter),
            Node::Skipped => {}
            other => return Err(other.unexpected(self.level())),
        }
        Ok(())
    }

    fn generate(self) -> Result<Node, ParseError> {
        debug!(
            "Finished book {} with {} chapters",
            self.code,
            self.chapters.len()
        );
        Ok(Node::Book(Book {
            code: self.code,
            name: self.name.trim().to_string(),
            introduction: self.introduction,
            chapters: self.chapters,
        }))
    }
}

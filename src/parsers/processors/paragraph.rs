use super::{extend_inline, CharMode, CharProcessor, Level, LevelProcessor, Node, ParseOptions, Step, VerseProcessor};
use crate::models::{Para, Paragraph, Verse};
use crate::parsers::error::ParseError;
use crate::parsers::events::StartTag;

pub struct ParagraphProcessor {
    style: String,
    content: Vec<Para>,
    verses: Vec<Verse>,
}

impl ParagraphProcessor {
    pub fn start(tag: &StartTag) -> Result<Self, ParseError> {
        Ok(ParagraphProcessor {
            style: tag.required("style")?.to_string(),
            content: Vec::new(),
            verses: Vec::new(),
        })
    }
}

impl LevelProcessor for ParagraphProcessor {
    fn level(&self) -> Level {
        Level::Paragraph
    }

    fn on_start(&mut self, tag: &StartTag, _options: &ParseOptions) -> Result<Step, ParseError> {
        if tag.opens_verse() {
            return Ok(Step::delegate(VerseProcessor::start(tag)?, true));
        }
        if tag.is("verse") {
            return Ok(Step::Continue);
        }
        // A paragraph never crosses a chapter, book or sibling paragraph.
        if tag.is("para") || tag.is("book") || tag.opens_chapter() {
            return Ok(Step::yield_to_parent());
        }
        if tag.is("chapter") {
            return Ok(Step::Continue);
        }
        Ok(Step::delegate(CharProcessor::new(CharMode::Paragraph), false))
    }

    fn on_end(&mut self, name: &str) -> Result<Step, ParseError> {
        match name {
            "para" => Ok(Step::done()),
            "usx" => Ok(Step::yield_to_parent()),
            _ => Ok(Step::Continue),
        }
    }

    fn on_text(&mut self, _text: &str) -> Result<Step, ParseError> {
        Ok(Step::delegate(CharProcessor::new(CharMode::Paragraph), false))
    }

    fn accept(&mut self, node: Node) -> Result<(), ParseError> {
        match node {
            Node::Inline(content) => extend_inline(&mut self.content, content),
            Node::Verse(verse) => self.verses.push(verse),
            other => return Err(other.unexpected(self.level())),
        }
        Ok(())
    }

    fn generate(self) -> Result<Node, ParseError> {
        Ok(Node::Paragraph(Paragraph {
            style: self.style,
            content: self.content,
            verses: self.verses,
        }))
    }
}

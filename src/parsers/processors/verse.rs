use regex::Regex;
use std::sync::OnceLock;

use super::{extend_inline, CharMode, CharProcessor, Level, LevelProcessor, Node, ParseOptions, Step};
use crate::models::{Para, Verse, VerseRange};
use crate::parsers::error::ParseError;
use crate::parsers::events::StartTag;

static VERSE_NUMBER: OnceLock<Regex> = OnceLock::new();

fn verse_number_pattern() -> &'static Regex {
    VERSE_NUMBER.get_or_init(|| {
        Regex::new(r"^(\d+)[a-z]?(?:-(\d+)[a-z]?)?$").expect("verse number pattern is valid")
    })
}

/// Parses a verse marker number: `"12"`, `"12-14"`, or either with a
/// segment letter (`"12a"`), which is dropped.
pub fn parse_verse_number(value: &str) -> Result<VerseRange, ParseError> {
    let trimmed = value.trim();
    let number_error = || ParseError::UnparsableVerseNumber {
        value: value.to_string(),
    };
    let range_error = || ParseError::UnparsableVerseRange {
        value: value.to_string(),
    };

    let Some(caps) = verse_number_pattern().captures(trimmed) else {
        return Err(if trimmed.contains('-') {
            range_error()
        } else {
            number_error()
        });
    };

    let start: u32 = caps[1].parse().map_err(|_| number_error())?;
    match caps.get(2) {
        None => Ok(VerseRange::single(start)),
        Some(end) => {
            let end: u32 = end.as_str().parse().map_err(|_| range_error())?;
            VerseRange::new(start, end).ok_or_else(range_error)
        }
    }
}

/// Content from a verse marker to the next verse marker or the end of the
/// enclosing paragraph.
pub struct VerseProcessor {
    range: VerseRange,
    content: Vec<Para>,
    marker_open: bool,
}

impl VerseProcessor {
    pub fn start(tag: &StartTag) -> Result<Self, ParseError> {
        let number = tag
            .attr("number")
            .ok_or_else(|| ParseError::missing("verse", "number"))?;

        Ok(VerseProcessor {
            range: parse_verse_number(number)?,
            content: Vec::new(),
            marker_open: true,
        })
    }
}

impl LevelProcessor for VerseProcessor {
    fn level(&self) -> Level {
        Level::Verse
    }

    fn on_start(&mut self, tag: &StartTag, _options: &ParseOptions) -> Result<Step, ParseError> {
        if tag.opens_verse() || tag.is("para") || tag.is("book") || tag.opens_chapter() {
            return Ok(Step::yield_to_parent());
        }
        if tag.is("verse") || tag.is("chapter") {
            return Ok(Step::Continue);
        }
        Ok(Step::delegate(CharProcessor::new(CharMode::Paragraph), false))
    }

    fn on_end(&mut self, name: &str) -> Result<Step, ParseError> {
        match name {
            "verse" if self.marker_open => {
                self.marker_open = false;
                Ok(Step::Continue)
            }
            "para" | "usx" => Ok(Step::yield_to_parent()),
            _ => Ok(Step::Continue),
        }
    }

    fn on_text(&mut self, _text: &str) -> Result<Step, ParseError> {
        Ok(Step::delegate(CharProcessor::new(CharMode::Paragraph), false))
    }

    fn accept(&mut self, node: Node) -> Result<(), ParseError> {
        match node {
            Node::Inline(content) => extend_inline(&mut self.content, content),
            other => return Err(other.unexpected(self.level())),
        }
        Ok(())
    }

    fn generate(self) -> Result<Node, ParseError> {
        Ok(Node::Verse(Verse {
            range: self.range,
            content: self.content,
        }))
    }
}

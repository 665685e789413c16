use tracing::warn;

use super::{Level, LevelProcessor, Node, ParseOptions, SectionProcessor, SkipProcessor, Step};
use crate::models::{Chapter, Section};
use crate::parsers::error::ParseError;
use crate::parsers::events::StartTag;

/// Everything from a `<chapter number>` marker up to the next chapter, the
/// next book or the end of the document.
pub struct ChapterProcessor {
    index: u32,
    sections: Vec<Section>,
}

impl ChapterProcessor {
    pub fn start(tag: &StartTag, book: &str) -> Result<Self, ParseError> {
        let missing = || ParseError::MissingChapterIndex {
            book: book.to_string(),
        };
        let index = tag
            .attr("number")
            .and_then(|n| n.trim().parse::<u32>().ok())
            .filter(|n| *n >= 1)
            .ok_or_else(missing)?;

        Ok(ChapterProcessor {
            index,
            sections: Vec::new(),
        })
    }
}

impl LevelProcessor for ChapterProcessor {
    fn level(&self) -> Level {
        Level::Chapter
    }

    fn on_start(&mut self, tag: &StartTag, _options: &ParseOptions) -> Result<Step, ParseError> {
        if tag.is("book") || tag.opens_chapter() {
            return Ok(Step::yield_to_parent());
        }
        if tag.is("chapter") {
            return Ok(Step::Continue);
        }
        if tag.is("para") {
            return Ok(Step::delegate(SectionProcessor::new(), false));
        }

        warn!("Skipping unsupported <{}> in chapter {}", tag.name, self.index);
        Ok(Step::delegate(SkipProcessor::new(&tag.name), true))
    }

    fn on_end(&mut self, name: &str) -> Result<Step, ParseError> {
        if name == "usx" {
            return Ok(Step::yield_to_parent());
        }
        Ok(Step::Continue)
    }

    fn accept(&mut self, node: Node) -> Result<(), ParseError> {
        match node {
            Node::Section(section) => {
                if !section.content.is_empty() {
                    self.sections.push(section);
                }
            }
            Node::Skipped => {}
            other => return Err(other.unexpected(self.level())),
        }
        Ok(())
    }

    fn generate(self) -> Result<Node, ParseError> {
        Ok(Node::Chapter(Chapter {
            index: self.index,
            sections: self.sections,
        }))
    }
}

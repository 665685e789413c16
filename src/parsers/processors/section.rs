use tracing::warn;

use super::{Level, LevelProcessor, Node, ParagraphProcessor, ParseOptions, SkipProcessor, Step};
use crate::models::{Paragraph, Section};
use crate::parsers::error::ParseError;
use crate::parsers::events::StartTag;

/// Collects paragraphs until the next section heading. A heading that is
/// the first paragraph of the section belongs to it instead of closing it.
#[derive(Default)]
pub struct SectionProcessor {
    content: Vec<Paragraph>,
}

impl SectionProcessor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LevelProcessor for SectionProcessor {
    fn level(&self) -> Level {
        Level::Section
    }

    fn on_start(&mut self, tag: &StartTag, options: &ParseOptions) -> Result<Step, ParseError> {
        if tag.is("book") || tag.opens_chapter() {
            return Ok(Step::yield_to_parent());
        }
        if tag.is("chapter") {
            return Ok(Step::Continue);
        }
        if tag.is("para") {
            let opens_section = tag
                .attr("style")
                .map(|style| options.is_section_heading(style))
                .unwrap_or(false);
            if opens_section && !self.content.is_empty() {
                return Ok(Step::yield_to_parent());
            }
            return Ok(Step::delegate(ParagraphProcessor::start(tag)?, true));
        }

        warn!("Skipping unsupported <{}> between paragraphs", tag.name);
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
            Node::Paragraph(paragraph) => self.content.push(paragraph),
            Node::Skipped => {}
            other => return Err(other.unexpected(self.level())),
        }
        Ok(())
    }

    fn generate(self) -> Result<Node, ParseError> {
        Ok(Node::Section(Section {
            content: self.content,
        }))
    }
}

use super::{Level, LevelProcessor, Node, ParseOptions, Step};
use crate::parsers::error::ParseError;
use crate::parsers::events::StartTag;

/// Swallows an unsupported element and everything inside it.
pub struct SkipProcessor {
    name: String,
    depth: usize,
}

impl SkipProcessor {
    pub fn new(name: &str) -> Self {
        SkipProcessor {
            name: name.to_string(),
            depth: 0,
        }
    }
}

impl LevelProcessor for SkipProcessor {
    fn level(&self) -> Level {
        Level::Skip
    }

    fn on_start(&mut self, _tag: &StartTag, _options: &ParseOptions) -> Result<Step, ParseError> {
        self.depth += 1;
        Ok(Step::Continue)
    }

    fn on_end(&mut self, name: &str) -> Result<Step, ParseError> {
        if self.depth == 0 {
            if name == self.name {
                return Ok(Step::done());
            }
            return Ok(Step::yield_to_parent());
        }
        self.depth -= 1;
        Ok(Step::Continue)
    }

    fn accept(&mut self, node: Node) -> Result<(), ParseError> {
        Err(node.unexpected(self.level()))
    }

    fn generate(self) -> Result<Node, ParseError> {
        Ok(Node::Skipped)
    }
}

use super::{is_structural, CharMode, CharProcessor, Level, LevelProcessor, Node, ParseOptions, Step};
use crate::models::{push_run, CharData, NoteKind, Para};
use crate::parsers::error::ParseError;
use crate::parsers::events::StartTag;

/// A footnote or cross reference. Its body is collected by a nested char
/// frame in note mode, so a second `<note>` inside ends this one.
pub struct NoteProcessor {
    caller: String,
    style: String,
    content: Vec<CharData>,
}

impl NoteProcessor {
    pub fn start(tag: &StartTag) -> Result<Self, ParseError> {
        let caller = tag.required("caller")?.to_string();
        let style = tag.required("style")?.to_string();
        if NoteKind::from_style(&style).is_none() {
            return Err(ParseError::UnknownNoteStyle { style });
        }

        Ok(NoteProcessor {
            caller,
            style,
            content: Vec::new(),
        })
    }
}

impl LevelProcessor for NoteProcessor {
    fn level(&self) -> Level {
        Level::Note
    }

    fn on_start(&mut self, tag: &StartTag, _options: &ParseOptions) -> Result<Step, ParseError> {
        // An unterminated note ends at the next verse marker or block.
        if is_structural(tag) || tag.is("note") {
            return Ok(Step::yield_to_parent());
        }
        if tag.is("verse") || tag.is("chapter") {
            return Ok(Step::Continue);
        }
        Ok(Step::delegate(CharProcessor::new(CharMode::Note), false))
    }

    fn on_end(&mut self, name: &str) -> Result<Step, ParseError> {
        match name {
            "note" => Ok(Step::done()),
            "verse" | "chapter" => Ok(Step::Continue),
            _ => Ok(Step::yield_to_parent()),
        }
    }

    fn on_text(&mut self, _text: &str) -> Result<Step, ParseError> {
        Ok(Step::delegate(CharProcessor::new(CharMode::Note), false))
    }

    fn accept(&mut self, node: Node) -> Result<(), ParseError> {
        match node {
            Node::Inline(content) => {
                for para in content {
                    for run in para.content() {
                        push_run(&mut self.content, run.clone());
                    }
                }
            }
            other => return Err(other.unexpected(self.level())),
        }
        Ok(())
    }

    fn generate(self) -> Result<Node, ParseError> {
        let style = self.style;
        Para::note(&self.caller, &style, self.content)
            .map(Node::Note)
            .ok_or(ParseError::UnknownNoteStyle { style: style.clone() })
    }
}

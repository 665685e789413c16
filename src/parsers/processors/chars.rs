use tracing::debug;

use super::{is_structural, Level, LevelProcessor, Node, NoteProcessor, ParseOptions, Step};
use crate::models::{push_run, CharData, Para, TextElement};
use crate::parsers::error::ParseError;
use crate::parsers::events::StartTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharMode {
    /// Inside a paragraph or verse; notes are delegated to note frames.
    Paragraph,
    /// Inside a note; a nested note ends the run.
    Note,
}

/// Coalesces character data into `CharData` runs keyed by the innermost
/// `char` style. Whitespace runs collapse to a single space and leading
/// whitespace of the run is dropped.
pub struct CharProcessor {
    mode: CharMode,
    /// Open inline elements; `None` for elements kept transparent.
    open: Vec<(String, Option<String>)>,
    runs: Vec<CharData>,
    content: Vec<Para>,
    at_start: bool,
    last_was_space: bool,
}

impl CharProcessor {
    pub fn new(mode: CharMode) -> Self {
        CharProcessor {
            mode,
            open: Vec::new(),
            runs: Vec::new(),
            content: Vec::new(),
            at_start: true,
            last_was_space: false,
        }
    }

    fn current_style(&self) -> Option<&str> {
        self.open.iter().rev().find_map(|(_, style)| style.as_deref())
    }

    fn push_text(&mut self, text: &str) {
        let mut normalized = String::with_capacity(text.len());
        for ch in text.chars() {
            if ch.is_whitespace() {
                if self.at_start || self.last_was_space {
                    continue;
                }
                normalized.push(' ');
                self.last_was_space = true;
            } else {
                normalized.push(ch);
                self.at_start = false;
                self.last_was_space = false;
            }
        }
        if normalized.is_empty() {
            return;
        }
        let style = self.current_style().map(str::to_string);
        push_run(
            &mut self.runs,
            CharData {
                text: normalized,
                style,
            },
        );
    }

    fn flush(&mut self) {
        if !self.runs.is_empty() {
            self.content.push(Para::Text(TextElement {
                content: std::mem::take(&mut self.runs),
            }));
        }
    }
}

impl LevelProcessor for CharProcessor {
    fn level(&self) -> Level {
        Level::Chars
    }

    fn on_start(&mut self, tag: &StartTag, _options: &ParseOptions) -> Result<Step, ParseError> {
        if is_structural(tag) {
            return Ok(Step::yield_to_parent());
        }
        if tag.is("verse") || tag.is("chapter") {
            return Ok(Step::Continue);
        }
        if tag.is("note") {
            return match self.mode {
                CharMode::Paragraph => {
                    self.flush();
                    Ok(Step::delegate(NoteProcessor::start(tag)?, true))
                }
                CharMode::Note => Ok(Step::yield_to_parent()),
            };
        }
        if tag.is("char") {
            let style = tag.required("style")?.to_string();
            self.open.push((tag.name.clone(), Some(style)));
            return Ok(Step::Continue);
        }

        debug!("Keeping text of unsupported inline <{}>", tag.name);
        self.open.push((tag.name.clone(), None));
        Ok(Step::Continue)
    }

    fn on_end(&mut self, name: &str) -> Result<Step, ParseError> {
        // Only end milestones (`<verse eid/>`) get here for these names.
        if name == "verse" || name == "chapter" {
            return Ok(Step::Continue);
        }
        match self.open.last() {
            Some((open, _)) if open == name => {
                self.open.pop();
                Ok(Step::Continue)
            }
            // Closing tag of whatever contains this run.
            _ => Ok(Step::yield_to_parent()),
        }
    }

    fn on_text(&mut self, text: &str) -> Result<Step, ParseError> {
        self.push_text(text);
        Ok(Step::Continue)
    }

    fn accept(&mut self, node: Node) -> Result<(), ParseError> {
        match node {
            Node::Note(note) => {
                self.content.push(note);
                // Text after a note continues the run; keep its spacing.
                self.at_start = false;
                self.last_was_space = false;
            }
            other => return Err(other.unexpected(self.level())),
        }
        Ok(())
    }

    fn generate(mut self) -> Result<Node, ParseError> {
        self.flush();
        Ok(Node::Inline(self.content))
    }
}

/// Appends inline content, joining text that continues across two runs of
/// the same container.
pub fn extend_inline(target: &mut Vec<Para>, content: Vec<Para>) {
    for para in content {
        match para {
            Para::Text(next) => {
                if let Some(Para::Text(last)) = target.last_mut() {
                    for run in next.content {
                        push_run(&mut last.content, run);
                    }
                    continue;
                }
                target.push(Para::Text(next));
            }
            other => target.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(processor: &mut CharProcessor, events: &[(&str, Option<&str>)]) {
        let options = ParseOptions::default();
        for (kind, value) in events {
            match *kind {
                "text" => {
                    processor.on_text(value.unwrap()).unwrap();
                }
                "char" => {
                    let tag = StartTag::new("char", &[("style", value.unwrap())]);
                    processor.on_start(&tag, &options).unwrap();
                }
                "end" => {
                    processor.on_end("char").unwrap();
                }
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn test_same_style_runs_are_coalesced() {
        let mut processor = CharProcessor::new(CharMode::Paragraph);
        run(
            &mut processor,
            &[
                ("text", Some("In the ")),
                ("text", Some("beginning ")),
                ("char", Some("wj")),
                ("text", Some("Let there")),
                ("end", None),
                ("char", Some("wj")),
                ("text", Some(" be light")),
                ("end", None),
            ],
        );

        let Node::Inline(content) = processor.generate().unwrap() else {
            panic!("expected inline content");
        };
        assert_eq!(
            content,
            vec![Para::Text(TextElement {
                content: vec![
                    CharData::plain("In the beginning "),
                    CharData::styled("Let there be light", "wj"),
                ]
            })]
        );
    }

    #[test]
    fn test_whitespace_is_collapsed_and_leading_space_dropped() {
        let mut processor = CharProcessor::new(CharMode::Paragraph);
        run(&mut processor, &[("text", Some("\n   God\n  said  "))]);

        let Node::Inline(content) = processor.generate().unwrap() else {
            panic!("expected inline content");
        };
        assert_eq!(content[0].text(), "God said ");
    }

    #[test]
    fn test_whitespace_only_run_produces_nothing() {
        let mut processor = CharProcessor::new(CharMode::Paragraph);
        run(&mut processor, &[("text", Some("\n  \t"))]);

        let Node::Inline(content) = processor.generate().unwrap() else {
            panic!("expected inline content");
        };
        assert!(content.is_empty());
    }

    #[test]
    fn test_structural_marker_yields() {
        let mut processor = CharProcessor::new(CharMode::Paragraph);
        let verse = StartTag::new("verse", &[("number", "2")]);
        let step = processor.on_start(&verse, &ParseOptions::default()).unwrap();
        assert!(matches!(step, Step::Done { consumed: false }));
    }

    #[test]
    fn test_char_without_style_fails() {
        let mut processor = CharProcessor::new(CharMode::Paragraph);
        let result = processor.on_start(&StartTag::new("char", &[]), &ParseOptions::default());
        assert!(matches!(
            result,
            Err(ParseError::MissingRequiredAttribute { .. })
        ));
    }
}

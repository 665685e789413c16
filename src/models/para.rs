use serde::{Deserialize, Serialize};

use super::char_data::{text_of, CharData};
use super::usx::escape_attr;

/// Which family a `<note>` style belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    FootNote,
    CrossReference,
}

impl NoteKind {
    pub fn from_style(style: &str) -> Option<NoteKind> {
        match style {
            "f" | "fe" | "ef" => Some(NoteKind::FootNote),
            "x" | "ex" => Some(NoteKind::CrossReference),
            _ => None,
        }
    }

    /// Char style carrying the origin reference inside a note of this kind.
    pub fn origin_style(self) -> &'static str {
        match self {
            NoteKind::FootNote => "fr",
            NoteKind::CrossReference => "xo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextElement {
    pub content: Vec<CharData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootNote {
    pub caller: String,
    pub style: String,
    pub origin: Option<String>,
    pub content: Vec<CharData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    pub caller: String,
    pub style: String,
    pub origin: Option<String>,
    pub content: Vec<CharData>,
}

/// Inline content unit of a paragraph or verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Para {
    Text(TextElement),
    FootNote(FootNote),
    CrossReference(CrossReference),
}

impl Para {
    /// Builds the note variant for `style`, deriving the origin reference
    /// from the first origin-styled run. Returns `None` for unknown styles.
    pub fn note(caller: &str, style: &str, content: Vec<CharData>) -> Option<Para> {
        let kind = NoteKind::from_style(style)?;
        let origin = content
            .iter()
            .find(|run| run.style.as_deref() == Some(kind.origin_style()))
            .map(|run| run.text.trim().to_string());

        Some(match kind {
            NoteKind::FootNote => Para::FootNote(FootNote {
                caller: caller.to_string(),
                style: style.to_string(),
                origin,
                content,
            }),
            NoteKind::CrossReference => Para::CrossReference(CrossReference {
                caller: caller.to_string(),
                style: style.to_string(),
                origin,
                content,
            }),
        })
    }

    pub fn content(&self) -> &[CharData] {
        match self {
            Para::Text(t) => &t.content,
            Para::FootNote(n) => &n.content,
            Para::CrossReference(x) => &x.content,
        }
    }

    pub fn text(&self) -> String {
        text_of(self.content())
    }

    pub fn is_note(&self) -> bool {
        !matches!(self, Para::Text(_))
    }

    pub fn to_usx(&self) -> String {
        match self {
            Para::Text(t) => t.content.iter().map(CharData::to_usx).collect(),
            Para::FootNote(FootNote {
                caller,
                style,
                content,
                ..
            })
            | Para::CrossReference(CrossReference {
                caller,
                style,
                content,
                ..
            }) => {
                let body: String = content.iter().map(CharData::to_usx).collect();
                format!(
                    "<note caller=\"{}\" style=\"{}\">{}</note>",
                    escape_attr(caller),
                    escape_attr(style),
                    body
                )
            }
        }
    }
}

/// Text of the non-note content, which is what a reader sees inline.
pub fn main_text(content: &[Para]) -> String {
    content
        .iter()
        .filter(|p| !p.is_note())
        .map(Para::text)
        .collect()
}

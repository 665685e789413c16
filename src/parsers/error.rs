use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingRequiredAttribute { element: String, attribute: String },

    #[error("Unparsable verse number '{value}'")]
    UnparsableVerseNumber { value: String },

    #[error("Unparsable verse range '{value}'")]
    UnparsableVerseRange { value: String },

    #[error("<book> element has no code")]
    MissingBookCode,

    #[error("Chapter marker in {book} has no usable number")]
    MissingChapterIndex { book: String },

    #[error("Unknown note style '{style}'")]
    UnknownNoteStyle { style: String },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Malformed USX structure: {0}")]
    Structure(String),
}

impl ParseError {
    pub fn missing(element: &str, attribute: &str) -> Self {
        ParseError::MissingRequiredAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

/// A book that could not be parsed. `code` is known unless the `<book>`
/// element itself was broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFailure {
    pub code: Option<String>,
    pub error: ParseError,
}

impl fmt::Display for BookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for BookFailure {}

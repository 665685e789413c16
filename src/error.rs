use thiserror::Error;

use crate::database::StoreError;
use crate::parsers::ParseError;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("USX parsing error: {0}")]
    Parse(#[from] ParseError),

    #[error("No coherent paragraph alignment for {book} {unit}")]
    MatchFailure { book: String, unit: String },

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;

impl serde::Serialize for EditorError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

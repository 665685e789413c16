//! Streaming USX import: `events` tokenizes, `processors` hold one parser
//! per document level, `driver` runs the frame stack.

mod driver;
mod error;
pub mod events;
pub mod processors;

pub use driver::{parse_book, parse_usx, ParsedDocument, UsxParser};
pub use error::{BookFailure, ParseError};
pub use events::{StartTag, UsxEvent, XmlEventSource};
pub use processors::{parse_verse_number, ParseOptions};

pub mod commands;
pub mod config;
pub mod database;
mod error;
pub mod history;
pub mod logger;
pub mod matching;
pub mod models;
pub mod parsers;

pub use error::{EditorError, Result};

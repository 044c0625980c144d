//! Error types for parsing and content extraction

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while turning a file into a `RawParseOutput`
#[derive(Debug, Clone)]
pub enum ParseError {
    /// IO error when reading the file
    Io { path: PathBuf, message: String },
    /// The file content could not be tokenized
    Malformed { path: PathBuf, message: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Io { path, message } => {
                write!(f, "IO error reading {}: {}", path.display(), message)
            }
            ParseError::Malformed { path, message } => {
                write!(f, "Malformed document {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors that can occur while extracting content from a document view
#[derive(Debug, Clone)]
pub enum ExtractError {
    /// No heading with the requested text exists in the document
    HeadingMissing(String),
    /// No block anchor with the requested id exists in the document
    UnknownAnchor(String),
    /// A block anchor points at a line number outside the document
    InvalidBlockIndex { line: usize, line_count: usize },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::HeadingMissing(text) => {
                write!(f, "heading '{}' not found", text)
            }
            ExtractError::UnknownAnchor(id) => {
                write!(f, "block anchor '^{}' not found", id)
            }
            ExtractError::InvalidBlockIndex { line, line_count } => {
                write!(
                    f,
                    "block anchor points at line {} but document has {} lines",
                    line, line_count
                )
            }
        }
    }
}

impl std::error::Error for ExtractError {}

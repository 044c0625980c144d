//! Error types for the engine
//!
//! Per-link failures never surface as errors here: they are captured on the
//! link's report entry. The only fatal condition is failing to read the
//! top-level source document of a run.

use std::fmt;
use std::path::PathBuf;

/// Classification of a failed target path resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionFailure {
    NotFound,
    Ambiguous,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionFailure::NotFound => write!(f, "not_found"),
            ResolutionFailure::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// Fatal engine errors
#[derive(Debug, Clone)]
pub enum EngineError {
    /// The top-level source document could not be read or tokenized
    SourceUnreadable { path: PathBuf, message: String },
    /// Scanning the lookup root failed
    LookupScan { root: PathBuf, message: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::SourceUnreadable { path, message } => {
                write!(f, "cannot read source document {}: {}", path.display(), message)
            }
            EngineError::LookupScan { root, message } => {
                write!(f, "cannot scan lookup root {}: {}", root.display(), message)
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Failure to parse a cached document.
///
/// Clonable because the cache hands the same failure to every caller that
/// joined the in-flight parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheError {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse failure for {}: {}", self.path.display(), self.message)
    }
}

impl std::error::Error for CacheError {}

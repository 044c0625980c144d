//! Short-filename lookup service
//!
//! The resolver's last-resort strategy: map a bare filename like `guide.md`
//! to an absolute path somewhere under the run's root. The trait is the seam;
//! the shipped implementation scans the root once up front and answers from
//! memory for the rest of the run.

use crate::error::EngineError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Why a lookup did not produce a usable path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupReason {
    /// The filename exists in more than one place
    Duplicate,
    NotFound,
}

/// Result of one filename lookup
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub found: bool,
    pub path: Option<PathBuf>,
    pub reason: Option<LookupReason>,
}

impl LookupOutcome {
    pub fn found(path: PathBuf) -> Self {
        LookupOutcome {
            found: true,
            path: Some(path),
            reason: None,
        }
    }

    pub fn missing(reason: LookupReason) -> Self {
        LookupOutcome {
            found: false,
            path: None,
            reason: Some(reason),
        }
    }
}

pub trait FilenameLookup: Send + Sync {
    fn resolve(&self, filename: &str) -> LookupOutcome;

    /// All known short filenames, for suggestion generation
    fn known_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Lookup backed by a one-time recursive scan of a root directory
pub struct DirectoryLookup {
    names: HashMap<String, Vec<PathBuf>>,
}

impl DirectoryLookup {
    /// Scan `root` for Markdown files, indexing them by bare filename.
    pub fn scan(root: &Path) -> Result<Self, EngineError> {
        let mut names: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| EngineError::LookupScan {
                root: root.to_path_buf(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names
                    .entry(name.to_string())
                    .or_default()
                    .push(path.to_path_buf());
            }
        }
        Ok(DirectoryLookup { names })
    }

    /// An empty lookup that never resolves anything
    pub fn empty() -> Self {
        DirectoryLookup {
            names: HashMap::new(),
        }
    }
}

impl FilenameLookup for DirectoryLookup {
    fn resolve(&self, filename: &str) -> LookupOutcome {
        match self.names.get(filename).map(Vec::as_slice) {
            Some([single]) => LookupOutcome::found(single.clone()),
            Some([_, ..]) => LookupOutcome::missing(LookupReason::Duplicate),
            _ => LookupOutcome::missing(LookupReason::NotFound),
        }
    }

    fn known_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.keys().cloned().collect();
        names.sort();
        names
    }
}

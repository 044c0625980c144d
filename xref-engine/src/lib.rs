//! Link validation and content extraction engine
//!
//! This crate wires the xref pipeline together: a single-flight document
//! cache feeds the link resolver, whose enriched links flow through the
//! eligibility chain into the extraction engine. One `Workspace` owns all of
//! it for the lifetime of one run; nothing persists past that.
//!
//! The file structure:
//!     .
//!     ├── cache.rs        # single-flight parsed-document cache
//!     ├── lookup.rs       # short-filename lookup collaborator
//!     ├── resolver.rs     # multi-strategy path resolution + enrichment
//!     ├── eligibility.rs  # priority-ordered extraction rules
//!     ├── extract.rs      # dedup, report, stats
//!     ├── options.rs      # per-run extraction options
//!     ├── error.rs
//!     └── lib.rs          # Workspace facade

pub mod cache;
pub mod eligibility;
pub mod error;
pub mod extract;
pub mod lookup;
pub mod options;
pub mod resolver;

pub use cache::{normalize_path, DocumentCache, DocumentParser, MarkdownParser};
pub use eligibility::{EligibilityChain, EligibilityRule};
pub use error::{CacheError, EngineError, ResolutionFailure};
pub use extract::{
    content_id, ContentBlocks, ExtractedContentBlock, ExtractionEngine, ExtractionReport,
    ExtractionResult, ExtractionStats, LinkStatus, ProcessedLinkEntry, SourceOccurrence,
};
pub use lookup::{DirectoryLookup, FilenameLookup, LookupOutcome, LookupReason};
pub use options::ExtractOptions;
pub use resolver::{LinkResolver, ValidationReport};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use xref_parser::EnrichedLinkReference;

/// One run's worth of validation and extraction machinery.
///
/// All components share one `DocumentCache`, so a document referenced during
/// validation is never re-parsed during extraction.
pub struct Workspace {
    resolver: LinkResolver,
    engine: ExtractionEngine,
}

impl Workspace {
    /// A workspace rooted at `root`, with the filename lookup backed by a
    /// one-time scan of that root.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let root = root.into();
        let lookup = Arc::new(DirectoryLookup::scan(&root)?);
        Ok(Self::with_lookup(root, lookup))
    }

    /// A workspace with a caller-supplied lookup collaborator.
    pub fn with_lookup(root: PathBuf, lookup: Arc<dyn FilenameLookup>) -> Self {
        Self::with_parts(root, lookup, DocumentCache::markdown())
    }

    /// A workspace over a caller-supplied cache (tests inject counting or
    /// failing parsers through here).
    pub fn with_parts(root: PathBuf, lookup: Arc<dyn FilenameLookup>, cache: DocumentCache) -> Self {
        Workspace {
            resolver: LinkResolver::new(cache.clone(), lookup, root),
            engine: ExtractionEngine::new(cache),
        }
    }

    /// Adjust the similarity floor used for anchor and filename suggestions.
    pub fn with_suggestion_threshold(mut self, threshold: f32) -> Self {
        self.resolver = self.resolver.with_suggestion_threshold(threshold);
        self
    }

    /// Validate every link of one document.
    pub async fn validate_document(&self, path: &Path) -> Result<ValidationReport, EngineError> {
        self.resolver.validate_document(path).await
    }

    /// Validate, then extract everything eligible. The shared cache
    /// guarantees each involved document is parsed at most once across both
    /// phases.
    pub async fn extract_from_document(
        &self,
        path: &Path,
        options: &ExtractOptions,
    ) -> Result<(ValidationReport, ExtractionResult), EngineError> {
        let report = self.resolver.validate_document(path).await?;
        let result = self.engine.extract_from_links(&report.links, options).await;
        Ok((report, result))
    }

    /// Extract from links that were already validated (direct single-target
    /// extraction without re-running validation).
    pub async fn extract_from_links(
        &self,
        links: &[EnrichedLinkReference],
        options: &ExtractOptions,
    ) -> ExtractionResult {
        self.engine.extract_from_links(links, options).await
    }
}

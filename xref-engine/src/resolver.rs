//! Link validation and enrichment
//!
//! For every outgoing link of a document: settle on a target path via an
//! ordered strategy list, confirm the anchor against the target's parsed
//! view, and wrap the link in an `EnrichedLinkReference` carrying the
//! outcome. The summary is always derived from the enriched array, so counts
//! cannot disagree with the links they describe.
//!
//! Strategy order, first success wins:
//!   1. direct join against the source document's directory
//!   2. symlink-aware canonicalization of that spelling
//!   3. repository-root-absolute convention (leading `/`)
//!   4. the short-filename lookup service
//!
//! A link that only resolved through 2-4 still validates, but as a warning
//! with a `pathConversion` suggestion carrying the preferred spelling.

use crate::cache::{normalize_path, DocumentCache};
use crate::error::{EngineError, ResolutionFailure};
use crate::lookup::{FilenameLookup, LookupReason};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use xref_parser::anchor::normalize_reference;
use xref_parser::view::DEFAULT_SUGGESTION_THRESHOLD;
use xref_parser::{
    EnrichedLinkReference, LinkReference, LinkScope, ParsedDocumentView, ValidationOutcome,
    ValidationSummary,
};

/// Enriched links plus the summary derived from them
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub summary: ValidationSummary,
    pub links: Vec<EnrichedLinkReference>,
}

pub struct LinkResolver {
    cache: DocumentCache,
    lookup: Arc<dyn FilenameLookup>,
    root: PathBuf,
    suggestion_threshold: f32,
}

/// How a target path was found
enum Resolution {
    /// Strategy 1: the spelling as written works
    Direct(PathBuf),
    /// Strategy 2: the spelling works only after canonicalization
    Canonical(PathBuf),
    /// Strategy 3: leading `/` resolved against the repository root
    RootRelative(PathBuf),
    /// Strategy 4: the filename lookup service found it
    Lookup(PathBuf),
    Failed {
        reason: ResolutionFailure,
        suggestion: Option<String>,
    },
}

impl LinkResolver {
    pub fn new(cache: DocumentCache, lookup: Arc<dyn FilenameLookup>, root: PathBuf) -> Self {
        LinkResolver {
            cache,
            lookup,
            root,
            suggestion_threshold: DEFAULT_SUGGESTION_THRESHOLD,
        }
    }

    pub fn with_suggestion_threshold(mut self, threshold: f32) -> Self {
        self.suggestion_threshold = threshold;
        self
    }

    /// Validate every link of `path`, returning enriched links in document
    /// order plus the derived summary. Only failure to read `path` itself is
    /// fatal.
    pub async fn validate_document(&self, path: &Path) -> Result<ValidationReport, EngineError> {
        let source = self
            .cache
            .resolve(path)
            .await
            .map_err(|e| EngineError::SourceUnreadable {
                path: path.to_path_buf(),
                message: e.message,
            })?;

        // Target resolution for the links may hit the cache concurrently;
        // join_all keeps the results in input order.
        let futures = source
            .links()
            .iter()
            .map(|link| self.validate_link(link.clone(), &source));
        let links: Vec<EnrichedLinkReference> = join_all(futures).await;

        let summary = ValidationSummary::from_links(&links);
        Ok(ValidationReport { summary, links })
    }

    /// Validate already-tokenized links against their source view
    pub async fn validate_links(
        &self,
        links: &[LinkReference],
        source: &Arc<ParsedDocumentView>,
    ) -> Vec<EnrichedLinkReference> {
        join_all(
            links
                .iter()
                .map(|link| self.validate_link(link.clone(), source)),
        )
        .await
    }

    async fn validate_link(
        &self,
        link: LinkReference,
        source: &Arc<ParsedDocumentView>,
    ) -> EnrichedLinkReference {
        match link.scope {
            LinkScope::Internal => self.validate_internal(link, source),
            LinkScope::CrossDocument => self.validate_cross_document(link).await,
        }
    }

    fn validate_internal(
        &self,
        link: LinkReference,
        source: &Arc<ParsedDocumentView>,
    ) -> EnrichedLinkReference {
        let anchor = link.anchor_text.as_deref().unwrap_or_default();
        let normalized = normalize_reference(anchor);
        let validation = if source.has_anchor(&normalized) {
            ValidationOutcome::Valid
        } else {
            warn!(anchor = %anchor, source = %link.source_path.display(), "internal anchor not found");
            ValidationOutcome::Error {
                message: format!("anchor '{}' not found in this document", anchor),
                suggestion: source
                    .find_similar_anchors(&normalized, self.suggestion_threshold)
                    .into_iter()
                    .next(),
                path_conversion: None,
            }
        };
        EnrichedLinkReference { link, validation }
    }

    async fn validate_cross_document(&self, link: LinkReference) -> EnrichedLinkReference {
        let raw = link.target_raw.clone().unwrap_or_default();
        let source_dir = link
            .source_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let (target, mut validation) = match self.resolve_target(&raw, &source_dir) {
            Resolution::Direct(path) => (Some(path), ValidationOutcome::Valid),
            Resolution::Canonical(path) => {
                let outcome = ValidationOutcome::Warning {
                    message: format!("'{}' resolves through a non-canonical path", raw),
                    suggestion: None,
                    path_conversion: relative_spelling(&path, &source_dir),
                };
                (Some(path), outcome)
            }
            Resolution::RootRelative(path) => {
                let outcome = ValidationOutcome::Warning {
                    message: format!("'{}' resolved via the repository-root convention", raw),
                    suggestion: None,
                    path_conversion: relative_spelling(&path, &source_dir),
                };
                (Some(path), outcome)
            }
            Resolution::Lookup(path) => {
                let outcome = ValidationOutcome::Warning {
                    message: format!("'{}' found by filename lookup", raw),
                    suggestion: None,
                    path_conversion: relative_spelling(&path, &source_dir),
                };
                (Some(path), outcome)
            }
            Resolution::Failed { reason, suggestion } => {
                warn!(target = %raw, %reason, "target path resolution failed");
                let message = match reason {
                    ResolutionFailure::NotFound => format!("target '{}' not found", raw),
                    ResolutionFailure::Ambiguous => format!(
                        "target '{}' is ambiguous: multiple files share that name",
                        raw
                    ),
                };
                (
                    None,
                    ValidationOutcome::Error {
                        message,
                        suggestion,
                        path_conversion: None,
                    },
                )
            }
        };

        let mut enriched = link;
        if let Some(target_path) = &target {
            enriched.target_absolute = Some(target_path.clone());
            enriched.target_relative = relative_spelling(target_path, &source_dir);

            if let Some(anchor) = enriched.anchor_text.clone() {
                validation = self
                    .validate_target_anchor(&anchor, target_path, &raw, validation)
                    .await;
            }
        }

        EnrichedLinkReference {
            link: enriched,
            validation,
        }
    }

    /// Confirm the anchor exists in the target document. A hit keeps the path
    /// outcome (valid or warning); a miss or an unparseable target overrides
    /// it with an error.
    async fn validate_target_anchor(
        &self,
        anchor: &str,
        target: &Path,
        raw: &str,
        path_outcome: ValidationOutcome,
    ) -> ValidationOutcome {
        let view = match self.cache.resolve(target).await {
            Ok(view) => view,
            Err(e) => {
                warn!(target = %target.display(), "target document failed to parse");
                return ValidationOutcome::Error {
                    message: format!("cannot parse target '{}': {}", raw, e.message),
                    suggestion: None,
                    path_conversion: None,
                };
            }
        };

        let normalized = normalize_reference(anchor);
        if view.has_anchor(&normalized) {
            path_outcome
        } else {
            warn!(anchor = %anchor, target = %target.display(), "anchor not found in target");
            ValidationOutcome::Error {
                message: format!("anchor '{}' not found in '{}'", anchor, raw),
                suggestion: view
                    .find_similar_anchors(&normalized, self.suggestion_threshold)
                    .into_iter()
                    .next(),
                path_conversion: None,
            }
        }
    }

    fn resolve_target(&self, raw: &str, source_dir: &Path) -> Resolution {
        // Strategy 1: the path as written, lexically normalized
        let spelled = source_dir.join(raw);
        let direct = normalize_path(&spelled);
        if direct.is_file() {
            debug!(target = %raw, "resolved directly");
            return Resolution::Direct(direct);
        }

        // Strategy 2: let the filesystem resolve symlinks and oddities
        if let Ok(real) = spelled.canonicalize() {
            if real.is_file() {
                debug!(target = %raw, real = %real.display(), "resolved canonically");
                return Resolution::Canonical(real);
            }
        }

        // Strategy 3: leading `/` means "relative to the repository root"
        if let Some(root_relative) = raw.strip_prefix('/') {
            let candidate = normalize_path(&self.root.join(root_relative));
            if candidate.is_file() {
                debug!(target = %raw, "resolved via repository root");
                return Resolution::RootRelative(candidate);
            }
        }

        // Strategy 4: delegate to the filename lookup service
        let filename = Path::new(raw)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(raw);
        let outcome = self.lookup.resolve(filename);
        if let Some(path) = outcome.path {
            debug!(target = %raw, found = %path.display(), "resolved via filename lookup");
            return Resolution::Lookup(normalize_path(&path));
        }

        let reason = match outcome.reason {
            Some(LookupReason::Duplicate) => ResolutionFailure::Ambiguous,
            _ => ResolutionFailure::NotFound,
        };
        let suggestion = match reason {
            ResolutionFailure::Ambiguous => None,
            ResolutionFailure::NotFound => self.closest_filename(filename),
        };
        Resolution::Failed { reason, suggestion }
    }

    /// The closest known filename by prefix or character similarity
    fn closest_filename(&self, filename: &str) -> Option<String> {
        let names = self.lookup.known_names();
        let mut best: Option<(f32, &String)> = None;
        for name in &names {
            let mut score = similarity(filename, name);
            if name.starts_with(filename.trim_end_matches(".md")) {
                score = score.max(0.9);
            }
            if score >= self.suggestion_threshold
                && best.map(|(s, _)| score > s).unwrap_or(true)
            {
                best = Some((score, name));
            }
        }
        best.map(|(_, name)| name.clone())
    }
}

fn similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return 1.0;
    }
    similar::TextDiff::from_chars(a, b).ratio()
}

fn relative_spelling(target: &Path, source_dir: &Path) -> Option<String> {
    pathdiff::diff_paths(target, source_dir).map(|p| p.display().to_string())
}

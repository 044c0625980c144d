//! Content extraction, deduplication, and reporting
//!
//! Processes enriched links in document order. Each eligible, validly
//! resolved link yields the target's section / block line / full text; the
//! extracted bytes are keyed by a truncated SHA-256 so byte-identical
//! excerpts collapse into one content block with multiple source
//! occurrences. Per-link failures are recorded on the link's report entry
//! and never abort the batch.

use crate::cache::DocumentCache;
use crate::eligibility::EligibilityChain;
use crate::options::ExtractOptions;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};
use xref_parser::anchor::normalize_reference;
use xref_parser::{AnchorKind, EnrichedLinkReference, LinkScope};

/// One link that produced (part of) a content block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOccurrence {
    pub target_path: PathBuf,
    pub anchor: Option<String>,
    pub anchor_kind: Option<AnchorKind>,
}

/// A deduplicated piece of extracted text and everywhere it came from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContentBlock {
    pub content: String,
    pub content_length: usize,
    pub source_links: Vec<SourceOccurrence>,
}

/// Content blocks keyed by content identifier, plus the running total length
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentBlocks {
    #[serde(flatten)]
    pub blocks: BTreeMap<String, ExtractedContentBlock>,
    #[serde(rename = "_totalCharacterLength")]
    pub total_character_length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Skipped,
    Extracted,
    Error,
}

/// Per-link outcome in the final report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedLinkEntry {
    pub source_link: EnrichedLinkReference,
    pub content_id: Option<String>,
    pub status: LinkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub processed_links: Vec<ProcessedLinkEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    pub total_links: usize,
    pub unique_content: usize,
    pub duplicate_content_detected: usize,
    pub characters_saved: usize,
    pub compression_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub content_blocks: ContentBlocks,
    pub report: ExtractionReport,
    pub stats: ExtractionStats,
}

impl ExtractionResult {
    /// Whether at least one link reached `extracted`
    pub fn succeeded(&self) -> bool {
        self.report
            .processed_links
            .iter()
            .any(|entry| entry.status == LinkStatus::Extracted)
    }
}

/// Fixed-width content identifier: truncated hex SHA-256 of the text bytes.
///
/// At documentation scale a 16-character (64-bit) prefix makes collisions a
/// negligible risk; strict callers can widen it via the options.
pub fn content_id(text: &str, width: usize) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(width);
    encoded
}

pub struct ExtractionEngine {
    cache: DocumentCache,
    chain: EligibilityChain,
}

impl ExtractionEngine {
    pub fn new(cache: DocumentCache) -> Self {
        ExtractionEngine {
            cache,
            chain: EligibilityChain::standard(),
        }
    }

    /// Process enriched links in input order. Never fails as a whole; every
    /// link lands in the report with a status.
    pub async fn extract_from_links(
        &self,
        links: &[EnrichedLinkReference],
        options: &ExtractOptions,
    ) -> ExtractionResult {
        let mut blocks: BTreeMap<String, ExtractedContentBlock> = BTreeMap::new();
        let mut processed_links = Vec::with_capacity(links.len());

        for link in links {
            let entry = self.process_link(link, options, &mut blocks).await;
            processed_links.push(entry);
        }

        let stats = compute_stats(links.len(), &blocks);
        let total_character_length = blocks.values().map(|b| b.content_length).sum();

        ExtractionResult {
            content_blocks: ContentBlocks {
                blocks,
                total_character_length,
            },
            report: ExtractionReport { processed_links },
            stats,
        }
    }

    async fn process_link(
        &self,
        link: &EnrichedLinkReference,
        options: &ExtractOptions,
        blocks: &mut BTreeMap<String, ExtractedContentBlock>,
    ) -> ProcessedLinkEntry {
        if link.validation.is_error() {
            return skipped(link, format!("validation failed: {}", link.validation.message()));
        }

        let decision = self.chain.decide(link, options);
        if !decision.eligible {
            debug!(link = %link.link.matched_text, reason = %decision.reason, "link skipped");
            return skipped(link, decision.reason);
        }

        let target = match link.link.scope {
            LinkScope::Internal => Some(link.link.source_path.clone()),
            LinkScope::CrossDocument => link.link.target_absolute.clone(),
        };
        let Some(target) = target else {
            return errored(link, "link has no resolved target path".to_string());
        };

        let view = match self.cache.resolve(&target).await {
            Ok(view) => view,
            Err(e) => {
                warn!(target = %target.display(), "target unavailable during extraction");
                return errored(link, e.to_string());
            }
        };

        let content = match link.link.anchor_kind {
            Some(AnchorKind::Header) => {
                let anchor = link.link.anchor_text.as_deref().unwrap_or_default();
                let normalized = normalize_reference(anchor);
                let heading = view
                    .heading_for_anchor(&normalized)
                    .map(str::to_string)
                    .unwrap_or(normalized);
                view.extract_section(&heading)
            }
            Some(AnchorKind::Block) => {
                let anchor = link.link.anchor_text.as_deref().unwrap_or_default();
                view.extract_block(&normalize_reference(anchor))
            }
            None => Ok(view.extract_full_content().to_string()),
        };

        let content = match content {
            Ok(content) => content,
            Err(e) => {
                warn!(link = %link.link.matched_text, error = %e, "extraction failed");
                return errored(link, e.to_string());
            }
        };

        let id = content_id(&content, options.content_id_width);
        let occurrence = SourceOccurrence {
            target_path: target,
            anchor: link.link.anchor_text.clone(),
            anchor_kind: link.link.anchor_kind,
        };
        blocks
            .entry(id.clone())
            .or_insert_with(|| ExtractedContentBlock {
                content_length: content.chars().count(),
                content,
                source_links: Vec::new(),
            })
            .source_links
            .push(occurrence);

        ProcessedLinkEntry {
            source_link: link.clone(),
            content_id: Some(id),
            status: LinkStatus::Extracted,
            reason: None,
        }
    }
}

fn skipped(link: &EnrichedLinkReference, reason: String) -> ProcessedLinkEntry {
    ProcessedLinkEntry {
        source_link: link.clone(),
        content_id: None,
        status: LinkStatus::Skipped,
        reason: Some(reason),
    }
}

fn errored(link: &EnrichedLinkReference, reason: String) -> ProcessedLinkEntry {
    ProcessedLinkEntry {
        source_link: link.clone(),
        content_id: None,
        status: LinkStatus::Error,
        reason: Some(reason),
    }
}

fn compute_stats(
    total_links: usize,
    blocks: &BTreeMap<String, ExtractedContentBlock>,
) -> ExtractionStats {
    let unique_content = blocks.len();
    let occurrences: usize = blocks.values().map(|b| b.source_links.len()).sum();
    let duplicate_content_detected = occurrences.saturating_sub(unique_content);
    let characters_saved: usize = blocks
        .values()
        .map(|b| b.content_length * b.source_links.len().saturating_sub(1))
        .sum();
    let total_unique: usize = blocks.values().map(|b| b.content_length).sum();
    let denominator = total_unique + characters_saved;
    let compression_ratio = if denominator == 0 {
        0.0
    } else {
        characters_saved as f64 / denominator as f64
    };

    ExtractionStats {
        total_links,
        unique_content,
        duplicate_content_detected,
        characters_saved,
        compression_ratio,
    }
}

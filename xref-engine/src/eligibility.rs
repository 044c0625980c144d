//! Extraction eligibility rules
//!
//! An ordered chain of independent rules; the first rule with an opinion
//! wins. The order is load-bearing: markers dominate the anchored-link
//! default and the whole-file flag, and the anchored default must never fire
//! for a whole-document link. With no opinion anywhere, the fallback is
//! ineligible.

use crate::options::ExtractOptions;
use xref_parser::{EligibilityDecision, EnrichedLinkReference, ExtractionMarker};

pub trait EligibilityRule: Send + Sync {
    fn name(&self) -> &str;

    /// `None` means "no opinion, ask the next rule"
    fn evaluate(
        &self,
        link: &EnrichedLinkReference,
        options: &ExtractOptions,
    ) -> Option<EligibilityDecision>;
}

/// `<!-- xref:stop -->` makes a link ineligible, overriding everything
struct StopMarkerRule;

impl EligibilityRule for StopMarkerRule {
    fn name(&self) -> &str {
        "stop-marker"
    }

    fn evaluate(
        &self,
        link: &EnrichedLinkReference,
        _options: &ExtractOptions,
    ) -> Option<EligibilityDecision> {
        (link.link.marker == Some(ExtractionMarker::Stop)).then(|| EligibilityDecision {
            eligible: false,
            reason: "stop marker on source line".to_string(),
        })
    }
}

/// `<!-- xref:force -->` makes a link eligible regardless of defaults and flags
struct ForceMarkerRule;

impl EligibilityRule for ForceMarkerRule {
    fn name(&self) -> &str {
        "force-marker"
    }

    fn evaluate(
        &self,
        link: &EnrichedLinkReference,
        _options: &ExtractOptions,
    ) -> Option<EligibilityDecision> {
        (link.link.marker == Some(ExtractionMarker::Force)).then(|| EligibilityDecision {
            eligible: true,
            reason: "force marker on source line".to_string(),
        })
    }
}

/// Links addressing an anchor are eligible by default
struct AnchoredLinkRule;

impl EligibilityRule for AnchoredLinkRule {
    fn name(&self) -> &str {
        "anchored-default"
    }

    fn evaluate(
        &self,
        link: &EnrichedLinkReference,
        _options: &ExtractOptions,
    ) -> Option<EligibilityDecision> {
        link.link.has_anchor().then(|| EligibilityDecision {
            eligible: true,
            reason: "anchored link is eligible by default".to_string(),
        })
    }
}

/// Whole-document links follow the run's include-whole-files flag
struct WholeFileRule;

impl EligibilityRule for WholeFileRule {
    fn name(&self) -> &str {
        "whole-file-flag"
    }

    fn evaluate(
        &self,
        link: &EnrichedLinkReference,
        options: &ExtractOptions,
    ) -> Option<EligibilityDecision> {
        if link.link.has_anchor() {
            return None;
        }
        Some(if options.include_whole_files {
            EligibilityDecision {
                eligible: true,
                reason: "whole-file links enabled for this run".to_string(),
            }
        } else {
            EligibilityDecision {
                eligible: false,
                reason: "whole-file links disabled; no anchor to extract".to_string(),
            }
        })
    }
}

pub struct EligibilityChain {
    rules: Vec<Box<dyn EligibilityRule>>,
}

impl EligibilityChain {
    /// The standard chain in its required priority order
    pub fn standard() -> Self {
        EligibilityChain {
            rules: vec![
                Box::new(StopMarkerRule),
                Box::new(ForceMarkerRule),
                Box::new(AnchoredLinkRule),
                Box::new(WholeFileRule),
            ],
        }
    }

    /// First rule with an opinion wins; the chain always decides.
    pub fn decide(
        &self,
        link: &EnrichedLinkReference,
        options: &ExtractOptions,
    ) -> EligibilityDecision {
        self.rules
            .iter()
            .find_map(|rule| rule.evaluate(link, options))
            .unwrap_or(EligibilityDecision {
                eligible: false,
                reason: "no eligibility rule matched".to_string(),
            })
    }
}

impl Default for EligibilityChain {
    fn default() -> Self {
        Self::standard()
    }
}

//! Data model shared across the xref pipeline
//!
//! Everything here is created once by the tokenizer (or, for the enriched
//! variants, once by the validator) and never mutated afterwards. Validation
//! does not write into `LinkReference`; it produces a new
//! `EnrichedLinkReference` carrying the resolved paths and the outcome, so no
//! two components ever alias mutable link state.
//!
//! Serialized field names are camelCase: these records are the wire contract
//! consumed by downstream tooling.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Syntax the link was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStyle {
    /// `[text](target)`
    Inline,
    /// `[[target#anchor|alias]]`
    Wiki,
}

/// Whether a link stays inside its own document or crosses into another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkScope {
    Internal,
    CrossDocument,
}

/// Kind of anchor a link points at (or an anchor definition declares)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorKind {
    /// A heading; addressable by raw text or slug
    Header,
    /// A `^id` block marker; addresses a single source line
    Block,
}

/// Extraction marker scanned from the same source line as the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMarker {
    /// `<!-- xref:force -->`: extract regardless of defaults and flags
    Force,
    /// `<!-- xref:stop -->`: never extract, overrides everything
    Stop,
}

/// One outgoing link as written in a source document.
///
/// `target_absolute` and `target_relative` stay `None` until the resolver has
/// settled on a target; the tokenizer only fills `target_raw`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReference {
    pub style: LinkStyle,
    pub scope: LinkScope,
    pub anchor_kind: Option<AnchorKind>,
    pub source_path: PathBuf,
    /// Target path exactly as written, `None` for internal links
    pub target_raw: Option<String>,
    /// Absolute target path, filled by resolution
    pub target_absolute: Option<PathBuf>,
    /// Target path relative to the source document's directory, filled by resolution
    pub target_relative: Option<String>,
    /// Anchor text as written (undecoded), `None` for whole-document links
    pub anchor_text: Option<String>,
    pub display_text: String,
    /// The exact source text the tokenizer matched
    pub matched_text: String,
    /// 1-based source line
    pub line: usize,
    /// 1-based source column
    pub column: usize,
    pub marker: Option<ExtractionMarker>,
}

impl LinkReference {
    /// Whether the link addresses an anchor rather than a whole document
    pub fn has_anchor(&self) -> bool {
        self.anchor_kind.is_some()
    }
}

/// One anchor declaration found in a document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorDefinition {
    pub kind: AnchorKind,
    /// Identifier as declared: heading text for headers, id for blocks
    pub id: String,
    /// Alternate escaped spelling, only when it differs from `id`
    pub escaped_id: Option<String>,
    /// The full matched declaration text
    pub matched_text: String,
    /// 1-based source line
    pub line: usize,
    /// 1-based source column
    pub column: usize,
}

impl AnchorDefinition {
    /// Whether `id` addresses this anchor under either spelling
    pub fn matches(&self, id: &str) -> bool {
        self.id == id || self.escaped_id.as_deref() == Some(id)
    }
}

/// Outcome attached to a link by validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Valid,
    Warning {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
        #[serde(rename = "pathConversion", skip_serializing_if = "Option::is_none")]
        path_conversion: Option<String>,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
        #[serde(rename = "pathConversion", skip_serializing_if = "Option::is_none")]
        path_conversion: Option<String>,
    },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ValidationOutcome::Warning { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ValidationOutcome::Error { .. })
    }

    /// The message for warning/error outcomes, empty for valid ones
    pub fn message(&self) -> &str {
        match self {
            ValidationOutcome::Valid => "",
            ValidationOutcome::Warning { message, .. } => message,
            ValidationOutcome::Error { message, .. } => message,
        }
    }
}

/// A link plus its validation outcome and resolved target paths.
///
/// Every link downstream of the resolver is one of these; there is no
/// "not yet validated" state past that point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedLinkReference {
    #[serde(flatten)]
    pub link: LinkReference,
    pub validation: ValidationOutcome,
}

/// Counts derived from an enriched link array.
///
/// Always computed by filtering the links, never tracked independently, so the
/// counts cannot drift from the array they describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl ValidationSummary {
    pub fn from_links(links: &[EnrichedLinkReference]) -> Self {
        ValidationSummary {
            total: links.len(),
            valid: links.iter().filter(|l| l.validation.is_valid()).count(),
            warnings: links.iter().filter(|l| l.validation.is_warning()).count(),
            errors: links.iter().filter(|l| l.validation.is_error()).count(),
        }
    }
}

/// Decision produced by the eligibility chain for one link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityDecision {
    pub eligible: bool,
    pub reason: String,
}

/// One node of the block token tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenKind {
    /// A heading with its depth and text
    Heading { level: u8, text: String },
    /// Any other block-level construct (paragraph, list, code fence, ...)
    Block,
}

/// A block token with its source line span (1-based, inclusive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub kind: TokenKind,
    pub start_line: usize,
    pub end_line: usize,
}

impl Token {
    pub fn heading_level(&self) -> Option<u8> {
        match &self.kind {
            TokenKind::Heading { level, .. } => Some(*level),
            TokenKind::Block => None,
        }
    }
}

/// Everything the tokenizer produced for one document. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParseOutput {
    /// Absolute path the document was read from
    pub path: PathBuf,
    /// Full source text
    pub text: String,
    /// Block token tree in document order
    pub tokens: Vec<Token>,
    /// Outgoing links in document order
    pub links: Vec<LinkReference>,
    /// Anchor declarations in document order
    pub anchors: Vec<AnchorDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enriched(outcome: ValidationOutcome) -> EnrichedLinkReference {
        EnrichedLinkReference {
            link: LinkReference {
                style: LinkStyle::Inline,
                scope: LinkScope::CrossDocument,
                anchor_kind: None,
                source_path: PathBuf::from("/doc/a.md"),
                target_raw: Some("b.md".to_string()),
                target_absolute: None,
                target_relative: None,
                anchor_text: None,
                display_text: "b".to_string(),
                matched_text: "[b](b.md)".to_string(),
                line: 1,
                column: 1,
                marker: None,
            },
            validation: outcome,
        }
    }

    #[test]
    fn summary_is_derived_from_links() {
        let links = vec![
            enriched(ValidationOutcome::Valid),
            enriched(ValidationOutcome::Valid),
            enriched(ValidationOutcome::Warning {
                message: "non-canonical".to_string(),
                suggestion: None,
                path_conversion: Some("b.md".to_string()),
            }),
            enriched(ValidationOutcome::Error {
                message: "not found".to_string(),
                suggestion: None,
                path_conversion: None,
            }),
        ];
        let summary = ValidationSummary::from_links(&links);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.valid + summary.warnings + summary.errors, summary.total);
    }

    #[test]
    fn validation_outcome_serializes_tagged() {
        let outcome = ValidationOutcome::Error {
            message: "anchor 'Setup' not found".to_string(),
            suggestion: Some("Setup Guide".to_string()),
            path_conversion: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["suggestion"], "Setup Guide");
        assert!(json.get("pathConversion").is_none());
    }

    #[test]
    fn anchor_definition_matches_either_spelling() {
        let def = AnchorDefinition {
            kind: AnchorKind::Header,
            id: "Setup Guide".to_string(),
            escaped_id: Some("setup-guide".to_string()),
            matched_text: "## Setup Guide".to_string(),
            line: 3,
            column: 1,
        };
        assert!(def.matches("Setup Guide"));
        assert!(def.matches("setup-guide"));
        assert!(!def.matches("setup guide"));
    }
}

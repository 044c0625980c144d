//! Markdown tokenizer and read-only document view for the xref toolchain.
//!
//! This crate turns one Markdown file into a `RawParseOutput` (token tree,
//! outgoing link references, anchor definitions, full text) and wraps it in a
//! `ParsedDocumentView` that answers the questions the validation and
//! extraction layers ask: does this anchor exist, what does this section span,
//! what is the single line behind a block anchor.
//!
//! This is a pure lib: it never touches the terminal or environment, it only
//! reads the file it is handed. All downstream policy (path resolution,
//! caching, eligibility, deduplication) lives in xref-engine.

pub mod anchor;
pub mod error;
pub mod reference;
pub mod tokenizer;
pub mod view;

pub use error::{ExtractError, ParseError};
pub use reference::{
    AnchorDefinition, AnchorKind, EligibilityDecision, EnrichedLinkReference, ExtractionMarker,
    LinkReference, LinkScope, LinkStyle, RawParseOutput, Token, TokenKind, ValidationOutcome,
    ValidationSummary,
};
pub use tokenizer::{parse, parse_source};
pub use view::ParsedDocumentView;

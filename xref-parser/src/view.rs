//! Read-only query facade over one document's parse output
//!
//! `ParsedDocumentView` is handed out by the engine's document cache as a
//! shared immutable value; nothing here mutates the underlying
//! `RawParseOutput` after construction.

use crate::error::ExtractError;
use crate::reference::{AnchorDefinition, AnchorKind, LinkReference, RawParseOutput, TokenKind};
use similar::TextDiff;
use std::path::Path;

/// Similarity floor below which an anchor is not worth suggesting
pub const DEFAULT_SUGGESTION_THRESHOLD: f32 = 0.5;

#[derive(Debug)]
pub struct ParsedDocumentView {
    raw: RawParseOutput,
    /// Byte offset of the start of each line, plus one trailing entry at EOF
    line_starts: Vec<usize>,
}

impl ParsedDocumentView {
    pub fn new(raw: RawParseOutput) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in raw.text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        if *line_starts.last().expect("non-empty") != raw.text.len() {
            line_starts.push(raw.text.len());
        }
        ParsedDocumentView { raw, line_starts }
    }

    pub fn path(&self) -> &Path {
        &self.raw.path
    }

    pub fn links(&self) -> &[LinkReference] {
        &self.raw.links
    }

    pub fn anchors(&self) -> &[AnchorDefinition] {
        &self.raw.anchors
    }

    /// Whether any anchor matches `id` under its raw or escaped spelling
    pub fn has_anchor(&self, id: &str) -> bool {
        self.raw.anchors.iter().any(|a| a.matches(id))
    }

    /// Anchor identifiers similar to `id`, best match first.
    ///
    /// Scores raw and escaped spellings with a character diff ratio and keeps
    /// everything at or above `threshold`. Used for suggestion generation on
    /// anchor misses.
    pub fn find_similar_anchors(&self, id: &str, threshold: f32) -> Vec<String> {
        let mut scored: Vec<(f32, &str)> = self
            .raw
            .anchors
            .iter()
            .filter_map(|a| {
                let raw_score = similarity(id, &a.id);
                let escaped_score = a
                    .escaped_id
                    .as_deref()
                    .map(|e| similarity(id, e))
                    .unwrap_or(0.0);
                let score = raw_score.max(escaped_score);
                (score >= threshold).then_some((score, a.id.as_str()))
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(_, id)| id.to_string()).collect()
    }

    /// The raw heading text addressed by `id` under either spelling.
    ///
    /// Extraction needs the canonical heading text even when the link used the
    /// slug form.
    pub fn heading_for_anchor(&self, id: &str) -> Option<&str> {
        self.raw
            .anchors
            .iter()
            .find(|a| a.kind == AnchorKind::Header && a.matches(id))
            .map(|a| a.id.as_str())
    }

    /// The whole document text
    pub fn extract_full_content(&self) -> &str {
        &self.raw.text
    }

    /// Extract the section belonging to the heading with exactly `heading_text`.
    ///
    /// The section runs from the heading itself (inclusive) to the first later
    /// heading whose level is less than or equal to the starting level
    /// (exclusive), or to end of document. Deeper sub-headings stay inside the
    /// section. Matching is exact and case-sensitive. The result is the
    /// original source span, reconstructed byte-for-byte.
    pub fn extract_section(&self, heading_text: &str) -> Result<String, ExtractError> {
        let start_idx = self
            .raw
            .tokens
            .iter()
            .position(|t| matches!(&t.kind, TokenKind::Heading { text, .. } if text == heading_text))
            .ok_or_else(|| ExtractError::HeadingMissing(heading_text.to_string()))?;

        let start = &self.raw.tokens[start_idx];
        let level = start.heading_level().expect("start token is a heading");

        let end_line = self.raw.tokens[start_idx + 1..]
            .iter()
            .find(|t| t.heading_level().is_some_and(|l| l <= level))
            .map(|t| t.start_line);

        Ok(self.line_span(start.start_line, end_line))
    }

    /// Extract the single source line declared by the block anchor `anchor_id`.
    ///
    /// Multi-line paragraph anchors are a known limitation: only the declaring
    /// line is returned.
    pub fn extract_block(&self, anchor_id: &str) -> Result<String, ExtractError> {
        let def = self
            .raw
            .anchors
            .iter()
            .find(|a| a.kind == AnchorKind::Block && a.matches(anchor_id))
            .ok_or_else(|| ExtractError::UnknownAnchor(anchor_id.to_string()))?;

        let lines: Vec<&str> = self.raw.text.lines().collect();
        if def.line == 0 || def.line > lines.len() {
            return Err(ExtractError::InvalidBlockIndex {
                line: def.line,
                line_count: lines.len(),
            });
        }
        Ok(lines[def.line - 1].to_string())
    }

    /// Source span from `start_line` (inclusive) to `end_line` (exclusive),
    /// both 1-based; `None` means end of document.
    fn line_span(&self, start_line: usize, end_line: Option<usize>) -> String {
        let start = self
            .line_starts
            .get(start_line - 1)
            .copied()
            .unwrap_or(self.raw.text.len());
        let end = end_line
            .and_then(|l| self.line_starts.get(l - 1).copied())
            .unwrap_or(self.raw.text.len());
        self.raw.text[start..end].to_string()
    }
}

fn similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return 1.0;
    }
    TextDiff::from_chars(a, b).ratio()
}

//! Markdown tokenizing (file → RawParseOutput)
//!
//! Pipeline: source text → Comrak AST → block token tree, plus a line-wise
//! scan for link references, block anchor declarations, and extraction
//! markers. Comrak owns the block structure (so heading spans survive odd
//! nesting); the line scan owns the inline syntax we care about, because it
//! must record exact matched text, columns, and same-line markers that the
//! AST does not preserve.

use crate::anchor::slugify;
use crate::error::ParseError;
use crate::reference::{
    AnchorDefinition, AnchorKind, ExtractionMarker, LinkReference, LinkScope, LinkStyle,
    RawParseOutput, Token, TokenKind,
};
use comrak::nodes::{AstNode, NodeValue};
use comrak::{parse_document, Arena, ComrakOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// `[text](target)`, with a leading `!` capture so images can be skipped
static INLINE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^()\s]+)\)").expect("inline link regex"));

/// `[[target#anchor|alias]]`
static WIKI_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\]|#]*)(#[^\]|]*)?(?:\|([^\]]*))?\]\]").expect("wiki link regex")
});

/// `^block-id` at end of line
static BLOCK_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^([A-Za-z0-9_-]+)\s*$").expect("block anchor regex"));

/// `<!-- xref:force -->` / `<!-- xref:stop -->`
static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*xref:(force|stop)\s*-->").expect("marker regex"));

/// Read and tokenize one Markdown file.
///
/// The stored path is made absolute against the current directory when the
/// caller passes a relative one.
pub fn parse(path: &Path) -> Result<RawParseOutput, ParseError> {
    let text = fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| ParseError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .join(path)
    };
    Ok(parse_source(&absolute, &text))
}

/// Tokenize already-loaded source text. Never fails: Markdown has no
/// rejecting grammar, every input produces some token tree.
pub fn parse_source(path: &Path, text: &str) -> RawParseOutput {
    let tokens = block_tokens(text);
    let mut anchors = header_anchors(&tokens, text);
    let (links, block_anchors) = scan_lines(path, text);
    anchors.extend(block_anchors);
    anchors.sort_by_key(|a| (a.line, a.column));

    RawParseOutput {
        path: path.to_path_buf(),
        text: text.to_string(),
        tokens,
        links,
        anchors,
    }
}

fn default_comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options
}

/// Build the flat block token tree from the Comrak AST, in document order
fn block_tokens(text: &str) -> Vec<Token> {
    let arena = Arena::new();
    let options = default_comrak_options();
    let root = parse_document(&arena, text, &options);

    let mut tokens = Vec::new();
    for node in root.children() {
        let data = node.data.borrow();
        let sourcepos = data.sourcepos;
        let kind = match &data.value {
            NodeValue::Heading(heading) => TokenKind::Heading {
                level: heading.level,
                text: collect_text(node),
            },
            _ => TokenKind::Block,
        };
        tokens.push(Token {
            kind,
            start_line: sourcepos.start.line,
            end_line: sourcepos.end.line,
        });
    }
    tokens
}

/// Gather the literal text of a node's inline content
fn collect_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut out = String::new();
    for descendant in node.descendants() {
        match &descendant.data.borrow().value {
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
            _ => {}
        }
    }
    out
}

/// Header anchor definitions derived from heading tokens.
///
/// The escaped spelling is only kept when it differs from the raw text, which
/// is exactly the case where a heading has two valid addressable forms.
fn header_anchors(tokens: &[Token], text: &str) -> Vec<AnchorDefinition> {
    let lines: Vec<&str> = text.lines().collect();
    tokens
        .iter()
        .filter_map(|token| match &token.kind {
            TokenKind::Heading { text: heading, .. } => {
                let slug = slugify(heading);
                let escaped_id = if slug != *heading && !slug.is_empty() {
                    Some(slug)
                } else {
                    None
                };
                let matched_text = lines
                    .get(token.start_line.saturating_sub(1))
                    .map(|l| l.to_string())
                    .unwrap_or_default();
                Some(AnchorDefinition {
                    kind: AnchorKind::Header,
                    id: heading.clone(),
                    escaped_id,
                    matched_text,
                    line: token.start_line,
                    column: 1,
                })
            }
            TokenKind::Block => None,
        })
        .collect()
}

/// Line-wise scan for links, block anchors, and extraction markers.
///
/// Fenced code blocks are skipped: a link inside an example is not a
/// reference. The fence tracking is the usual ``` / ~~~ toggle.
fn scan_lines(path: &Path, text: &str) -> (Vec<LinkReference>, Vec<AnchorDefinition>) {
    let mut links = Vec::new();
    let mut anchors = Vec::new();
    let mut in_fence = false;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        let marker = MARKER.captures(line).map(|c| match &c[1] {
            "force" => ExtractionMarker::Force,
            _ => ExtractionMarker::Stop,
        });

        for captures in INLINE_LINK.captures_iter(line) {
            if &captures[1] == "!" {
                continue; // image, not a reference
            }
            let target = &captures[3];
            if is_external(target) {
                continue;
            }
            let whole = captures.get(0).expect("capture 0");
            if let Some(link) = build_link(
                path,
                LinkStyle::Inline,
                captures[2].to_string(),
                target,
                whole.as_str().to_string(),
                line_no,
                whole.start() + 1,
                marker,
            ) {
                links.push(link);
            }
        }

        for captures in WIKI_LINK.captures_iter(line) {
            let target_part = captures[1].trim();
            let anchor_part = captures.get(2).map(|m| m.as_str()).unwrap_or("");
            let whole = captures.get(0).expect("capture 0");
            let display = captures
                .get(3)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| whole.as_str().trim_matches(['[', ']']).to_string());
            let spelled = format!("{}{}", target_part, anchor_part);
            if let Some(link) = build_link(
                path,
                LinkStyle::Wiki,
                display,
                &spelled,
                whole.as_str().to_string(),
                line_no,
                whole.start() + 1,
                marker,
            ) {
                links.push(link);
            }
        }

        if let Some(captures) = BLOCK_ANCHOR.captures(line) {
            let whole = captures.get(0).expect("capture 0");
            anchors.push(AnchorDefinition {
                kind: AnchorKind::Block,
                id: captures[1].to_string(),
                escaped_id: None,
                matched_text: whole.as_str().trim_end().to_string(),
                line: line_no,
                column: whole.start() + 1,
            });
        }
    }

    (links, anchors)
}

fn is_external(target: &str) -> bool {
    target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("mailto:")
        || target.starts_with("ftp://")
}

#[allow(clippy::too_many_arguments)]
fn build_link(
    path: &Path,
    style: LinkStyle,
    display_text: String,
    target: &str,
    matched_text: String,
    line: usize,
    column: usize,
    marker: Option<ExtractionMarker>,
) -> Option<LinkReference> {
    let (path_part, anchor_part) = match target.split_once('#') {
        Some((p, a)) => (p, Some(a)),
        None => (target, None),
    };
    let anchor_text = anchor_part.filter(|a| !a.is_empty()).map(str::to_string);

    // A bare "#" or completely empty target addresses nothing
    if path_part.is_empty() && anchor_text.is_none() {
        return None;
    }

    let scope = if path_part.is_empty() {
        LinkScope::Internal
    } else {
        LinkScope::CrossDocument
    };
    let anchor_kind = anchor_text.as_deref().map(|a| {
        if a.starts_with('^') {
            AnchorKind::Block
        } else {
            AnchorKind::Header
        }
    });

    Some(LinkReference {
        style,
        scope,
        anchor_kind,
        source_path: path.to_path_buf(),
        target_raw: (!path_part.is_empty()).then(|| path_part.to_string()),
        target_absolute: None,
        target_relative: None,
        anchor_text,
        display_text,
        matched_text,
        line,
        column,
        marker,
    })
}

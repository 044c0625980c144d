//! Anchor identifier handling: slugs and percent-escapes
//!
//! A heading has up to two addressable spellings: the raw heading text as
//! written, and the GitHub-style slug derived from it. Links may also carry
//! percent-encoded anchor text, which is decoded before any comparison.

/// Derive the escaped (slug) form of a heading text.
///
/// Lowercases, replaces whitespace runs with a single `-`, and drops every
/// character that is not alphanumeric, `-` or `_`. Returns the slug even when
/// it equals the input; callers decide whether the two forms differ.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        }
    }
    slug
}

/// Decode `%XX` percent-escapes in an anchor reference.
///
/// Invalid escapes are kept verbatim; decoding never fails. Only single-byte
/// escapes are interpreted, multi-byte UTF-8 sequences are reassembled from
/// consecutive escapes.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 3 <= bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| input.to_string())
}

/// Normalize an anchor reference as written in a link for matching against
/// anchor definitions: decode percent-escapes and strip the leading block
/// marker `^` if present.
pub fn normalize_reference(anchor: &str) -> String {
    let decoded = percent_decode(anchor);
    decoded.strip_prefix('^').map(str::to_string).unwrap_or(decoded)
}

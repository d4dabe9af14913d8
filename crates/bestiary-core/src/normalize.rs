//! Subject name normalization and filename sanitizing.

use once_cell::sync::Lazy;
use regex::Regex;

static PARENTHETICAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(.*?\)").expect("valid regex"));
static CITATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").expect("valid regex"));
static TRAILING_NOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Also see|See also").expect("valid regex"));
static UNSAFE_FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("valid regex"));

/// Strips parentheticals, `[n]` citation markers and trailing "See also"
/// notes from a raw animal name.
///
/// `normalize_name(normalize_name(x)) == normalize_name(x)` for every input.
pub fn normalize_name(raw: &str) -> String {
    let without_parens = PARENTHETICAL_RE.replace_all(raw, "");
    let without_citations = CITATION_RE.replace_all(&without_parens, "");
    let head = TRAILING_NOTE_RE
        .split(&without_citations)
        .next()
        .unwrap_or_default();
    head.trim().to_string()
}

/// Removes `[n]` citation markers only.
pub fn strip_citations(text: &str) -> String {
    CITATION_RE.replace_all(text, "").into_owned()
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_FILENAME_RE.replace_all(name, "_").into_owned()
}

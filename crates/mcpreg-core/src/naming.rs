use regex::Regex;
use std::sync::OnceLock;

/// Longest name the field-by-field flow will suggest.
pub const MAX_SUGGESTED_LEN: usize = 50;

/// Lowercase, turn spaces and underscores into hyphens, then drop every
/// character outside `[a-z0-9-]`. The order is fixed.
pub fn sanitize_slug(value: &str) -> String {
    value
        .to_lowercase()
        .replace([' ', '_'], "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

static DESC_STRIP_RE: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

fn desc_strip_re() -> &'static Regex {
    DESC_STRIP_RE.get_or_init(|| Regex::new(r"[^a-z0-9\s-]").unwrap())
}

fn whitespace_re() -> &'static Regex {
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Deterministic name derived from a free-text description.
pub fn slug_from_description(description: &str) -> String {
    let lowered = description.trim().to_lowercase();
    let stripped = desc_strip_re().replace_all(&lowered, "");
    let hyphenated = whitespace_re().replace_all(stripped.trim(), "-");
    truncate(&hyphenated)
}

/// Normalize a free-form assistant reply into a name suggestion. Only the
/// first non-empty line counts; quotes and backticks around it are ignored.
/// Returns `None` when nothing usable remains.
pub fn normalize_suggestion(reply: &str) -> Option<String> {
    let line = reply.lines().map(str::trim).find(|l| !l.is_empty())?;
    let unquoted = line.trim_matches(|c| c == '`' || c == '"' || c == '\'');
    let slug = sanitize_slug(unquoted.trim());
    let slug = truncate(slug.trim_matches('-'));
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

fn truncate(slug: &str) -> String {
    slug.chars().take(MAX_SUGGESTED_LEN).collect()
}

//! Friendly-id detection and slug normalisation.

use std::sync::LazyLock;

use regex::Regex;

/// `true` unless `input` is exactly the decimal form of an integer.
///
/// `"42"` and `"-3"` are ids; `"042"`, `"4a"`, `"about"` and `""` are friendly.
pub fn is_friendly_id(input: &str) -> bool {
    match input.parse::<i64>() {
        Ok(n) => n.to_string() != input,
        Err(_) => true,
    }
}

/// Lowercase `input` and collapse every run of non-alphanumerics to `-`.
pub fn normalize(input: &str) -> String {
    static SEPARATOR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid regex"));

    let lowered = input.trim().to_lowercase();
    SEPARATOR_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Slug for a translation: the custom slug when given, else one derived from
/// the title. `None` when nothing usable remains.
pub fn slug_for(title: &str, custom_slug: Option<&str>) -> Option<String> {
    let source = custom_slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(title);
    let slug = normalize(source);
    (!slug.is_empty()).then_some(slug)
}

use std::sync::LazyLock;

use regex::Regex;

static NON_SLUG_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug separator pattern"));

/// Turns free text into a URL-friendly slug: lowercase ASCII alphanumerics joined by
/// single hyphens, without leading or trailing hyphens.
pub fn generate_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

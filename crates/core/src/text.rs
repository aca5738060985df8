// Input cleanup and slug generation for submitted articles

use once_cell::sync::Lazy;
use regex::Regex;

/// Anything from `<` to the next `>`
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Strip `<...>` tags and surrounding whitespace
pub fn sanitize_input(input: &str) -> String {
    TAG_PATTERN.replace_all(input, "").trim().to_string()
}

/// Sanitize an optional field, mapping blank values to `None`
pub fn sanitize_optional(input: Option<&str>) -> Option<String> {
    input.map(sanitize_input).filter(|s| !s.is_empty())
}

/// Lowercase, drop punctuation, join words with hyphens
pub fn generate_slug(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}

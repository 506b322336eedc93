use regex::Regex;
use std::sync::OnceLock;

fn opening_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^```(?:mermaid)?[ \t]*\r?\n?").expect("valid regex"))
}

fn closing_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r?\n?```\s*$").expect("valid regex"))
}

/// Recovers raw diagram source from a generation-service response.
///
/// At most one fence layer is removed: an opening ` ```mermaid ` (any case) or bare ` ``` `, and
/// one closing ` ``` `. Unfenced text is only trimmed.
pub fn extract(response: &str) -> String {
    let trimmed = response.trim();
    let without_open = opening_fence_regex().replace(trimmed, "");
    let without_close = closing_fence_regex().replace(&without_open, "");
    without_close.trim().to_string()
}

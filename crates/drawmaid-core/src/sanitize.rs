//! Line-local quoting of Mermaid labels that contain syntax-significant characters.
//!
//! The downstream parser treats unquoted `(`, `:`, `;`, ... inside labels as grammar. This module
//! is a pattern-based patch, not a reparse: each line is scanned once for edge, cylinder and node
//! labels, and a matched label is only ever wrapped in double quotes. Already-quoted labels are
//! left alone, so applying [`sanitize`] twice is the same as applying it once.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Characters that force a label to be quoted.
pub const SPECIAL_CHARS: &[char] = &[
    '(', ')', '/', '\\', ':', ',', ';', '!', '?', '@', '#', '$', '%', '^', '&', '*',
];

/// A complete double-quoted string, honouring `\"` escapes.
const QUOTED: &str = r#""(?:[^"\\]|\\.)*""#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelKind {
    /// `-->|Label|`
    Edge,
    /// `Id[(Label)]`
    Cylinder,
    /// `Id[Label]`
    Node,
}

/// One alternation over every label form, scanned left to right.
///
/// A span claimed by one form is never rescanned by another, so an edge label such as
/// `|f[a,b]|` is not also read as a node. Each label group accepts a complete quoted string first,
/// which keeps `]`, `)` or `|` inside quotes from ending the label early.
fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            concat!(
                r"-->\|(?P<edge>{q}|[^|]*)\|",
                r"|(?P<cylinder_id>[A-Za-z0-9_]+)\[\((?P<cylinder>{q}|[^\]]*?)\)\]",
                r"|(?P<node_id>[A-Za-z0-9_]+)\[(?P<node>{q}|[^\]]*)\]",
            ),
            q = QUOTED
        );
        Regex::new(&pattern).expect("valid regex")
    })
}

fn rewrite(caps: &Captures<'_>) -> String {
    let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
    let (kind, id, label) = if let Some(label) = caps.name("edge") {
        (LabelKind::Edge, "", label.as_str())
    } else if let Some(label) = caps.name("cylinder") {
        let id = caps.name("cylinder_id").map(|m| m.as_str()).unwrap_or_default();
        (LabelKind::Cylinder, id, label.as_str())
    } else if let Some(label) = caps.name("node") {
        let id = caps.name("node_id").map(|m| m.as_str()).unwrap_or_default();
        (LabelKind::Node, id, label.as_str())
    } else {
        return whole.to_string();
    };

    if is_quoted(label) || !needs_quoting(label) {
        return whole.to_string();
    }
    let escaped = escape_quotes(label);
    match kind {
        LabelKind::Edge => format!("-->|\"{escaped}\"|"),
        LabelKind::Cylinder => format!("{id}[(\"{escaped}\")]"),
        LabelKind::Node => format!("{id}[\"{escaped}\"]"),
    }
}

fn structural_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:graph|flowchart)\b").expect("valid regex"))
}

fn is_quoted(label: &str) -> bool {
    label.starts_with('"') && label.ends_with('"')
}

fn needs_quoting(label: &str) -> bool {
    label.contains(SPECIAL_CHARS)
}

fn escape_quotes(label: &str) -> String {
    label.replace('"', "\\\"")
}

/// Returns `true` for lines the sanitizer never touches: blank lines, `graph`/`flowchart`
/// declarations and `%%` comments.
pub fn is_structural_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with("%%") || structural_line_regex().is_match(line)
}

/// Sanitizes a single line. Structural lines are returned unchanged.
pub fn sanitize_line(line: &str) -> String {
    if is_structural_line(line) {
        return line.to_string();
    }
    label_regex()
        .replace_all(line, |caps: &Captures<'_>| rewrite(caps))
        .into_owned()
}

/// Sanitizes Mermaid source line by line, preserving line order and separators.
pub fn sanitize(source: &str) -> String {
    source
        .split('\n')
        .map(sanitize_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{is_quoted, needs_quoting};

    #[test]
    fn single_quote_char_counts_as_quoted() {
        assert!(is_quoted("\""));
        assert!(is_quoted("\"a\""));
        assert!(!is_quoted("\"a"));
    }

    #[test]
    fn period_and_dash_are_not_special() {
        assert!(!needs_quoting("Node.js - v1"));
        assert!(needs_quoting("cost: $5"));
    }
}

//! Placeholder scanning and content rendering.
//!
//! Entry content may reference runtime values with `{{NAME}}` markers.
//! Scanning extracts the distinct names in first-occurrence order; rendering
//! substitutes resolved values in a single pass.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

/// Resolved placeholder values for a single execution.
pub type SubstitutionTable = HashMap<String, String>;

/// Marker syntax: `{{IDENTIFIER}}`, identifier = word characters only.
///
/// Unbalanced braces or whitespace inside the braces never match; such text
/// stays literal.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}").unwrap());

/// Extract the distinct placeholder names in `content`, in first-occurrence
/// order.
pub fn placeholders(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for caps in PLACEHOLDER.captures_iter(content) {
        let name = &caps[1];
        if seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }
    names
}

/// Replace every known placeholder marker in `content` with its resolved
/// value.
///
/// Substitution is a single pass over the original text: a resolved value
/// that itself contains marker syntax is inserted literally and never
/// re-expanded. Names missing from the table are left as literal marker text
/// so partial renders stay inspectable.
pub fn render(content: &str, values: &SubstitutionTable) -> String {
    PLACEHOLDER
        .replace_all(content, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            values.get(name).cloned().unwrap_or_else(|| format!("{{{{{name}}}}}"))
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> SubstitutionTable {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_scan_empty() {
        assert!(placeholders("").is_empty());
        assert!(placeholders("no markers here").is_empty());
    }

    #[test]
    fn test_scan_first_occurrence_order() {
        let names = placeholders("ssh {{USER}}@{{HOST}} -p {{PORT}} # {{USER}} again");
        assert_eq!(names, vec!["USER", "HOST", "PORT"]);
    }

    #[test]
    fn test_scan_case_sensitive() {
        let names = placeholders("{{host}} {{HOST}}");
        assert_eq!(names, vec!["host", "HOST"]);
    }

    #[test]
    fn test_scan_ignores_malformed() {
        assert!(placeholders("{{unclosed").is_empty());
        assert!(placeholders("{{with space}}").is_empty());
        assert!(placeholders("{single}").is_empty());
        assert!(placeholders("{{bad-char}}").is_empty());
    }

    #[test]
    fn test_render_basic() {
        let out = render("ssh {{USER}}@{{HOST}}", &table(&[("USER", "alice"), ("HOST", "db1")]));
        assert_eq!(out, "ssh alice@db1");
    }

    #[test]
    fn test_render_empty_value() {
        let out = render("curl {{URL}}{{SUFFIX}}", &table(&[("URL", "http://x"), ("SUFFIX", "")]));
        assert_eq!(out, "curl http://x");
    }

    #[test]
    fn test_render_missing_left_literal() {
        let out = render("echo {{KNOWN}} {{UNKNOWN}}", &table(&[("KNOWN", "yes")]));
        assert_eq!(out, "echo yes {{UNKNOWN}}");
    }

    #[test]
    fn test_render_never_reexpands_values() {
        let out = render("echo {{A}}", &table(&[("A", "{{B}}"), ("B", "boom")]));
        assert_eq!(out, "echo {{B}}");
    }

    #[test]
    fn test_render_idempotent() {
        let values = table(&[("USER", "alice"), ("HOST", "db1")]);
        let once = render("ssh {{USER}}@{{HOST}}", &values);
        let twice = render(&once, &values);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_render_empty_table_is_identity() {
        let content = "deploy {{ENV}} now";
        assert_eq!(render(content, &SubstitutionTable::new()), content);
    }
}

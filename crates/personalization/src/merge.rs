//! Merge-field resolution for `{{fieldName}}` placeholders in letter text.

use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// `{{identifier}}` where the identifier is one or more characters other
/// than braces. Whitespace inside the braces is part of the identifier.
static MERGE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("merge token pattern compiles"));

/// Replaces every merge token in `template` with its value from `record`.
///
/// Tokens whose field is absent from the record resolve to the empty string.
/// Malformed or unmatched braces are copied through verbatim.
pub fn resolve(template: &str, record: &HashMap<String, String>) -> String {
    if template.is_empty() {
        return String::new();
    }
    MERGE_TOKEN
        .replace_all(template, |caps: &Captures| {
            record.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Distinct field names referenced by `content`, in first-appearance order.
pub fn extract_merge_fields(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    MERGE_TOKEN
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .filter(|field| seen.insert(field.clone()))
        .collect()
}

/// Fields referenced by `content` that `record` cannot supply.
pub fn missing_fields(content: &str, record: &HashMap<String, String>) -> Vec<String> {
    extract_merge_fields(content)
        .into_iter()
        .filter(|field| !record.contains_key(field))
        .collect()
}

//! Template Renderer: `{{identifier}}` substitution.
//!
//! Unknown identifiers are left in place verbatim. A template with a typo still
//! renders, and the literal `{{key}}` in the output shows exactly what is wrong.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::contracts::variables::VariableSet;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").unwrap());

/// Replaces every placeholder that has a value in `vars`. Substituted values
/// are not scanned again.
pub fn render(body: &str, vars: &VariableSet) -> String {
    PLACEHOLDER_RE
        .replace_all(body, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Placeholder identifiers in order of first appearance.
pub fn find_placeholders(body: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    PLACEHOLDER_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let key = caps[1].to_string();
            seen.insert(key.clone()).then_some(key)
        })
        .collect()
}

/// Placeholders in `body` with no value in `vars`, sorted.
pub fn unresolved_placeholders(body: &str, vars: &VariableSet) -> Vec<String> {
    let mut missing: Vec<String> = find_placeholders(body)
        .into_iter()
        .filter(|key| vars.get(key).is_none())
        .collect();
    missing.sort();
    missing
}

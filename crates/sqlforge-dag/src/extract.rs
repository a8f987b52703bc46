//! Reference-marker extraction
//!
//! A marker is two opening braces, optional whitespace, the keyword `ref`,
//! whitespace, a single- or double-quoted model name, optional whitespace,
//! and two closing braces. Quote style is independent per marker:
//!
//! ```sql
//! select * from {{ ref 'users' }}
//! join {{ref "orders"}} using (user_id)
//! ```

use regex::Regex;
use std::sync::OnceLock;

fn ref_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*ref\s+(?:'([^']*)'|"([^"]*)")\s*\}\}"#)
            .expect("ref marker pattern is valid")
    })
}

/// Extract the names referenced by `{{ ref '...' }}` markers
///
/// Matching is case-sensitive and purely textual: markers inside SQL
/// comments are picked up too. That is a documented simplification, not an
/// oversight; callers relying on commented-out refs being ignored must
/// strip comments first.
///
/// Captured names are whitespace-trimmed, deduplicated, and returned in
/// lexicographic order so graph construction is deterministic regardless of
/// where markers appear in the text.
pub fn extract_refs(sql: &str) -> Vec<String> {
    let mut names: Vec<String> = ref_marker()
        .captures_iter(sql)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .collect();

    names.sort();
    names.dedup();
    names
}

//! Parsing and canonical form of TLD list entries
//!
//! The registry publishes one entry per line; lines starting with `#` are
//! comments. Entries are kept in uppercase (`COM`, `CO.UK`).

use std::collections::HashSet;

/// Canonical form of a single entry, or `None` for blanks and comments
pub fn parse_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(line.to_ascii_uppercase())
}

/// Parse a newline-delimited TLD list
///
/// Entries keep source order and duplicates are preserved; collapse them
/// with [`canonical_set`].
pub fn parse_tld_list(text: &str) -> Vec<String> {
    text.lines().filter_map(parse_line).collect()
}

/// Collapse entries into the canonical TLD set
///
/// Every member is trimmed, uppercase and non-empty.
pub fn canonical_set<I, S>(entries: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.as_ref().trim();
            (!entry.is_empty()).then(|| entry.to_ascii_uppercase())
        })
        .collect()
}

//! Suffix extraction
//!
//! Derives the TLD portion of an arbitrary domain string from the labels
//! present in a [`TldSnapshot`].

use crate::cache::TldSnapshot;
use crate::config::SuffixMatchOrder;

/// Result of extracting a suffix from a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixMatch {
    /// Uppercase suffix, e.g. `COM` or `CO.UK`
    pub suffix: String,
    /// False when no candidate was in the set and the last label was
    /// returned as a best effort
    pub verified: bool,
}

/// Reduce user input to a bare lowercase host name
///
/// Strips surrounding whitespace, an `http://`/`https://` scheme, a leading
/// `www.` label, any path, query or fragment, a numeric port and a trailing
/// root dot.
pub fn normalize_domain(domain: &str) -> String {
    let mut host = domain.trim().to_ascii_lowercase();

    for scheme in ["http://", "https://"] {
        if let Some(rest) = host.strip_prefix(scheme) {
            host = rest.to_string();
            break;
        }
    }

    if let Some(rest) = host.strip_prefix("www.") {
        host = rest.to_string();
    }

    if let Some(end) = host.find(|c: char| matches!(c, '/' | '?' | '#')) {
        host.truncate(end);
    }

    if let Some((name, port)) = host.rsplit_once(':')
        && !port.is_empty()
        && port.bytes().all(|b| b.is_ascii_digit())
    {
        host = name.to_string();
    }

    let host = host.trim();
    host.strip_suffix('.').unwrap_or(host).to_string()
}

/// Extract the suffix of `domain` that is present in `snapshot`
///
/// For a host of `n` labels the candidates are the trailing `k` labels,
/// `k = 1..n`, tried in `order`. The full host (`k = n`) is never a
/// candidate. Returns `None` when the host has fewer than two labels or
/// ends in an empty label (`example.com..`).
pub fn extract_suffix(
    snapshot: &TldSnapshot,
    domain: &str,
    order: SuffixMatchOrder,
) -> Option<SuffixMatch> {
    let host = normalize_domain(domain);
    let labels: Vec<&str> = host.split('.').collect();
    let n = labels.len();
    if n < 2 || labels[n - 1].is_empty() {
        return None;
    }

    let candidate = |k: usize| labels[n - k..].join(".").to_ascii_uppercase();
    let found = match order {
        SuffixMatchOrder::Shortest => (1..n).map(candidate).find(|c| snapshot.contains(c)),
        SuffixMatchOrder::Longest => (1..n).rev().map(candidate).find(|c| snapshot.contains(c)),
    };

    Some(match found {
        Some(suffix) => SuffixMatch {
            suffix,
            verified: true,
        },
        None => SuffixMatch {
            suffix: labels[n - 1].to_ascii_uppercase(),
            verified: false,
        },
    })
}

//! TLD validation verdicts

use serde::Serialize;

use crate::cache::TldSnapshot;

/// Message for blank input
pub const EMPTY_INPUT_MESSAGE: &str = "TLD cannot be empty";

/// Message when the list was never populated
pub const UNAVAILABLE_MESSAGE: &str = "TLD list not available. Please try again later.";

/// Message when a domain yields no suffix
pub const NO_SUFFIX_MESSAGE: &str = "Could not extract TLD from domain";

/// Why a candidate was accepted or rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Invalid,
    /// Blank input; a caller mistake, not a service failure
    EmptyInput,
    /// The list was never populated
    CacheUnavailable,
    /// Domain had fewer than two labels
    MalformedDomain,
}

/// Outcome of a validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub is_valid: bool,
    pub message: String,
    /// Normalized TLD that was checked (empty if none)
    pub tld: String,
    pub verdict: Verdict,
}

impl Validation {
    fn rejected(verdict: Verdict, message: &str, tld: String) -> Self {
        Self {
            is_valid: false,
            message: message.to_string(),
            tld,
            verdict,
        }
    }

    /// Blank-input verdict
    pub fn empty_input() -> Self {
        Self::rejected(Verdict::EmptyInput, EMPTY_INPUT_MESSAGE, String::new())
    }

    /// Verdict for a domain with no extractable suffix
    pub fn malformed_domain() -> Self {
        Self::rejected(Verdict::MalformedDomain, NO_SUFFIX_MESSAGE, String::new())
    }

    /// The `(is_valid, message)` pair
    pub fn into_pair(self) -> (bool, String) {
        (self.is_valid, self.message)
    }
}

/// Validate `candidate` against `snapshot`
///
/// Blank input is checked before availability, so `""` always yields
/// [`EMPTY_INPUT_MESSAGE`].
pub fn validate_tld(snapshot: &TldSnapshot, candidate: &str) -> Validation {
    let tld = candidate.trim().to_ascii_uppercase();
    if tld.is_empty() {
        return Validation::empty_input();
    }

    if snapshot.is_empty() {
        return Validation::rejected(Verdict::CacheUnavailable, UNAVAILABLE_MESSAGE, tld);
    }

    let is_valid = snapshot.contains(&tld);
    Validation {
        is_valid,
        message: format!(
            "TLD '{}' is {}",
            tld,
            if is_valid { "valid" } else { "invalid" }
        ),
        tld,
        verdict: if is_valid {
            Verdict::Valid
        } else {
            Verdict::Invalid
        },
    }
}

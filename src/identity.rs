//! Journal/conference identity normalization.
//!
//! Canonicalizes a raw venue name (and optional ISSN) into the matching key
//! shared by every backend: lower-cased, diacritics folded, punctuation
//! stripped, whitespace collapsed, boilerplate prefixes removed. The same
//! normalized form is used to key list snapshots, so normalization must be
//! deterministic and idempotent.

use crate::error::{GuardError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// ISSN shape: four digits, hyphen, three digits, check digit (0-9 or X)
const ISSN_PATTERN: &str = r"^\d{4}-\d{3}[\dX]$";

/// Leading boilerplate stripped from venue names before matching.
/// Longest prefixes first so "international journal of" wins over "journal of".
const STRIP_PREFIXES: &[&str] = &[
    "proceedings of the ",
    "proceedings of ",
    "international journal of ",
    "international conference on ",
    "journal of ",
    "annals of ",
    "the ",
];

/// Abbreviations expanded before prefix stripping (token-exact match)
const EXPANSIONS: &[(&str, &str)] = &[
    ("intl", "international"),
    ("int", "international"),
    ("j", "journal"),
    ("proc", "proceedings"),
    ("conf", "conference"),
];

/// Canonical form of a name/ISSN pair, the matching key across all backends.
///
/// Immutable once built; one per assessment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedIdentity {
    /// Lower-cased, punctuation-stripped, whitespace-collapsed name
    pub normalized_name: String,
    /// Checksum-valid ISSN, if one was supplied and survived validation
    pub issn: Option<String>,
    /// Name exactly as the caller supplied it
    pub raw_name: String,
}

/// Normalize a raw name and optional ISSN into a [`NormalizedIdentity`].
///
/// Returns the identity plus any non-fatal warnings (an invalid ISSN is
/// dropped with a warning, never an error). Fails with
/// [`GuardError::Validation`] only when the name is empty after stripping.
pub fn normalize(raw_name: &str, issn: Option<&str>) -> Result<(NormalizedIdentity, Vec<String>)> {
    let normalized_name = normalize_name(raw_name);
    if normalized_name.is_empty() {
        return Err(GuardError::Validation(format!(
            "venue name {:?} is empty after normalization",
            raw_name
        )));
    }

    let mut warnings = Vec::new();
    let issn = match issn.map(str::trim).filter(|s| !s.is_empty()) {
        Some(candidate) => {
            let upper = candidate.to_uppercase();
            if is_valid_issn(&upper) {
                Some(upper)
            } else {
                debug!(issn = candidate, "Dropping invalid ISSN");
                warnings.push(format!(
                    "ISSN '{}' failed format/checksum validation and was ignored",
                    candidate
                ));
                None
            }
        }
        None => None,
    };

    Ok((
        NormalizedIdentity {
            normalized_name,
            issn,
            raw_name: raw_name.to_string(),
        },
        warnings,
    ))
}

/// Canonicalize a venue name: case-fold, strip diacritics and punctuation,
/// collapse whitespace, expand common abbreviations, drop boilerplate prefixes.
///
/// Idempotent: applying it to an already-canonical string is a no-op.
pub fn normalize_name(raw: &str) -> String {
    let lowered: String = raw
        .chars()
        .flat_map(fold_char)
        .collect();

    let mut collapsed = String::with_capacity(lowered.len());
    let mut last_space = true;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !last_space {
                collapsed.push(' ');
                last_space = true;
            }
        } else {
            collapsed.push(c);
            last_space = false;
        }
    }
    let collapsed = collapsed.trim().to_string();

    // Expand token abbreviations so "Intl. J. of X" and
    // "International Journal of X" share one key
    let expanded: Vec<&str> = collapsed
        .split(' ')
        .map(|tok| {
            EXPANSIONS
                .iter()
                .find(|(abbr, _)| *abbr == tok)
                .map(|(_, full)| *full)
                .unwrap_or(tok)
        })
        .collect();
    let mut name = expanded.join(" ");

    // Strip repeatedly so "the journal of x" loses both layers in one call,
    // otherwise normalization would not be idempotent
    loop {
        let mut stripped = false;
        for prefix in STRIP_PREFIXES {
            if let Some(rest) = name.strip_prefix(prefix) {
                if !rest.is_empty() {
                    name = rest.to_string();
                    stripped = true;
                }
                break;
            }
        }
        if !stripped {
            break;
        }
    }

    name
}

/// Lower-case one character, folding common Latin diacritics to ASCII and
/// mapping punctuation to whitespace (so "Chem.-Eng." splits cleanly).
fn fold_char(c: char) -> Option<char> {
    let c = c.to_lowercase().next().unwrap_or(c);
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ñ' => 'n',
        'ç' => 'c',
        'ß' => 's',
        other => other,
    };
    if folded.is_alphanumeric() {
        Some(folded)
    } else if folded.is_whitespace() || folded.is_ascii_punctuation() {
        Some(' ')
    } else {
        None
    }
}

/// Validate an ISSN: `\d{4}-\d{3}[\dX]` shape plus the mod-11 checksum.
pub fn is_valid_issn(issn: &str) -> bool {
    let pattern = match Regex::new(ISSN_PATTERN) {
        Ok(re) => re,
        Err(_) => return false,
    };
    if !pattern.is_match(issn) {
        return false;
    }

    let digits: Vec<u32> = issn
        .chars()
        .filter(|c| *c != '-')
        .map(|c| if c == 'X' { 10 } else { c.to_digit(10).unwrap_or(0) })
        .collect();
    if digits.len() != 8 {
        return false;
    }

    // Weighted sum of the first seven digits, weights 8 down to 2;
    // check digit is (11 - sum mod 11) mod 11, with 10 written as X
    let sum: u32 = digits[..7]
        .iter()
        .enumerate()
        .map(|(i, d)| d * (8 - i as u32))
        .sum();
    let expected = (11 - (sum % 11)) % 11;
    digits[7] == expected
}

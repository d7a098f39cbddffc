//! Strictness policy: maps a precision level to one structural matching rule.
//!
//! Stricter levels reduce false positives on noisy scans at the cost of
//! recall; `Tolerant` trades precision for recall when OCR or formatting is
//! unreliable.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MarkError;

/// Matching precision level, fixed for an entire run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictnessLevel {
    Strict,
    Moderate,
    Tolerant,
}

impl StrictnessLevel {
    /// Parses a level from its lowercase name.
    pub fn parse(name: &str) -> Result<Self, MarkError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(StrictnessLevel::Strict),
            "moderate" => Ok(StrictnessLevel::Moderate),
            "tolerant" => Ok(StrictnessLevel::Tolerant),
            other => Err(MarkError::UnknownStrictness(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrictnessLevel::Strict => "strict",
            StrictnessLevel::Moderate => "moderate",
            StrictnessLevel::Tolerant => "tolerant",
        }
    }
}

lazy_static! {
    /// Exact-format identifiers: 4 digits, J-PL, a digits/`l`/digits body,
    /// TC02-00 revision. The hit value is the captured body.
    static ref STRICT_PATTERN: Regex = Regex::new(r"\d{4}J-PL-(\d+-l-\d+)-TC02-00").unwrap();
    /// Looser structural code: 2 digits, literal L, 4 digits.
    static ref MODERATE_PATTERN: Regex = Regex::new(r"\d{2}-L-\d{4}").unwrap();
    /// Maximal digit runs of length 4 or more.
    static ref DIGIT_RUNS: Regex = Regex::new(r"\d{4,}").unwrap();
}

/// Distinct structural hits for `level` in `text`, in first-appearance order.
///
/// Hits are the pattern's first capture where one exists, otherwise the whole
/// match. Under `Tolerant` a hit is the last four digits of each maximal
/// digit run, which is exactly a 4-digit match not followed by another digit.
pub fn pattern_hits(level: StrictnessLevel, text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut hits = Vec::new();
    let mut push = |value: &str| {
        if seen.insert(value.to_string()) {
            hits.push(value.to_string());
        }
    };

    match level {
        StrictnessLevel::Strict => {
            for caps in STRICT_PATTERN.captures_iter(text) {
                let m = caps.get(1).unwrap_or_else(|| caps.get(0).unwrap());
                push(m.as_str());
            }
        }
        StrictnessLevel::Moderate => {
            for m in MODERATE_PATTERN.find_iter(text) {
                push(m.as_str());
            }
        }
        StrictnessLevel::Tolerant => {
            for m in DIGIT_RUNS.find_iter(text) {
                // `\d` covers every Unicode decimal digit, so the suffix cut
                // must land on a char boundary, not a byte offset.
                let run = m.as_str();
                let cut = run
                    .char_indices()
                    .rev()
                    .nth(3)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                push(&run[cut..]);
            }
        }
    }

    hits
}

/// Last four characters of `tag` when they are all ASCII digits.
pub fn numeric_suffix(tag: &str) -> Option<&str> {
    let suffix = tag.get(tag.len().checked_sub(4)?..)?;
    if suffix.chars().all(|c| c.is_ascii_digit()) {
        Some(suffix)
    } else {
        None
    }
}

/// Window rule for fuzzy OCR matching: the tag's 4-digit suffix with up to
/// 9 leading and 8 trailing word or hyphen characters around it.
pub fn window_pattern(tag: &str) -> Option<Regex> {
    let suffix = numeric_suffix(tag)?;
    Regex::new(&format!(r"[\w-]{{0,9}}{}[\w-]{{0,8}}", suffix)).ok()
}

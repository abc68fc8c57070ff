//! Similarity score extraction from free-text judge verdicts.
//!
//! Judge output is generated text, so extraction tries the following
//! strategies in order:
//! 1. The last labelled score (`Similarity Score: 8/10`, `**Score**: 8`,
//!    `{"score": 8}`). Judges often restate the rubric before the verdict,
//!    so the last occurrence wins. Rubric ranges (`score 1-10`) and other
//!    denominators (`8/100`) are not scores.
//! 2. The whole verdict being a bare number (`8`, `8/10`).
//! 3. Unlabelled `N/10` fractions, accepted only when they all agree.
//!
//! A verdict matching none of these is a [`ScoreParseError::NoScore`]; it is
//! never defaulted to a score.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ScoreParseError;

/// Lowest score on the judge scale.
pub const MIN_SCORE: u32 = 1;
/// Highest score on the judge scale.
pub const MAX_SCORE: u32 = 10;

/// A validated similarity score on the 1-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SimilarityScore(u8);

impl SimilarityScore {
    /// Validate a raw value.
    pub fn new(value: u32) -> Result<Self, ScoreParseError> {
        if (MIN_SCORE..=MAX_SCORE).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ScoreParseError::OutOfRange(value))
        }
    }

    /// Numeric value.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for SimilarityScore {
    type Error = ScoreParseError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SimilarityScore> for u32 {
    fn from(score: SimilarityScore) -> Self {
        u32::from(score.0)
    }
}

impl fmt::Display for SimilarityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn labelled_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // label, optional bracketed rubric, separators, value, optional
        // denominator, optional range tail (`1-10`, `1 to 10`)
        Regex::new(
            r#"(?i)\b(?:similarity[\s_*]*)?score\b(?:\s*[(\[][^)\]]*[)\]])?[\s*_`"':=–—-]*(\d{1,6}(?:\.\d+)?)(?:\s*/\s*(\d+(?:\.\d+)?))?((?:\s*[-–—]\s*|\s+to\s+)10\b)?"#,
        )
        .expect("labelled score regex is valid")
    })
}

fn bare_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*[*_`"']*(\d{1,6}(?:\.\d+)?)(?:\s*/\s*10)?[*_`"'.]*\s*$"#)
            .expect("bare score regex is valid")
    })
}

fn fraction_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,6}(?:\.\d+)?)\s*/\s*10\b").expect("fraction score regex is valid")
    })
}

/// Parse a captured number; fractional values are rounded to the nearest
/// integer.
fn parse_value(raw: &str) -> Option<u32> {
    raw.parse::<f64>().ok().map(|v| v.round() as u32)
}

fn to_score(raw: &str) -> Result<SimilarityScore, ScoreParseError> {
    let value = parse_value(raw).ok_or(ScoreParseError::NoScore)?;
    SimilarityScore::new(value)
}

/// Extract the similarity score from a judge verdict.
///
/// # Errors
///
/// - [`ScoreParseError::NoScore`] when no score pattern is present
/// - [`ScoreParseError::OutOfRange`] when the selected value is not in 1-10
/// - [`ScoreParseError::Conflicting`] when only unlabelled fractions are
///   present and they disagree
pub fn extract_score(verdict: &str) -> Result<SimilarityScore, ScoreParseError> {
    let labelled = labelled_regex()
        .captures_iter(verdict)
        .filter(|caps| caps.get(3).is_none())
        .filter(|caps| {
            caps.get(2)
                .map_or(true, |denominator| denominator.as_str().parse::<f64>() == Ok(10.0))
        })
        .last();
    if let Some(caps) = labelled {
        return to_score(&caps[1]);
    }

    if let Some(caps) = bare_regex().captures(verdict) {
        return to_score(&caps[1]);
    }

    let mut values: Vec<u32> = fraction_regex()
        .captures_iter(verdict)
        .filter_map(|caps| parse_value(&caps[1]))
        .collect();
    values.sort_unstable();
    values.dedup();

    match values.as_slice() {
        [] => Err(ScoreParseError::NoScore),
        [value] => SimilarityScore::new(*value),
        _ => Err(ScoreParseError::Conflicting(values)),
    }
}

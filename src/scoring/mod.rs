//! Judge verdict scoring and the pass policy.

pub mod extractor;

pub use extractor::{extract_score, SimilarityScore, MAX_SCORE, MIN_SCORE};

/// Minimum similarity score for a sample to pass.
pub const PASS_THRESHOLD: u8 = 6;

/// Whether a score meets the pass threshold. This is the only place the
/// threshold is applied.
pub fn passes_threshold(score: SimilarityScore) -> bool {
    score.value() >= PASS_THRESHOLD
}

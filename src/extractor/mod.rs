//! Sequence comparison: raw edit extraction between two sequences.
//!
//! This module finds *what changed*; turning the edits into HGVS-style
//! variants is the job of [`crate::describe`]. The split keeps the
//! alignment free of any notational concerns.

mod extract;
pub mod lcs;

pub use extract::{extract, EditFlags, EditKind, Extracted, RawEdit, SequenceMode};
pub(crate) use extract::weight_position_for;

/// Tuning knobs for one extraction.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Ceiling on `reference_region * sample_region` for the quadratic
    /// longest-common-substring fallback. Regions above it that the k-mer
    /// search cannot handle are described as plain deletion-insertions
    /// instead of exhausting memory and time.
    pub max_dp_area: usize,
    /// Whether inserted material may be described as transposed copies of
    /// reference stretches.
    pub transpositions: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            max_dp_area: 10_000_000,
            transpositions: true,
        }
    }
}

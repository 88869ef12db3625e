//! Extraction of minimal variant descriptions from sequence pairs.
//!
//! Given a reference and an observed sequence, this crate aligns the two
//! and reports the differences as HGVS-style variants: substitutions,
//! deletions, insertions, duplications, inversions, deletion-insertions
//! and transpositions, canonicalized by 3' rolling and weight
//! minimization.
//!
//! ```
//! use hgvs_extractor::describe_dna;
//!
//! let allele = describe_dna("ACGTCGATT", "ACGTCGGTT").unwrap();
//! assert_eq!(allele.to_string(), "7A>G");
//! ```
//!
//! The main entry points are [`describe_dna`], [`describe_protein`] and
//! [`describe_repeats`]; the raw alignment is available through
//! [`extractor::extract`] for callers that want the edits themselves.

pub mod codon;
pub mod describe;
pub mod error;
pub mod extractor;
pub mod normalize;
pub mod repeats;
pub mod sequence;
pub mod variant;

pub use codon::{CodonTable, FrameShiftKind};
pub use describe::{
    describe_dna, describe_dna_with, describe_protein, describe_protein_with, describe_repeats,
    describe_repeats_with, FrameShiftAnnotation, ProteinDescription, RepeatDescription,
};
pub use error::{ExtractorError, Result};
pub use extractor::ExtractorConfig;
pub use repeats::{find_repeat_units, short_tandem_repeats};
pub use variant::{Allele, InsertedSeq, Variant, VariantRecord, VariantType};

//! Error types for hgvs-extractor
//!
//! Caller-facing failures are limited to malformed input (symbols outside
//! the recognized alphabet, malformed codon tables). Anything else that
//! goes wrong mid-extraction is an internal defect and is reported loudly
//! rather than swallowed.

use thiserror::Error;

/// Main error type for extraction operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractorError {
    /// A symbol outside the recognized nucleotide alphabet was encountered
    /// during complement construction. Silently passing the symbol through
    /// would corrupt reverse-complement matching and weight calculations,
    /// so this fails fast with enough context to be actionable.
    #[error("invalid symbol '{symbol}' at position {position}")]
    InvalidSymbol { symbol: char, position: usize },

    /// A codon table string did not contain exactly 64 amino acid codes.
    #[error("codon table must contain 64 amino acids, got {length}")]
    InvalidCodonTable { length: usize },

    /// A sequence could not be translated (length not a multiple of the
    /// codon size, or a base outside A/C/G/T/U).
    #[error("cannot translate sequence: {msg}")]
    Translation { msg: String },

    /// The extracted edits do not tile the input sequences. This indicates
    /// a bug in the alignment, not a caller-input problem.
    #[error("internal tiling inconsistency: {msg}")]
    TilingInconsistency { msg: String },
}

impl ExtractorError {
    /// Create an invalid-symbol error.
    pub fn invalid_symbol(symbol: char, position: usize) -> Self {
        ExtractorError::InvalidSymbol { symbol, position }
    }
}

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractorError>;

//! Nucleotide sequence utilities: IUPAC complement and reverse complement.
//!
//! The complement tables cover the full IUPAC ambiguity alphabet for both
//! DNA ('T') and RNA ('U'), case-insensitively. They are built once at
//! first use and shared read-only across all comparisons; concurrent
//! callers never observe mutation.
//!
//! # Coordinate System
//!
//! All functions here operate on whole strings or 0-based byte slices;
//! no HGVS positions appear at this layer.

use once_cell::sync::Lazy;

use crate::error::{ExtractorError, Result};

/// IUPAC ambiguity pairs shared by the DNA and RNA alphabets.
const AMBIGUOUS_COMPLEMENT: &[(char, char)] = &[
    ('C', 'G'),
    ('G', 'C'),
    ('M', 'K'),
    ('R', 'Y'),
    ('W', 'W'),
    ('S', 'S'),
    ('Y', 'R'),
    ('K', 'M'),
    ('V', 'B'),
    ('H', 'D'),
    ('D', 'H'),
    ('B', 'V'),
    ('X', 'X'),
    ('N', 'N'),
];

/// Byte-indexed complement table, or 0 for symbols outside the alphabet.
type ComplementTable = [u8; 256];

fn make_table(pairs: &[(char, char)]) -> ComplementTable {
    let mut table = [0u8; 256];
    for &(from, to) in pairs {
        table[from as usize] = to as u8;
        table[from.to_ascii_lowercase() as usize] = to.to_ascii_lowercase() as u8;
    }
    table
}

static DNA_COMPLEMENT: Lazy<ComplementTable> = Lazy::new(|| {
    let mut pairs = vec![('A', 'T'), ('T', 'A'), ('U', 'A')];
    pairs.extend_from_slice(AMBIGUOUS_COMPLEMENT);
    make_table(&pairs)
});

static RNA_COMPLEMENT: Lazy<ComplementTable> = Lazy::new(|| {
    let mut pairs = vec![('A', 'U'), ('U', 'A'), ('T', 'A')];
    pairs.extend_from_slice(AMBIGUOUS_COMPLEMENT);
    make_table(&pairs)
});

fn table_for(sequence: &str) -> &'static ComplementTable {
    if sequence.bytes().any(|b| b == b'U' || b == b'u') {
        &RNA_COMPLEMENT
    } else {
        &DNA_COMPLEMENT
    }
}

/// Complement a sequence without reversing it.
///
/// The extractor matches the un-reversed complement string backwards to
/// detect inversions, so the complement and the reversal are kept as
/// separate steps.
///
/// # Errors
///
/// Fails on the first symbol outside the IUPAC alphabet, reporting the
/// symbol and its 0-based position.
pub fn complement(sequence: &str) -> Result<String> {
    let table = table_for(sequence);
    let mut result = Vec::with_capacity(sequence.len());
    for (position, byte) in sequence.bytes().enumerate() {
        let mapped = table[byte as usize];
        if mapped == 0 {
            return Err(ExtractorError::invalid_symbol(byte as char, position));
        }
        result.push(mapped);
    }
    // The table only emits ASCII.
    Ok(String::from_utf8(result).expect("complement table is ASCII"))
}

/// Reverse complement of a sequence.
///
/// Selects the RNA table when the sequence contains 'U', the DNA table
/// otherwise, matching the convention of the ambiguous complement tables
/// in BioPython.
pub fn reverse_complement(sequence: &str) -> Result<String> {
    let complemented = complement(sequence)?;
    Ok(complemented.chars().rev().collect())
}

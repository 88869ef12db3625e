//! Canonicalization primitives: cyclic-permutation rolling and palindrome
//! detection.
//!
//! An indel or inversion boundary found by the aligner is rarely unique;
//! these helpers resolve the ambiguity into one canonical position. The
//! convention applied throughout the crate is to roll fully to the 3'
//! (rightmost) extreme.
//!
//! # Coordinate System
//!
//! | Function | Basis | Notes |
//! |----------|-------|-------|
//! | `roll` span | 1-based inclusive | Matches the HGVS-facing model |
//! | `palinsnoop` | whole string | No positions involved |

use crate::error::Result;
use crate::sequence::reverse_complement;

/// Determine the positional freedom of a pattern by looking at cyclic
/// permutations.
///
/// Not all cyclic permutations are tested at each step: it is sufficient
/// to check `aW` if `Wa` matches (with `a` a letter, `W` a word) when
/// rolling to the left, and symmetrically on the right.
///
/// `first` and `last` delimit the pattern in `s`, 1-based inclusive.
/// Returns `(shift5, shift3)`: how far the pattern can shift left and
/// right while still describing the same sequence content.
///
/// ```
/// use hgvs_extractor::normalize::roll;
///
/// assert_eq!(roll(b"abbabbabbabb", 4, 6), (3, 6));
/// assert_eq!(roll(b"abbabbabbabb", 5, 5), (0, 1));
/// assert_eq!(roll(b"abcccccde", 4, 4), (1, 3));
/// ```
pub fn roll(s: &[u8], first: usize, last: usize) -> (usize, usize) {
    let pattern = &s[first - 1..last];
    let pattern_length = pattern.len() as isize;

    // Keep rolling to the left as long as a cyclic permutation matches.
    let mut minimum = first as isize - 2;
    let mut j = pattern_length - 1;
    while minimum > -1 && s[minimum as usize] == pattern[j.rem_euclid(pattern_length) as usize] {
        j -= 1;
        minimum -= 1;
    }

    // Keep rolling to the right as long as a cyclic permutation matches.
    let mut maximum = last;
    let mut j = 0usize;
    while maximum < s.len() && s[maximum] == pattern[j % pattern.len()] {
        j += 1;
        maximum += 1;
    }

    ((first as isize - minimum - 2) as usize, maximum - last)
}

/// Outcome of a palindrome check on an inverted region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palindromicity {
    /// The first `n` symbols equal the reverse complement; trim that many
    /// from both ends of the inverted region before reporting it.
    Trim(usize),
    /// The sequence equals its own reverse complement; there is no
    /// inversion content to report.
    Perfect,
}

/// Check a sequence for a reverse-complement-palindromic prefix.
///
/// The edges of a partially palindromic inversion are not meaningfully
/// invertible, so the caller trims them before emitting the variant.
///
/// ```
/// use hgvs_extractor::normalize::{palinsnoop, Palindromicity};
///
/// assert_eq!(palinsnoop("TACGCTA").unwrap(), Palindromicity::Trim(2));
/// assert_eq!(palinsnoop("TACGTA").unwrap(), Palindromicity::Perfect);
/// assert_eq!(palinsnoop("TACGCTT").unwrap(), Palindromicity::Trim(0));
/// ```
pub fn palinsnoop(s: &str) -> Result<Palindromicity> {
    let revcomp = reverse_complement(s)?;
    let bytes = s.as_bytes();
    let rc_bytes = revcomp.as_bytes();

    for i in 0..s.len().div_ceil(2) {
        if bytes[i] != rc_bytes[i] {
            return Ok(Palindromicity::Trim(i));
        }
    }
    Ok(Palindromicity::Perfect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_fixtures() {
        assert_eq!(roll(b"abbabbabbabb", 4, 6), (3, 6));
        assert_eq!(roll(b"abbabbabbabb", 5, 5), (0, 1));
        assert_eq!(roll(b"abcccccde", 4, 4), (1, 3));
    }

    #[test]
    fn test_roll_no_freedom() {
        assert_eq!(roll(b"ACGT", 2, 2), (0, 0));
    }

    #[test]
    fn test_roll_at_sequence_edges() {
        // Homopolymer spanning the whole string: full freedom both ways.
        assert_eq!(roll(b"AAAA", 2, 2), (1, 2));
        assert_eq!(roll(b"AAAA", 1, 1), (0, 3));
        assert_eq!(roll(b"AAAA", 4, 4), (3, 0));
    }

    #[test]
    fn test_roll_multibase_pattern() {
        // CG repeated; a two-base pattern rolls in steps of one.
        assert_eq!(roll(b"ACGCGCGT", 2, 3), (0, 4));
    }

    #[test]
    fn test_palinsnoop_fixtures() {
        assert_eq!(palinsnoop("TACGCTA").unwrap(), Palindromicity::Trim(2));
        assert_eq!(palinsnoop("TACGTA").unwrap(), Palindromicity::Perfect);
        assert_eq!(palinsnoop("TACGCTT").unwrap(), Palindromicity::Trim(0));
    }

    #[test]
    fn test_palinsnoop_empty() {
        assert_eq!(palinsnoop("").unwrap(), Palindromicity::Perfect);
    }

    #[test]
    fn test_palinsnoop_rejects_bad_alphabet() {
        assert!(palinsnoop("AC!GT").is_err());
    }
}

//! Property-based tests for extraction and canonicalization
//!
//! Random sequence pairs must always describe cleanly: the structured
//! records have to tile the reference, identical inputs have to collapse
//! to `=`, and the rolling and complement primitives have to preserve
//! their defining invariants.

use hgvs_extractor::extractor::{extract, SequenceMode};
use hgvs_extractor::normalize::{palinsnoop, roll, Palindromicity};
use hgvs_extractor::sequence::reverse_complement;
use hgvs_extractor::{describe_dna, describe_protein, CodonTable, ExtractorConfig};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn dna_sequence(max_length: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!['A', 'C', 'G', 'T']), 0..=max_length)
        .prop_map(|bases| bases.into_iter().collect())
}

fn dna_sequence_nonempty(max_length: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!['A', 'C', 'G', 'T']), 1..=max_length)
        .prop_map(|bases| bases.into_iter().collect())
}

fn protein_sequence(max_length: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select("ACDEFGHIKLMNPQRSTVWY*".chars().collect::<Vec<_>>()),
        0..=max_length,
    )
    .prop_map(|residues| residues.into_iter().collect())
}

// =============================================================================
// Description properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn identity_describes_as_equal(sequence in dna_sequence(60)) {
        let allele = describe_dna(&sequence, &sequence).unwrap();
        prop_assert_eq!(allele.to_string(), "=");
    }

    #[test]
    fn records_tile_the_reference(
        reference in dna_sequence(40),
        observed in dna_sequence(40),
    ) {
        let allele = describe_dna(&reference, &observed).unwrap();
        let records = allele.to_records(reference.len()).unwrap();

        let mut position = 0usize;
        for record in &records {
            prop_assert_eq!(record.location.start.position, position);
            prop_assert!(record.location.end.position >= record.location.start.position);
            position = record.location.end.position;
        }
        prop_assert_eq!(position, reference.len());
    }

    #[test]
    fn extraction_weight_never_exceeds_trivial_description(
        reference in dna_sequence(40),
        observed in dna_sequence(40),
    ) {
        let extracted = extract(
            &reference,
            &observed,
            SequenceMode::Dna,
            &ExtractorConfig::default(),
        )
        .unwrap();
        // Any region can always be described as one deletion-insertion
        // spelling out the observed side; the extractor must never pick
        // something heavier.
        let bound = 2 * extracted.weight_position + 1 + 6 + observed.len();
        prop_assert!(extracted.weight <= bound);
    }

    #[test]
    fn protein_identity_describes_as_equal(sequence in protein_sequence(40)) {
        let table = CodonTable::standard();
        let description = describe_protein(&sequence, &sequence, &table).unwrap();
        prop_assert_eq!(description.allele.to_string(), "=");
        prop_assert!(description.frame_shifts.is_empty());
    }
}

// =============================================================================
// Primitive invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn reverse_complement_is_an_involution(sequence in dna_sequence(80)) {
        let once = reverse_complement(&sequence).unwrap();
        let twice = reverse_complement(&once).unwrap();
        prop_assert_eq!(twice, sequence);
    }

    #[test]
    fn constructed_palindromes_are_perfect(half in dna_sequence(20)) {
        let palindrome = format!("{}{}", half, reverse_complement(&half).unwrap());
        prop_assert_eq!(
            palinsnoop(&palindrome).unwrap(),
            Palindromicity::Perfect
        );
    }

    #[test]
    fn rolled_spans_delete_the_same_content(
        sequence in dna_sequence_nonempty(30),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let length = sequence.len();
        let (mut first, mut last) = (a.index(length) + 1, b.index(length) + 1);
        if first > last {
            std::mem::swap(&mut first, &mut last);
        }

        let (shift5, shift3) = roll(sequence.as_bytes(), first, last);

        // Removing the span at any shifted position leaves the same
        // remainder; that is exactly what positional freedom means.
        let remove = |start: usize, end: usize| {
            format!("{}{}", &sequence[..start - 1], &sequence[end..])
        };
        let canonical = remove(first, last);
        for shift in 1..=shift5 {
            prop_assert_eq!(remove(first - shift, last - shift), canonical.clone());
        }
        for shift in 1..=shift3 {
            prop_assert_eq!(remove(first + shift, last + shift), canonical.clone());
        }
    }
}

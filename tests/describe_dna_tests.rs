//! End-to-end tests for DNA descriptions
//!
//! These exercise the public `describe_dna` path: extraction,
//! canonicalization and both serialization forms, against a fixed
//! reference sequence.

use hgvs_extractor::sequence::reverse_complement;
use hgvs_extractor::variant::VariantType;
use hgvs_extractor::{describe_dna, describe_repeats, find_repeat_units};

const REFERENCE: &str = "ACGTCGATTCGCTAGCTTCGGGGGATAGATAGAGATATAGAGAT";

// =============================================================================
// Single variants
// =============================================================================

#[test]
fn test_identity_is_equal() {
    let allele = describe_dna(REFERENCE, REFERENCE).unwrap();
    assert_eq!(allele.to_string(), "=");
    assert_eq!(allele.len(), 1);
    assert_eq!(allele.variants[0].variant_type, VariantType::Equal);

    let records = allele.to_records(REFERENCE.len()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, "equal");
    assert_eq!(records[0].location.end.position, REFERENCE.len());
}

#[test]
fn test_single_substitution() {
    let mut observed = REFERENCE.to_string();
    observed.replace_range(6..7, "G");
    let allele = describe_dna(REFERENCE, &observed).unwrap();
    assert_eq!(allele.to_string(), "7A>G");

    let records = allele.to_records(REFERENCE.len()).unwrap();
    let kinds: Vec<&str> = records.iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(kinds, vec!["equal", "deletion_insertion", "equal"]);
    assert_eq!(records[1].location.start.position, 6);
    assert_eq!(records[1].location.end.position, 7);
    let insertion = &records[1].insertions[0];
    assert_eq!(insertion.source, "observed");
    let location = insertion.location.as_ref().unwrap();
    assert_eq!(location.start.position, 6);
    assert_eq!(location.end.position, 7);
}

#[test]
fn test_range_deletion() {
    let mut observed = REFERENCE.to_string();
    observed.replace_range(8..10, "");
    let allele = describe_dna(REFERENCE, &observed).unwrap();
    assert_eq!(allele.to_string(), "9_10del");
}

#[test]
fn test_deletion_insertion() {
    let mut observed = REFERENCE.to_string();
    observed.replace_range(6..9, "GGG");
    let allele = describe_dna(REFERENCE, &observed).unwrap();
    assert_eq!(allele.to_string(), "7_9delinsGGG");
}

#[test]
fn test_swapped_dinucleotide_is_deletion_insertion() {
    let allele = describe_dna("GGATCC", "GGTACC").unwrap();
    assert_eq!(allele.to_string(), "3_4delinsTA");
}

#[test]
fn test_inversion() {
    let mut observed = REFERENCE.to_string();
    let inverted = reverse_complement(&REFERENCE[6..11]).unwrap();
    observed.replace_range(6..11, &inverted);
    let allele = describe_dna(REFERENCE, &observed).unwrap();
    assert_eq!(allele.to_string(), "7_11inv");

    let records = allele.to_records(REFERENCE.len()).unwrap();
    let kinds: Vec<&str> = records.iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(kinds, vec!["equal", "inversion", "equal"]);
    assert_eq!(records[1].location.start.position, 6);
    assert_eq!(records[1].location.end.position, 11);
    assert_eq!(records[2].location.end.position, REFERENCE.len());
}

// =============================================================================
// Canonicalization
// =============================================================================

#[test]
fn test_duplication_beats_insertion() {
    // Inserting an extra copy of the A at position 7 is a duplication.
    let mut observed = REFERENCE.to_string();
    observed.insert(7, 'A');
    let allele = describe_dna(REFERENCE, &observed).unwrap();
    assert_eq!(allele.to_string(), "7dup");
    assert_eq!(allele.variants[0].variant_type, VariantType::Duplication);

    // The same insertion of an unrelated base stays an insertion.
    let mut observed = REFERENCE.to_string();
    observed.insert(7, 'C');
    let allele = describe_dna(REFERENCE, &observed).unwrap();
    assert_eq!(allele.to_string(), "7_8insC");
}

#[test]
fn test_deletion_in_homopolymer_reports_three_prime_end() {
    // The G run spans positions 20..24 (1-based); deleting any one of the
    // five Gs must be reported as 24del.
    let mut observed = REFERENCE.to_string();
    observed.replace_range(19..20, "");
    let allele = describe_dna(REFERENCE, &observed).unwrap();
    assert_eq!(allele.to_string(), "24del");
}

// =============================================================================
// Multiple variants
// =============================================================================

#[test]
fn test_two_substitutions() {
    let mut observed = REFERENCE.to_string();
    observed.replace_range(6..7, "G");
    observed.replace_range(36..37, "C");
    let allele = describe_dna(REFERENCE, &observed).unwrap();
    assert_eq!(allele.to_string(), "[7A>G;37A>C]");

    let records = allele.to_records(REFERENCE.len()).unwrap();
    let kinds: Vec<&str> = records.iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(
        kinds,
        vec![
            "equal",
            "deletion_insertion",
            "equal",
            "deletion_insertion",
            "equal"
        ]
    );
}

// =============================================================================
// Unknown and degenerate inputs
// =============================================================================

#[test]
fn test_unknown_sequence() {
    assert_eq!(describe_dna("?", REFERENCE).unwrap().to_string(), "?");
    assert_eq!(describe_dna(REFERENCE, "?").unwrap().to_string(), "?");

    let records = describe_dna(REFERENCE, "?")
        .unwrap()
        .to_records(REFERENCE.len())
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, "unknown");
}

#[test]
fn test_empty_sequences() {
    let allele = describe_dna("", "").unwrap();
    assert!(allele.is_empty());
    assert!(allele.to_records(0).unwrap().is_empty());
}

#[test]
fn test_rejects_invalid_alphabet() {
    assert!(describe_dna("AC!GT", "ACGT").is_err());
}

// =============================================================================
// Repeats
// =============================================================================

#[test]
fn test_repeat_units_feed_repeat_description() {
    let reference = format!("AGCTGTGGGA{}CCATGCTAG", "TCCT".repeat(6));
    let observed = format!("AGCTGTGGGA{}CCATGCTAG", "TCCT".repeat(9));
    let units = find_repeat_units(&reference, 2, 3);
    assert!(units.contains(&"TCCT".to_string()));

    let description = describe_repeats(&reference, &observed, &units).unwrap();
    let repeat = description
        .allele
        .iter()
        .find(|v| v.variant_type == VariantType::Repeat)
        .unwrap();
    assert_eq!(repeat.count, 9);
    assert_eq!(description.window_start, 10);
    assert_eq!(description.window_end, 10 + 4 * 6);
}

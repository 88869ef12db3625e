//! Turning raw edits into HGVS-style variant descriptions.
//!
//! [`describe_dna`] is the main entry point: it extracts the edits
//! between two nucleotide sequences and converts each into a canonical
//! [`Variant`], applying 3' rolling, duplication detection and palindrome
//! trimming, and folding transposition runs into compound insertions.
//!
//! [`describe_protein`] does the same for amino acid sequences and
//! additionally reports which changed regions are explainable as frame
//! shifts. [`describe_repeats`] describes two sequences around a known
//! short tandem repeat structure.
//!
//! # Coordinate System
//!
//! | Value | Basis |
//! |-------|-------|
//! | [`Variant`] positions | 1-based inclusive |
//! | [`FrameShiftAnnotation`] positions | 1-based inclusive |
//! | [`RepeatDescription`] window | 0-based half-open |

use log::debug;

use crate::codon::{CodonTable, FrameShiftKind};
use crate::error::Result;
use crate::extractor::{
    extract, weight_position_for, EditKind, Extracted, ExtractorConfig, RawEdit, SequenceMode,
};
use crate::normalize::{palinsnoop, roll, Palindromicity};
use crate::sequence::reverse_complement;
use crate::variant::{Allele, InsertedSeq, Variant, VariantType};

/// Placeholder for a sequence that could not be determined.
const UNKNOWN_SEQUENCE: &str = "?";

/// Describe the difference between two DNA/RNA sequences as an allele of
/// canonical variants.
pub fn describe_dna(reference: &str, observed: &str) -> Result<Allele> {
    describe_dna_with(reference, observed, &ExtractorConfig::default())
}

/// [`describe_dna`] with explicit extraction settings.
pub fn describe_dna_with(
    reference: &str,
    observed: &str,
    config: &ExtractorConfig,
) -> Result<Allele> {
    if reference == UNKNOWN_SEQUENCE || observed == UNKNOWN_SEQUENCE {
        return Ok(Allele::new(vec![Variant::unknown()]));
    }
    if reference.is_empty() && observed.is_empty() {
        return Ok(Allele::default());
    }

    let extracted = extract(reference, observed, SequenceMode::Dna, config)?;
    let variants = fold_edits(reference, observed, &extracted)?;
    if variants.is_empty() {
        return Ok(Allele::new(vec![Variant::equal(
            reference.len(),
            observed.len(),
        )]));
    }
    Ok(Allele::new(variants))
}

/// Convert the extracted edits into variants, folding transposition runs
/// into single compound insertions or deletion-insertions.
fn fold_edits(reference: &str, observed: &str, extracted: &Extracted) -> Result<Vec<Variant>> {
    let weight_position = extracted.weight_position;
    let mut variants = Vec::new();
    let mut in_transposition = 0usize;
    let mut inserted: Vec<InsertedSeq> = Vec::new();
    let mut run_sample_start = 0usize;

    for (index, edit) in extracted.edits.iter().enumerate() {
        if edit.flags.transposition_open {
            if in_transposition == 0 {
                inserted.clear();
                run_sample_start = edit.sample_start;
            }
            in_transposition += 1;
        }

        if in_transposition > 0 {
            inserted.push(fragment_to_inserted(reference, observed, edit)?);
        } else if edit.flags.kind != EditKind::Identity {
            let limit = roll_limit(&extracted.edits, index);
            if let Some(variant) =
                build_variant(reference, observed, edit, weight_position, limit)?
            {
                variants.push(variant);
            }
        }

        if edit.flags.transposition_close {
            in_transposition -= 1;
            if in_transposition == 0 {
                variants.push(compound_variant(
                    reference,
                    edit,
                    run_sample_start,
                    std::mem::take(&mut inserted),
                    weight_position,
                ));
            }
        }
    }
    debug!("fold_edits: {} variants", variants.len());
    Ok(variants)
}

/// One transposition fragment as inserted material.
fn fragment_to_inserted(reference: &str, observed: &str, edit: &RawEdit) -> Result<InsertedSeq> {
    match edit.flags.kind {
        EditKind::Identity => Ok(InsertedSeq::Range {
            start: edit.transposition_start + 1,
            end: edit.transposition_end,
            reverse: false,
            sequence: reference[edit.transposition_start..edit.transposition_end].to_string(),
        }),
        EditKind::ReverseComplement => Ok(InsertedSeq::Range {
            start: edit.transposition_start + 1,
            end: edit.transposition_end,
            reverse: true,
            sequence: reverse_complement(
                &reference[edit.transposition_start..edit.transposition_end],
            )?,
        }),
        EditKind::Substitution => Ok(InsertedSeq::Literal {
            sequence: observed[edit.sample_start..edit.sample_end].to_string(),
        }),
    }
}

/// The enclosing variant of a finished transposition run.
fn compound_variant(
    reference: &str,
    close_edit: &RawEdit,
    run_sample_start: usize,
    inserted: Vec<InsertedSeq>,
    weight_position: usize,
) -> Variant {
    let reference_start = close_edit.reference_start;
    let reference_end = close_edit.reference_end;
    let mut variant = if reference_start == reference_end {
        let mut variant = Variant::new(VariantType::Insertion, weight_position);
        variant.start = reference_start;
        variant.end = reference_start + 1;
        variant
    } else {
        let mut variant = Variant::new(VariantType::DeletionInsertion, weight_position);
        variant.start = reference_start + 1;
        variant.end = reference_end;
        variant.deleted = reference[reference_start..reference_end].to_string();
        variant
    };
    variant.inserted = inserted;
    variant.reference_span = (reference_start, reference_end);
    variant.sample_span = (run_sample_start, close_edit.sample_end);
    variant
}

/// How far an edit may roll to the 3' side: through the identity stretch
/// that follows it, and no further. Rolling past it would describe
/// content that no longer matches the observed sequence and would make
/// the variant overlap its successor.
fn roll_limit(edits: &[RawEdit], index: usize) -> usize {
    match edits.get(index + 1) {
        Some(next) if next.flags.kind == EditKind::Identity && !next.in_transposition() => {
            next.reference_end - next.reference_start
        }
        Some(_) => 0,
        None => usize::MAX,
    }
}

/// Build one canonical variant from a substituted or reverse-complement
/// edit.
///
/// Insertions and deletions are rolled to their 3'-most position;
/// an insertion that equals the immediately preceding material in both
/// sequences becomes a duplication; inversions are trimmed of their
/// palindromic edges, and a perfectly palindromic inversion (which leaves
/// the sequence unchanged) is dropped entirely.
fn build_variant(
    reference: &str,
    observed: &str,
    edit: &RawEdit,
    weight_position: usize,
    roll_limit: usize,
) -> Result<Option<Variant>> {
    let mut reference_start = edit.reference_start;
    let mut reference_end = edit.reference_end;
    let mut sample_start = edit.sample_start;
    let mut sample_end = edit.sample_end;

    // Insertion or duplication.
    if reference_start == reference_end {
        let inserted_length = sample_end - sample_start;
        let (shift5, shift3) = roll(observed.as_bytes(), sample_start + 1, sample_end);
        let shift3 = shift3.min(roll_limit);
        reference_start += shift3;
        reference_end += shift3;
        sample_start += shift3;
        sample_end += shift3;

        let inserted_seq = &observed[sample_start..sample_end];
        let duplicates_reference = reference_start >= inserted_length
            && &reference[reference_start - inserted_length..reference_start] == inserted_seq;
        let duplicates_observed = sample_start >= inserted_length
            && &observed[sample_start - inserted_length..sample_start] == inserted_seq;

        let mut variant = if duplicates_reference && duplicates_observed {
            let mut variant = Variant::new(VariantType::Duplication, weight_position);
            variant.start = reference_start - inserted_length + 1;
            variant.end = reference_end;
            variant
        } else {
            let mut variant = Variant::new(VariantType::Insertion, weight_position);
            variant.start = reference_start;
            variant.end = reference_start + 1;
            variant
        };
        variant.inserted = vec![InsertedSeq::Literal {
            sequence: inserted_seq.to_string(),
        }];
        variant.shift = shift5 + shift3;
        variant.reference_span = (edit.reference_start + shift3, edit.reference_end + shift3);
        variant.sample_span = (sample_start, sample_end);
        return Ok(Some(variant));
    }

    // Deletion.
    if sample_start == sample_end {
        let (shift5, shift3) = roll(reference.as_bytes(), reference_start + 1, reference_end);
        let shift3 = shift3.min(roll_limit);
        reference_start += shift3;
        reference_end += shift3;
        let mut variant = Variant::new(VariantType::Deletion, weight_position);
        variant.start = reference_start + 1;
        variant.end = reference_end;
        variant.shift = shift5 + shift3;
        variant.reference_span = (reference_start, reference_end);
        variant.sample_span = (sample_start + shift3, sample_end + shift3);
        return Ok(Some(variant));
    }

    // Substitution.
    if reference_end - reference_start == 1 && sample_end - sample_start == 1 {
        let mut variant = Variant::new(VariantType::Substitution, weight_position);
        variant.start = reference_start + 1;
        variant.end = reference_end;
        variant.deleted = reference[reference_start..reference_end].to_string();
        variant.inserted = vec![InsertedSeq::Literal {
            sequence: observed[sample_start..sample_end].to_string(),
        }];
        variant.reference_span = (reference_start, reference_end);
        variant.sample_span = (sample_start, sample_end);
        return Ok(Some(variant));
    }

    // Inversion.
    if edit.flags.kind == EditKind::ReverseComplement {
        match palinsnoop(&reference[reference_start..reference_end])? {
            // Inverting a perfect palindrome changes nothing.
            Palindromicity::Perfect => return Ok(None),
            Palindromicity::Trim(trim) => {
                reference_start += trim;
                reference_end -= trim;
                sample_start += trim;
                sample_end -= trim;
            }
        }
        let mut variant = Variant::new(VariantType::Inversion, weight_position);
        variant.start = reference_start + 1;
        variant.end = reference_end;
        variant.reference_span = (reference_start, reference_end);
        variant.sample_span = (sample_start, sample_end);
        return Ok(Some(variant));
    }

    // Deletion-insertion.
    let mut variant = Variant::new(VariantType::DeletionInsertion, weight_position);
    variant.start = reference_start + 1;
    variant.end = reference_end;
    variant.deleted = reference[reference_start..reference_end].to_string();
    variant.inserted = vec![InsertedSeq::Literal {
        sequence: observed[sample_start..sample_end].to_string(),
    }];
    variant.reference_span = (reference_start, reference_end);
    variant.sample_span = (sample_start, sample_end);
    Ok(Some(variant))
}

/// A changed protein region that is explainable as a frame shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameShiftAnnotation {
    /// 1-based inclusive span in the reference protein.
    pub start: usize,
    pub end: usize,
    /// 1-based inclusive span in the observed protein.
    pub sample_start: usize,
    pub sample_end: usize,
    /// Every frame-shift kind compatible with the whole region.
    pub kinds: Vec<FrameShiftKind>,
}

/// The result of a protein comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinDescription {
    pub allele: Allele,
    pub frame_shifts: Vec<FrameShiftAnnotation>,
}

/// Describe the difference between two protein sequences, with
/// frame-shift annotations derived from the codon table.
pub fn describe_protein(
    reference: &str,
    observed: &str,
    table: &CodonTable,
) -> Result<ProteinDescription> {
    describe_protein_with(reference, observed, table, &ExtractorConfig::default())
}

/// [`describe_protein`] with explicit extraction settings.
pub fn describe_protein_with(
    reference: &str,
    observed: &str,
    table: &CodonTable,
    config: &ExtractorConfig,
) -> Result<ProteinDescription> {
    if reference == UNKNOWN_SEQUENCE || observed == UNKNOWN_SEQUENCE {
        return Ok(ProteinDescription {
            allele: Allele::new(vec![Variant::unknown()]),
            frame_shifts: Vec::new(),
        });
    }
    if reference.is_empty() && observed.is_empty() {
        return Ok(ProteinDescription {
            allele: Allele::default(),
            frame_shifts: Vec::new(),
        });
    }

    let extracted = extract(reference, observed, SequenceMode::Protein, config)?;
    let weight_position = extracted.weight_position;
    let mut variants = Vec::new();
    let mut frame_shifts = Vec::new();

    for (index, edit) in extracted.edits.iter().enumerate() {
        if edit.flags.kind == EditKind::Identity {
            continue;
        }
        if edit.reference_end > edit.reference_start && edit.sample_end > edit.sample_start {
            let kinds = table.frame_shift_kinds(
                &reference[edit.reference_start..edit.reference_end],
                &observed[edit.sample_start..edit.sample_end],
            );
            if !kinds.is_empty() {
                frame_shifts.push(FrameShiftAnnotation {
                    start: edit.reference_start + 1,
                    end: edit.reference_end,
                    sample_start: edit.sample_start + 1,
                    sample_end: edit.sample_end,
                    kinds,
                });
            }
        }
        let limit = roll_limit(&extracted.edits, index);
        if let Some(variant) = build_variant(reference, observed, edit, weight_position, limit)? {
            variants.push(variant);
        }
    }

    // A trailing deletion-insertion covered by a frame-shift annotation is
    // most plausibly the tail of a frame-shifted protein.
    if let Some(last) = variants.last_mut() {
        if last.variant_type == VariantType::DeletionInsertion
            && frame_shifts
                .iter()
                .any(|annotation| annotation.start >= last.start)
        {
            last.frame_shift = true;
        }
    }

    if variants.is_empty() {
        variants.push(Variant::equal(reference.len(), observed.len()));
    }
    Ok(ProteinDescription {
        allele: Allele::new(variants),
        frame_shifts,
    })
}

/// The result of a repeat-aware comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatDescription {
    pub allele: Allele,
    /// 0-based half-open reference span covered by the repeat structure,
    /// or `(0, 0)` when the description fell back to a plain comparison.
    pub window_start: usize,
    pub window_end: usize,
}

/// One maximal run of a repeat unit.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RepeatRun {
    start: usize,
    end: usize,
    unit: String,
    count: usize,
}

/// Describe two sequences around a known repeat structure.
///
/// Both sequences are scanned for maximal runs (two or more consecutive
/// copies) of the given units. When the run structures correspond run for
/// run, each run pair becomes a repeat variant carrying the observed copy
/// count, and the stretches between runs are described normally with
/// their positions mapped back to the full sequences. When the structures
/// do not correspond the whole comparison falls back to [`describe_dna`].
pub fn describe_repeats(
    reference: &str,
    observed: &str,
    units: &[String],
) -> Result<RepeatDescription> {
    describe_repeats_with(reference, observed, units, &ExtractorConfig::default())
}

/// [`describe_repeats`] with explicit extraction settings.
pub fn describe_repeats_with(
    reference: &str,
    observed: &str,
    units: &[String],
    config: &ExtractorConfig,
) -> Result<RepeatDescription> {
    if reference == UNKNOWN_SEQUENCE || observed == UNKNOWN_SEQUENCE {
        return Ok(RepeatDescription {
            allele: Allele::new(vec![Variant::unknown()]),
            window_start: 0,
            window_end: 0,
        });
    }

    let reference_runs = find_runs(reference, units);
    let observed_runs = find_runs(observed, units);
    let comparable = !reference_runs.is_empty()
        && reference_runs.len() == observed_runs.len()
        && reference_runs
            .iter()
            .zip(&observed_runs)
            .all(|(a, b)| a.unit == b.unit);
    if !comparable {
        debug!(
            "describe_repeats: run structures do not correspond ({} vs {}), falling back",
            reference_runs.len(),
            observed_runs.len()
        );
        let allele = describe_dna_with(reference, observed, config)?;
        return Ok(RepeatDescription {
            allele,
            window_start: 0,
            window_end: 0,
        });
    }

    let weight_position = weight_position_for(reference.len());
    let mut variants = Vec::new();
    let mut reference_pos = 0usize;
    let mut observed_pos = 0usize;

    for (reference_run, observed_run) in reference_runs.iter().zip(&observed_runs) {
        describe_segment(
            reference,
            observed,
            (reference_pos, reference_run.start),
            (observed_pos, observed_run.start),
            config,
            &mut variants,
        )?;

        let mut repeat = Variant::new(VariantType::Repeat, weight_position);
        repeat.start = reference_run.start + 1;
        repeat.end = reference_run.end;
        repeat.count = observed_run.count;
        repeat.inserted = vec![InsertedSeq::Literal {
            sequence: reference_run.unit.clone(),
        }];
        repeat.reference_span = (reference_run.start, reference_run.end);
        repeat.sample_span = (observed_run.start, observed_run.end);
        variants.push(repeat);

        reference_pos = reference_run.end;
        observed_pos = observed_run.end;
    }
    describe_segment(
        reference,
        observed,
        (reference_pos, reference.len()),
        (observed_pos, observed.len()),
        config,
        &mut variants,
    )?;

    Ok(RepeatDescription {
        allele: Allele::new(variants),
        window_start: reference_runs[0].start,
        window_end: reference_runs[reference_runs.len() - 1].end,
    })
}

/// Describe one stretch between repeat runs and map its variants back to
/// full-sequence positions.
fn describe_segment(
    reference: &str,
    observed: &str,
    reference_span: (usize, usize),
    observed_span: (usize, usize),
    config: &ExtractorConfig,
    variants: &mut Vec<Variant>,
) -> Result<()> {
    if reference_span.0 == reference_span.1 && observed_span.0 == observed_span.1 {
        return Ok(());
    }
    let allele = describe_dna_with(
        &reference[reference_span.0..reference_span.1],
        &observed[observed_span.0..observed_span.1],
        config,
    )?;
    for mut variant in allele {
        if variant.variant_type == VariantType::Equal {
            continue;
        }
        variant.offset(reference_span.0, observed_span.0);
        variants.push(variant);
    }
    Ok(())
}

/// Maximal runs (two or more consecutive copies) of the given units, in
/// order of appearance. Longer units take precedence at equal positions.
fn find_runs(sequence: &str, units: &[String]) -> Vec<RepeatRun> {
    let bytes = sequence.as_bytes();
    let mut by_length: Vec<&String> = units.iter().filter(|unit| !unit.is_empty()).collect();
    by_length.sort_by_key(|unit| std::cmp::Reverse(unit.len()));

    let mut runs = Vec::new();
    let mut i = 0usize;
    'scan: while i < bytes.len() {
        for unit in &by_length {
            let unit_bytes = unit.as_bytes();
            let mut count = 0usize;
            let mut j = i;
            while bytes[j..].starts_with(unit_bytes) {
                count += 1;
                j += unit_bytes.len();
            }
            if count >= 2 {
                runs.push(RepeatRun {
                    start: i,
                    end: j,
                    unit: (*unit).clone(),
                    count,
                });
                i = j;
                continue 'scan;
            }
        }
        i += 1;
    }
    runs
}

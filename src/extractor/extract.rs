//! Weighted recursive edit extraction.
//!
//! The extractor compares a reference and a sample sequence and produces
//! an ordered list of [`RawEdit`]s that tile both: identity stretches,
//! reverse-complement stretches and substituted regions. Descriptions
//! compete by weight; a region is only decomposed around a longest common
//! substring when the decomposition is not heavier than describing the
//! region as one deletion-insertion.
//!
//! Inserted regions that are too long to spell out are additionally
//! checked for transposition: the inserted material is recursively cut
//! into stretches copied from anywhere in the reference (possibly reverse
//! complemented) and literal gaps. A transposition is kept only when it is
//! cheaper than the plain description.
//!
//! # Coordinate System
//!
//! All edit coordinates are 0-based half-open spans over the full input
//! strings.

use log::{debug, trace};

use super::lcs::{lcs, Substring};
use super::ExtractorConfig;
use crate::error::{ExtractorError, Result};
use crate::sequence;
use crate::variant::{
    WEIGHT_BASE, WEIGHT_DELETION, WEIGHT_DELETION_INSERTION, WEIGHT_INSERTION, WEIGHT_INVERSION,
    WEIGHT_SEPARATOR, WEIGHT_SUBSTITUTION,
};

/// How a raw edit maps sample content onto the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// The spans contain the same sequence.
    Identity,
    /// The sample span is the reverse complement of the reference span.
    ReverseComplement,
    /// The sample span replaces the reference span.
    Substitution,
}

/// Edit classification plus transposition run markers.
///
/// A transposition run is a maximal group of consecutive edits that
/// together describe the inserted material of one variant; the first edit
/// carries `transposition_open`, the last `transposition_close` (both on
/// a single-fragment run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditFlags {
    pub kind: EditKind,
    pub transposition_open: bool,
    pub transposition_close: bool,
}

impl EditFlags {
    fn new(kind: EditKind) -> Self {
        EditFlags {
            kind,
            transposition_open: false,
            transposition_close: false,
        }
    }
}

/// One aligned piece of the comparison.
///
/// Outside transposition runs the reference and sample spans of
/// consecutive edits abut and tile both sequences. Inside a run all
/// fragments share the enclosing variant's reference span, the sample
/// spans tile the inserted material, and `transposition_start..end` gives
/// the reference source of copied fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEdit {
    pub reference_start: usize,
    pub reference_end: usize,
    pub sample_start: usize,
    pub sample_end: usize,
    pub transposition_start: usize,
    pub transposition_end: usize,
    pub flags: EditFlags,
}

impl RawEdit {
    fn new(
        kind: EditKind,
        reference_start: usize,
        reference_end: usize,
        sample_start: usize,
        sample_end: usize,
    ) -> Self {
        RawEdit {
            reference_start,
            reference_end,
            sample_start,
            sample_end,
            transposition_start: 0,
            transposition_end: 0,
            flags: EditFlags::new(kind),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.flags.kind == EditKind::Identity
    }

    pub fn in_transposition(&self) -> bool {
        self.flags.transposition_open || self.flags.transposition_close
    }
}

/// Match space selection for one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMode {
    /// Nucleotides: reverse-complement matching and transposition
    /// detection are available.
    Dna,
    /// Amino acids: forward matching only.
    Protein,
}

/// The result of one extraction.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub edits: Vec<RawEdit>,
    /// Total description weight of the non-identity edits.
    pub weight: usize,
    /// Digits needed for a position in this reference; all variant
    /// weights derived from this extraction use it.
    pub weight_position: usize,
}

struct Context<'a> {
    reference: &'a [u8],
    complement: Option<Vec<u8>>,
    sample: &'a [u8],
    weight_position: usize,
    config: &'a ExtractorConfig,
}

impl Context<'_> {
    fn complement_slice(&self) -> Option<&[u8]> {
        self.complement.as_deref()
    }

    fn transpositions_enabled(&self) -> bool {
        self.config.transpositions && self.complement.is_some() && !self.reference.is_empty()
    }
}

/// Number of digits needed for a position in a reference of this length.
pub(crate) fn weight_position_for(reference_length: usize) -> usize {
    let digits = (reference_length.max(1) as f64).log10().ceil() as usize;
    digits.max(1)
}

/// Extract the raw edits between a reference and a sample sequence.
pub fn extract(
    reference: &str,
    sample: &str,
    mode: SequenceMode,
    config: &ExtractorConfig,
) -> Result<Extracted> {
    let reference_bytes = reference.as_bytes();
    let sample_bytes = sample.as_bytes();

    let complement = match mode {
        SequenceMode::Dna => Some(sequence::complement(reference)?.into_bytes()),
        SequenceMode::Protein => None,
    };
    let weight_position = weight_position_for(reference_bytes.len());

    let context = Context {
        reference: reference_bytes,
        complement,
        sample: sample_bytes,
        weight_position,
        config,
    };

    // Strip the common prefix and suffix before aligning; they are by far
    // the largest part of a typical comparison.
    let prefix = common_prefix(reference_bytes, sample_bytes);
    let suffix = common_suffix(reference_bytes, sample_bytes, prefix);
    debug!(
        "extract: lengths {}/{}, prefix {}, suffix {}, weight_position {}",
        reference_bytes.len(),
        sample_bytes.len(),
        prefix,
        suffix,
        weight_position
    );

    let mut edits = Vec::new();
    if prefix > 0 {
        edits.push(RawEdit::new(EditKind::Identity, 0, prefix, 0, prefix));
    }
    let (middle, weight) = extract_region(
        &context,
        prefix,
        reference_bytes.len() - suffix,
        prefix,
        sample_bytes.len() - suffix,
    );
    edits.extend(middle);
    if suffix > 0 {
        edits.push(RawEdit::new(
            EditKind::Identity,
            reference_bytes.len() - suffix,
            reference_bytes.len(),
            sample_bytes.len() - suffix,
            sample_bytes.len(),
        ));
    }

    verify_tiling(&edits, reference_bytes.len(), sample_bytes.len())?;
    Ok(Extracted {
        edits,
        weight,
        weight_position,
    })
}

fn common_prefix(reference: &[u8], sample: &[u8]) -> usize {
    reference
        .iter()
        .zip(sample)
        .take_while(|(a, b)| a == b)
        .count()
}

fn common_suffix(reference: &[u8], sample: &[u8], prefix: usize) -> usize {
    let bound = reference.len().min(sample.len()) - prefix;
    (0..bound)
        .take_while(|&i| reference[reference.len() - 1 - i] == sample[sample.len() - 1 - i])
        .count()
}

/// Recursively extract one region, returning edits and their weight.
fn extract_region(
    context: &Context<'_>,
    reference_start: usize,
    reference_end: usize,
    sample_start: usize,
    sample_end: usize,
) -> (Vec<RawEdit>, usize) {
    let reference_length = reference_end - reference_start;
    let sample_length = sample_end - sample_start;
    let weight_position = context.weight_position;

    if reference_length == 0 && sample_length == 0 {
        return (Vec::new(), 0);
    }

    // Pure deletion.
    if sample_length == 0 {
        let mut weight = weight_position + WEIGHT_DELETION;
        if reference_length > 1 {
            weight += weight_position + WEIGHT_SEPARATOR;
        }
        let edit = RawEdit::new(
            EditKind::Substitution,
            reference_start,
            reference_end,
            sample_start,
            sample_end,
        );
        return (vec![edit], weight);
    }

    // Pure insertion; long insertions are candidates for transposition.
    if reference_length == 0 {
        let weight =
            2 * weight_position + WEIGHT_SEPARATOR + WEIGHT_INSERTION + WEIGHT_BASE * sample_length;
        if let Some((edits, transposition_weight)) = try_transposition(
            context,
            reference_start,
            reference_end,
            sample_start,
            sample_end,
        ) {
            if transposition_weight < weight {
                return (edits, transposition_weight);
            }
        }
        let edit = RawEdit::new(
            EditKind::Substitution,
            reference_start,
            reference_end,
            sample_start,
            sample_end,
        );
        return (vec![edit], weight);
    }

    // Single-base substitution.
    if reference_length == 1 && sample_length == 1 {
        let edit = RawEdit::new(
            EditKind::Substitution,
            reference_start,
            reference_end,
            sample_start,
            sample_end,
        );
        return (vec![edit], weight_position + WEIGHT_SUBSTITUTION + 2 * WEIGHT_BASE);
    }

    let weight_trivial = trivial_weight(context, reference_length, sample_length);

    // 2 vs 1, 1 vs 2 and 2 vs 2 regions are always one deletion-insertion.
    if reference_length < 3 && sample_length < 3 {
        let edit = RawEdit::new(
            EditKind::Substitution,
            reference_start,
            reference_end,
            sample_start,
            sample_end,
        );
        return (vec![edit], weight_trivial);
    }

    let substrings = lcs(
        context.reference,
        context.complement_slice(),
        reference_start,
        reference_end,
        context.sample,
        sample_start,
        sample_end,
        context.config.max_dp_area,
    );
    let best = match best_fit(&substrings, reference_start, sample_start) {
        Some(best) => best,
        None => {
            return fallback(
                context,
                reference_start,
                reference_end,
                sample_start,
                sample_end,
                weight_trivial,
            );
        }
    };
    trace!(
        "extract_region [{}, {}) x [{}, {}): lcs length {} rc {}",
        reference_start,
        reference_end,
        sample_start,
        sample_end,
        best.length,
        best.reverse_complement
    );

    let center_weight = if best.reverse_complement {
        2 * weight_position + WEIGHT_SEPARATOR + WEIGHT_INVERSION
    } else {
        0
    };

    let (prefix_edits, prefix_weight) = extract_region(
        context,
        reference_start,
        best.reference_index,
        sample_start,
        best.sample_index,
    );
    if prefix_weight + center_weight > weight_trivial {
        return fallback(
            context,
            reference_start,
            reference_end,
            sample_start,
            sample_end,
            weight_trivial,
        );
    }
    let (suffix_edits, suffix_weight) = extract_region(
        context,
        best.reference_index + best.length,
        reference_end,
        best.sample_index + best.length,
        sample_end,
    );
    let total = prefix_weight + center_weight + suffix_weight;
    if total > weight_trivial {
        return fallback(
            context,
            reference_start,
            reference_end,
            sample_start,
            sample_end,
            weight_trivial,
        );
    }

    let center_kind = if best.reverse_complement {
        EditKind::ReverseComplement
    } else {
        EditKind::Identity
    };
    let mut edits = prefix_edits;
    edits.push(RawEdit::new(
        center_kind,
        best.reference_index,
        best.reference_index + best.length,
        best.sample_index,
        best.sample_index + best.length,
    ));
    edits.extend(suffix_edits);
    (edits, total)
}

/// Weight of describing the region as a single deletion-insertion.
fn trivial_weight(context: &Context<'_>, reference_length: usize, sample_length: usize) -> usize {
    let mut weight =
        context.weight_position + WEIGHT_DELETION_INSERTION + WEIGHT_BASE * sample_length;
    if reference_length > 1 {
        weight += context.weight_position + WEIGHT_SEPARATOR;
    }
    weight
}

/// Describe the region as one deletion-insertion, or as a transposition
/// when that is cheaper.
fn fallback(
    context: &Context<'_>,
    reference_start: usize,
    reference_end: usize,
    sample_start: usize,
    sample_end: usize,
    weight_trivial: usize,
) -> (Vec<RawEdit>, usize) {
    if let Some((edits, weight)) = try_transposition(
        context,
        reference_start,
        reference_end,
        sample_start,
        sample_end,
    ) {
        if weight < weight_trivial {
            return (edits, weight);
        }
    }
    let edit = RawEdit::new(
        EditKind::Substitution,
        reference_start,
        reference_end,
        sample_start,
        sample_end,
    );
    (vec![edit], weight_trivial)
}

/// Among the longest common substrings, prefer the one whose reference
/// and sample offsets within the region are closest; this keeps the
/// decomposition balanced.
fn best_fit(substrings: &[Substring], reference_start: usize, sample_start: usize) -> Option<Substring> {
    substrings
        .iter()
        .min_by_key(|entry| {
            let reference_offset = (entry.reference_index - reference_start) as isize;
            let sample_offset = (entry.sample_index - sample_start) as isize;
            (reference_offset - sample_offset).abs()
        })
        .copied()
}

/// Try to describe `sample[sample_start..sample_end]` as material copied
/// from elsewhere in the reference.
///
/// Returns the fragment edits (marked as one transposition run, with the
/// enclosing reference span on every fragment) and the total weight
/// including the enclosing insertion or deletion-insertion.
fn try_transposition(
    context: &Context<'_>,
    reference_start: usize,
    reference_end: usize,
    sample_start: usize,
    sample_end: usize,
) -> Option<(Vec<RawEdit>, usize)> {
    if !context.transpositions_enabled() {
        return None;
    }
    let sample_length = sample_end - sample_start;
    // A copied stretch costs two positions and a separator; shorter
    // inserts can never profit from one.
    if sample_length <= 2 * context.weight_position + WEIGHT_SEPARATOR {
        return None;
    }

    let mut fragments = Vec::new();
    let content_weight = transpose_fragments(context, sample_start, sample_end, &mut fragments);

    // A single literal fragment is just the plain insertion again.
    if fragments.len() <= 1 && fragments.iter().all(|f| f.flags.kind == EditKind::Substitution)
    {
        return None;
    }

    let reference_length = reference_end - reference_start;
    let wrapper_weight = if reference_length == 0 {
        2 * context.weight_position + WEIGHT_SEPARATOR + WEIGHT_INSERTION
    } else {
        let mut weight = context.weight_position + WEIGHT_DELETION_INSERTION;
        if reference_length > 1 {
            weight += context.weight_position + WEIGHT_SEPARATOR;
        }
        weight
    };

    for fragment in &mut fragments {
        fragment.reference_start = reference_start;
        fragment.reference_end = reference_end;
    }
    if let Some(first) = fragments.first_mut() {
        first.flags.transposition_open = true;
    }
    if let Some(last) = fragments.last_mut() {
        last.flags.transposition_close = true;
    }
    trace!(
        "transposition over [{}, {}): {} fragments, weight {}",
        sample_start,
        sample_end,
        fragments.len(),
        wrapper_weight + content_weight
    );
    Some((fragments, wrapper_weight + content_weight))
}

/// Recursively cut inserted material into reference copies and literal
/// gaps, appending fragment edits in sample order. Returns the content
/// weight.
fn transpose_fragments(
    context: &Context<'_>,
    sample_start: usize,
    sample_end: usize,
    fragments: &mut Vec<RawEdit>,
) -> usize {
    if sample_start >= sample_end {
        return 0;
    }
    let literal_weight = WEIGHT_BASE * (sample_end - sample_start);

    let substrings = lcs(
        context.reference,
        context.complement_slice(),
        0,
        context.reference.len(),
        context.sample,
        sample_start,
        sample_end,
        context.config.max_dp_area,
    );
    let best = match substrings.first() {
        Some(best) => *best,
        None => {
            fragments.push(RawEdit::new(
                EditKind::Substitution,
                0,
                0,
                sample_start,
                sample_end,
            ));
            return literal_weight;
        }
    };

    let mut range_weight = 2 * context.weight_position + WEIGHT_SEPARATOR;
    if best.reverse_complement {
        range_weight += WEIGHT_INVERSION;
    }
    // Spelling the matched stretch out is no heavier than referring to
    // it; stop splitting.
    if WEIGHT_BASE * best.length <= range_weight {
        fragments.push(RawEdit::new(
            EditKind::Substitution,
            0,
            0,
            sample_start,
            sample_end,
        ));
        return literal_weight;
    }

    let mut weight = transpose_fragments(context, sample_start, best.sample_index, fragments);
    let kind = if best.reverse_complement {
        EditKind::ReverseComplement
    } else {
        EditKind::Identity
    };
    let mut fragment = RawEdit::new(
        kind,
        0,
        0,
        best.sample_index,
        best.sample_index + best.length,
    );
    fragment.transposition_start = best.reference_index;
    fragment.transposition_end = best.reference_index + best.length;
    fragments.push(fragment);
    weight += range_weight;
    weight += transpose_fragments(
        context,
        best.sample_index + best.length,
        sample_end,
        fragments,
    );
    weight
}

/// Check that the edits tile both sequences: reference and sample spans
/// abut outside transposition runs; inside a run the sample spans tile
/// the inserted material and the shared reference span is counted once.
fn verify_tiling(edits: &[RawEdit], reference_length: usize, sample_length: usize) -> Result<()> {
    let mut reference_pos = 0usize;
    let mut sample_pos = 0usize;
    let mut index = 0usize;

    while index < edits.len() {
        let edit = &edits[index];
        if edit.flags.transposition_open {
            let (run_ref_start, run_ref_end) = (edit.reference_start, edit.reference_end);
            if run_ref_start != reference_pos {
                return Err(tiling_error(index, reference_pos, run_ref_start));
            }
            loop {
                let fragment = edits.get(index).ok_or_else(|| {
                    ExtractorError::TilingInconsistency {
                        msg: "transposition run is not closed".to_string(),
                    }
                })?;
                if fragment.sample_start != sample_pos {
                    return Err(tiling_error(index, sample_pos, fragment.sample_start));
                }
                sample_pos = fragment.sample_end;
                if fragment.flags.transposition_close {
                    break;
                }
                index += 1;
            }
            reference_pos = run_ref_end;
            index += 1;
        } else {
            if edit.reference_start != reference_pos {
                return Err(tiling_error(index, reference_pos, edit.reference_start));
            }
            if edit.sample_start != sample_pos {
                return Err(tiling_error(index, sample_pos, edit.sample_start));
            }
            reference_pos = edit.reference_end;
            sample_pos = edit.sample_end;
            index += 1;
        }
    }

    if reference_pos != reference_length || sample_pos != sample_length {
        return Err(ExtractorError::TilingInconsistency {
            msg: format!(
                "edits end at {}/{} but sequences have lengths {}/{}",
                reference_pos, sample_pos, reference_length, sample_length
            ),
        });
    }
    Ok(())
}

fn tiling_error(index: usize, expected: usize, found: usize) -> ExtractorError {
    ExtractorError::TilingInconsistency {
        msg: format!(
            "edit {} starts at {} but the previous edit ended at {}",
            index, found, expected
        ),
    }
}

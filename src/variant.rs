//! Variant model: typed variants, alleles, weights and serialization.
//!
//! A [`Variant`] is one described difference between the reference and the
//! observed sequence. An [`Allele`] is the ordered list of variants that
//! together describe the whole comparison.
//!
//! Two textual forms are produced: the literal form spells out inserted
//! and deleted bases ([`std::fmt::Display`]), the positional form refers
//! to transposed material by reference coordinates
//! ([`Allele::positional_string`]). The structured-record form
//! ([`Allele::to_records`]) is a serde tree of `deletion_insertion`,
//! `inversion`, `equal` and `unknown` records tiling the reference.
//!
//! # Coordinate System
//!
//! | Field | Basis | Notes |
//! |-------|-------|-------|
//! | `start`, `end` | 1-based inclusive | HGVS-facing positions |
//! | `reference_span`, `sample_span` | 0-based half-open | Consumed spans, used for tiling |
//! | record locations | 0-based half-open | Interbase, as serialized |
//!
//! For an insertion `start` and `end` are the two flanking bases; the
//! consumed `reference_span` is empty. For a duplication `start` and `end`
//! cover the original copy in the reference while `sample_span` covers the
//! extra copy in the observed sequence.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractorError, Result};

// Descriptive weights. The extractor minimizes the total weight of the
// description, so these constants define which of two competing
// descriptions is "simpler". A position contributes `weight_position`
// (the number of digits needed for a position in this reference) per
// coordinate.
pub const WEIGHT_BASE: usize = 1;
pub const WEIGHT_DELETION: usize = 3;
pub const WEIGHT_DELETION_INSERTION: usize = 6;
pub const WEIGHT_INSERTION: usize = 3;
pub const WEIGHT_INVERSION: usize = 3;
pub const WEIGHT_SEPARATOR: usize = 1;
pub const WEIGHT_SUBSTITUTION: usize = 1;

/// The kind of a described variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantType {
    Equal,
    Substitution,
    Deletion,
    Insertion,
    Duplication,
    Inversion,
    DeletionInsertion,
    Repeat,
    Unknown,
}

/// One element of inserted material.
///
/// Literal elements spell out bases from the observed sequence; range
/// elements refer to a stretch of the reference (possibly inverted), as
/// produced by transposition detection. Range elements carry the
/// materialized sequence as it appears in the observed string so the
/// literal serialization never needs the reference again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertedSeq {
    Literal {
        sequence: String,
    },
    Range {
        /// 1-based inclusive start in the reference.
        start: usize,
        /// 1-based inclusive end in the reference.
        end: usize,
        reverse: bool,
        sequence: String,
    },
}

impl InsertedSeq {
    /// Weight of this element in the positional form.
    pub fn weight(&self, weight_position: usize) -> usize {
        match self {
            InsertedSeq::Literal { sequence } => WEIGHT_BASE * sequence.len(),
            InsertedSeq::Range { reverse, .. } => {
                let mut weight = 2 * weight_position + WEIGHT_SEPARATOR;
                if *reverse {
                    weight += WEIGHT_INVERSION;
                }
                weight
            }
        }
    }

    fn literal_form(&self) -> &str {
        match self {
            InsertedSeq::Literal { sequence } | InsertedSeq::Range { sequence, .. } => sequence,
        }
    }

    fn positional_form(&self) -> String {
        match self {
            InsertedSeq::Literal { sequence } => sequence.clone(),
            InsertedSeq::Range {
                start,
                end,
                reverse,
                ..
            } => {
                if *reverse {
                    format!("{}_{}inv", start, end)
                } else {
                    format!("{}_{}", start, end)
                }
            }
        }
    }
}

/// Total weight of an inserted list, counting the bracket separators when
/// more than one element is present.
pub fn inserted_weight(inserted: &[InsertedSeq], weight_position: usize) -> usize {
    let mut weight: usize = inserted
        .iter()
        .map(|seq| seq.weight(weight_position))
        .sum();
    if inserted.len() > 1 {
        weight += (inserted.len() + 1) * WEIGHT_SEPARATOR;
    }
    weight
}

/// One described difference between reference and observed sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub variant_type: VariantType,
    /// 1-based inclusive start in the reference.
    pub start: usize,
    /// 1-based inclusive end in the reference.
    pub end: usize,
    /// Deleted reference bases, for the literal form.
    pub deleted: String,
    pub inserted: Vec<InsertedSeq>,
    /// Positional freedom of the variant after 3' rolling.
    pub shift: usize,
    /// Number of repeat-unit copies in the observed sequence; only set for
    /// [`VariantType::Repeat`].
    pub count: usize,
    /// Set on a trailing deletion-insertion that is explainable as a frame
    /// shift (protein descriptions only).
    pub frame_shift: bool,
    /// Digits needed for a position in this reference; fixes the weight.
    pub weight_position: usize,
    /// Reference span consumed by this variant, 0-based half-open.
    pub reference_span: (usize, usize),
    /// Observed-sequence span consumed by this variant, 0-based half-open.
    pub sample_span: (usize, usize),
}

impl Variant {
    /// A variant skeleton with empty spans; callers fill in the fields
    /// relevant to the type.
    pub fn new(variant_type: VariantType, weight_position: usize) -> Self {
        Variant {
            variant_type,
            start: 0,
            end: 0,
            deleted: String::new(),
            inserted: Vec::new(),
            shift: 0,
            count: 0,
            frame_shift: false,
            weight_position,
            reference_span: (0, 0),
            sample_span: (0, 0),
        }
    }

    /// The single unknown variant, for `?` input sequences.
    pub fn unknown() -> Self {
        Variant::new(VariantType::Unknown, 0)
    }

    /// An equal variant spanning both sequences, for identical inputs.
    pub fn equal(reference_length: usize, observed_length: usize) -> Self {
        let mut variant = Variant::new(VariantType::Equal, 0);
        variant.start = 1;
        variant.end = reference_length;
        variant.reference_span = (0, reference_length);
        variant.sample_span = (0, observed_length);
        variant
    }

    /// Weight of this variant in the positional form.
    pub fn weight(&self) -> usize {
        match self.variant_type {
            VariantType::Equal | VariantType::Unknown => 0,
            VariantType::Repeat => {
                self.weight_position
                    + WEIGHT_SEPARATOR
                    + inserted_weight(&self.inserted, self.weight_position)
            }
            _ => {
                let mut weight = self.weight_position;
                if self.start != self.end {
                    weight += self.weight_position + WEIGHT_SEPARATOR;
                }
                weight += match self.variant_type {
                    VariantType::Substitution => WEIGHT_SUBSTITUTION + 2 * WEIGHT_BASE,
                    VariantType::Deletion => WEIGHT_DELETION,
                    VariantType::Insertion | VariantType::Duplication => {
                        WEIGHT_INSERTION + inserted_weight(&self.inserted, self.weight_position)
                    }
                    VariantType::Inversion => WEIGHT_INVERSION,
                    VariantType::DeletionInsertion => {
                        WEIGHT_DELETION_INSERTION
                            + inserted_weight(&self.inserted, self.weight_position)
                    }
                    _ => 0,
                };
                weight
            }
        }
    }

    /// Shift all positions by the given 0-based offsets. Used when a
    /// variant was described against a slice of the full sequences.
    pub fn offset(&mut self, reference_offset: usize, observed_offset: usize) {
        if matches!(self.variant_type, VariantType::Unknown) {
            return;
        }
        self.start += reference_offset;
        self.end += reference_offset;
        self.reference_span.0 += reference_offset;
        self.reference_span.1 += reference_offset;
        self.sample_span.0 += observed_offset;
        self.sample_span.1 += observed_offset;
        for seq in &mut self.inserted {
            if let InsertedSeq::Range { start, end, .. } = seq {
                *start += reference_offset;
                *end += reference_offset;
            }
        }
    }

    fn position_string(&self) -> String {
        if self.start == self.end {
            self.start.to_string()
        } else {
            format!("{}_{}", self.start, self.end)
        }
    }

    fn format(&self, f: &mut fmt::Formatter<'_>, positional: bool) -> fmt::Result {
        let render = |inserted: &[InsertedSeq]| -> String {
            let parts: Vec<String> = inserted
                .iter()
                .map(|seq| {
                    if positional {
                        seq.positional_form()
                    } else {
                        seq.literal_form().to_string()
                    }
                })
                .collect();
            if parts.len() > 1 {
                format!("[{}]", parts.join(";"))
            } else {
                parts.concat()
            }
        };

        match self.variant_type {
            VariantType::Unknown => write!(f, "?"),
            VariantType::Equal => write!(f, "="),
            VariantType::Repeat => write!(
                f,
                "{}{}[{}]",
                self.position_string(),
                render(&self.inserted),
                self.count
            ),
            VariantType::Substitution => write!(
                f,
                "{}{}>{}",
                self.position_string(),
                self.deleted,
                render(&self.inserted)
            ),
            VariantType::Deletion => write!(f, "{}del", self.position_string()),
            VariantType::Insertion => {
                write!(f, "{}ins{}", self.position_string(), render(&self.inserted))
            }
            VariantType::Duplication => write!(f, "{}dup", self.position_string()),
            VariantType::Inversion => write!(f, "{}inv", self.position_string()),
            VariantType::DeletionInsertion => write!(
                f,
                "{}delins{}",
                self.position_string(),
                render(&self.inserted)
            ),
        }
    }

    /// The positional form, with transposed material as reference ranges.
    pub fn positional_string(&self) -> String {
        struct Positional<'a>(&'a Variant);
        impl fmt::Display for Positional<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.format(f, true)
            }
        }
        Positional(self).to_string()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.format(f, false)
    }
}

/// An ordered list of variants describing one comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allele {
    pub variants: Vec<Variant>,
}

impl Allele {
    pub fn new(variants: Vec<Variant>) -> Self {
        Allele { variants }
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variant> {
        self.variants.iter()
    }

    pub fn push(&mut self, variant: Variant) {
        self.variants.push(variant);
    }

    /// Total weight; an allele of more than one variant pays for the
    /// separators between them plus the enclosing brackets.
    pub fn weight(&self) -> usize {
        let sum: usize = self.variants.iter().map(Variant::weight).sum();
        if self.variants.len() > 1 {
            sum + (self.variants.len() + 1) * WEIGHT_SEPARATOR
        } else {
            sum
        }
    }

    fn render(&self, positional: bool) -> String {
        match self.variants.len() {
            0 => "=".to_string(),
            1 => {
                if positional {
                    self.variants[0].positional_string()
                } else {
                    self.variants[0].to_string()
                }
            }
            _ => {
                let parts: Vec<String> = self
                    .variants
                    .iter()
                    .map(|variant| {
                        if positional {
                            variant.positional_string()
                        } else {
                            variant.to_string()
                        }
                    })
                    .collect();
                format!("[{}]", parts.join(";"))
            }
        }
    }

    /// The positional form of the whole allele.
    pub fn positional_string(&self) -> String {
        self.render(true)
    }

    /// Convert to structured records tiling `[0, reference_length)`.
    ///
    /// Equal stretches between variants are reconstructed from the
    /// consumed spans, so the records always cover the whole reference.
    /// An unknown variant collapses the result to a single `unknown`
    /// record.
    pub fn to_records(&self, reference_length: usize) -> Result<Vec<VariantRecord>> {
        let mut records = Vec::new();
        let mut reference_pos = 0usize;

        for variant in &self.variants {
            if variant.variant_type == VariantType::Unknown {
                return Ok(vec![VariantRecord {
                    kind: "unknown".to_string(),
                    location: LocationRecord::range(0, reference_length),
                    insertions: Vec::new(),
                }]);
            }
            let (reference_start, reference_end) = variant.reference_span;
            if reference_start < reference_pos {
                return Err(ExtractorError::TilingInconsistency {
                    msg: format!(
                        "variant at {} overlaps previous record ending at {}",
                        reference_start, reference_pos
                    ),
                });
            }
            if reference_start > reference_pos {
                records.push(VariantRecord::equal(reference_pos, reference_start));
            }

            match variant.variant_type {
                VariantType::Equal => {
                    records.push(VariantRecord::equal(reference_start, reference_end));
                }
                VariantType::Inversion => {
                    records.push(VariantRecord {
                        kind: "inversion".to_string(),
                        location: LocationRecord::range(reference_start, reference_end),
                        insertions: Vec::new(),
                    });
                }
                _ => {
                    records.push(VariantRecord {
                        kind: "deletion_insertion".to_string(),
                        location: LocationRecord::range(reference_start, reference_end),
                        insertions: insertion_records(variant),
                    });
                }
            }
            reference_pos = reference_end;
        }

        if reference_pos > reference_length {
            return Err(ExtractorError::TilingInconsistency {
                msg: format!(
                    "records end at {} beyond reference length {}",
                    reference_pos, reference_length
                ),
            });
        }
        if reference_pos < reference_length {
            records.push(VariantRecord::equal(reference_pos, reference_length));
        }
        Ok(records)
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(false))
    }
}

impl IntoIterator for Allele {
    type Item = Variant;
    type IntoIter = std::vec::IntoIter<Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.variants.into_iter()
    }
}

fn insertion_records(variant: &Variant) -> Vec<InsertionRecord> {
    if variant.inserted.is_empty() {
        return Vec::new();
    }
    // The common case refers back to the observed sequence by span.
    if variant.inserted.len() == 1 {
        if let InsertedSeq::Literal { .. } = variant.inserted[0] {
            return vec![InsertionRecord {
                source: "observed".to_string(),
                location: Some(LocationRecord::range(
                    variant.sample_span.0,
                    variant.sample_span.1,
                )),
                sequence: None,
                inverted: false,
            }];
        }
    }
    variant
        .inserted
        .iter()
        .map(|seq| match seq {
            InsertedSeq::Literal { sequence } => InsertionRecord {
                source: "observed".to_string(),
                location: None,
                sequence: Some(sequence.clone()),
                inverted: false,
            },
            InsertedSeq::Range {
                start,
                end,
                reverse,
                ..
            } => InsertionRecord {
                source: "reference".to_string(),
                location: Some(LocationRecord::range(start - 1, *end)),
                sequence: None,
                inverted: *reverse,
            },
        })
        .collect()
}

/// A point in a structured record, 0-based interbase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRecord {
    pub position: usize,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A half-open range in a structured record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub start: PointRecord,
    pub end: PointRecord,
}

impl LocationRecord {
    pub fn range(start: usize, end: usize) -> Self {
        LocationRecord {
            kind: "range".to_string(),
            start: PointRecord {
                position: start,
                kind: "point".to_string(),
            },
            end: PointRecord {
                position: end,
                kind: "point".to_string(),
            },
        }
    }
}

/// Inserted material in a structured record; either a span into one of
/// the two sequences or a literal sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionRecord {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<LocationRecord>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sequence: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub inverted: bool,
}

/// One structured record; the records for an allele tile the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub location: LocationRecord,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub insertions: Vec<InsertionRecord>,
}

impl VariantRecord {
    pub fn equal(start: usize, end: usize) -> Self {
        VariantRecord {
            kind: "equal".to_string(),
            location: LocationRecord::range(start, end),
            insertions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn substitution(weight_position: usize) -> Variant {
        let mut variant = Variant::new(VariantType::Substitution, weight_position);
        variant.start = 7;
        variant.end = 7;
        variant.deleted = "A".to_string();
        variant.inserted = vec![InsertedSeq::Literal {
            sequence: "G".to_string(),
        }];
        variant.reference_span = (6, 7);
        variant.sample_span = (6, 7);
        variant
    }

    #[test]
    fn test_display_substitution() {
        assert_eq!(substitution(1).to_string(), "7A>G");
    }

    #[test]
    fn test_display_deletion_and_range() {
        let mut variant = Variant::new(VariantType::Deletion, 2);
        variant.start = 3;
        variant.end = 8;
        assert_eq!(variant.to_string(), "3_8del");
        variant.end = 3;
        assert_eq!(variant.to_string(), "3del");
    }

    #[test]
    fn test_display_insertion_and_dup() {
        let mut variant = Variant::new(VariantType::Insertion, 1);
        variant.start = 7;
        variant.end = 8;
        variant.inserted = vec![InsertedSeq::Literal {
            sequence: "C".to_string(),
        }];
        assert_eq!(variant.to_string(), "7_8insC");

        let mut dup = Variant::new(VariantType::Duplication, 1);
        dup.start = 7;
        dup.end = 7;
        assert_eq!(dup.to_string(), "7dup");
    }

    #[test]
    fn test_display_compound_insertion() {
        let mut variant = Variant::new(VariantType::Insertion, 2);
        variant.start = 10;
        variant.end = 11;
        variant.inserted = vec![
            InsertedSeq::Range {
                start: 20,
                end: 34,
                reverse: false,
                sequence: "A".repeat(15),
            },
            InsertedSeq::Literal {
                sequence: "CC".to_string(),
            },
            InsertedSeq::Range {
                start: 40,
                end: 50,
                reverse: true,
                sequence: "T".repeat(11),
            },
        ];
        assert_eq!(
            variant.positional_string(),
            "10_11ins[20_34;CC;40_50inv]"
        );
        assert_eq!(
            variant.to_string(),
            format!("10_11ins[{};CC;{}]", "A".repeat(15), "T".repeat(11))
        );
    }

    #[test]
    fn test_display_repeat() {
        let mut variant = Variant::new(VariantType::Repeat, 2);
        variant.start = 5;
        variant.end = 12;
        variant.count = 7;
        variant.inserted = vec![InsertedSeq::Literal {
            sequence: "TC".to_string(),
        }];
        assert_eq!(variant.to_string(), "5_12TC[7]");
    }

    #[test]
    fn test_allele_display() {
        let mut allele = Allele::default();
        assert_eq!(allele.to_string(), "=");
        allele.push(substitution(1));
        assert_eq!(allele.to_string(), "7A>G");
        allele.push(Variant::unknown());
        assert_eq!(allele.to_string(), "[7A>G;?]");
    }

    #[test]
    fn test_weights() {
        // Substitution: position + substitution + two bases.
        assert_eq!(
            substitution(2).weight(),
            2 + WEIGHT_SUBSTITUTION + 2 * WEIGHT_BASE
        );

        // Ranged deletion: two positions + separator + deletion.
        let mut deletion = Variant::new(VariantType::Deletion, 2);
        deletion.start = 3;
        deletion.end = 8;
        assert_eq!(deletion.weight(), 2 * 2 + WEIGHT_SEPARATOR + WEIGHT_DELETION);

        // Insertion with two bases: two flank positions + separator +
        // insertion + bases.
        let mut insertion = Variant::new(VariantType::Insertion, 2);
        insertion.start = 7;
        insertion.end = 8;
        insertion.inserted = vec![InsertedSeq::Literal {
            sequence: "AC".to_string(),
        }];
        assert_eq!(
            insertion.weight(),
            2 * 2 + WEIGHT_SEPARATOR + WEIGHT_INSERTION + 2 * WEIGHT_BASE
        );
    }

    #[test]
    fn test_allele_weight_counts_brackets() {
        let single = Allele::new(vec![substitution(2)]);
        assert_eq!(single.weight(), substitution(2).weight());

        // Two variants: two separators for the brackets plus one between.
        let double = Allele::new(vec![substitution(2), substitution(2)]);
        assert_eq!(
            double.weight(),
            2 * substitution(2).weight() + 3 * WEIGHT_SEPARATOR
        );
    }

    #[test]
    fn test_inserted_weight_brackets() {
        let list = vec![
            InsertedSeq::Literal {
                sequence: "AC".to_string(),
            },
            InsertedSeq::Range {
                start: 1,
                end: 9,
                reverse: true,
                sequence: "G".repeat(9),
            },
        ];
        // Two bases + (two positions + separator + inversion) + three
        // bracket separators.
        assert_eq!(
            inserted_weight(&list, 2),
            2 * WEIGHT_BASE + (2 * 2 + WEIGHT_SEPARATOR + WEIGHT_INVERSION) + 3 * WEIGHT_SEPARATOR
        );
    }

    #[test]
    fn test_records_reconstruct_equal_gaps() {
        let allele = Allele::new(vec![substitution(2)]);
        let records = allele.to_records(44).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], VariantRecord::equal(0, 6));
        assert_eq!(records[1].kind, "deletion_insertion");
        assert_eq!(records[1].location, LocationRecord::range(6, 7));
        assert_eq!(records[1].insertions.len(), 1);
        assert_eq!(records[1].insertions[0].source, "observed");
        assert_eq!(
            records[1].insertions[0].location,
            Some(LocationRecord::range(6, 7))
        );
        assert_eq!(records[2], VariantRecord::equal(7, 44));
    }

    #[test]
    fn test_records_unknown_collapses() {
        let allele = Allele::new(vec![Variant::unknown()]);
        let records = allele.to_records(44).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "unknown");
        assert_eq!(records[0].location, LocationRecord::range(0, 44));
    }

    #[test]
    fn test_records_overlap_is_rejected() {
        let mut first = substitution(2);
        first.reference_span = (6, 10);
        let second = substitution(2);
        let allele = Allele::new(vec![first, second]);
        assert!(allele.to_records(44).is_err());
    }

    #[test]
    fn test_record_serialization_shape() {
        let records = Allele::new(vec![substitution(2)]).to_records(44).unwrap();
        let json = serde_json::to_value(&records).unwrap();
        assert_eq!(json[0]["type"], "equal");
        assert_eq!(json[0]["location"]["type"], "range");
        assert_eq!(json[0]["location"]["start"]["position"], 0);
        assert_eq!(json[0]["location"]["start"]["type"], "point");
        assert_eq!(json[1]["insertions"][0]["source"], "observed");
        // Absent fields are omitted entirely.
        assert!(json[0].get("insertions").is_none());
        assert!(json[1]["insertions"][0].get("sequence").is_none());
    }

    #[test]
    fn test_record_roundtrip() {
        let records = Allele::new(vec![substitution(2)]).to_records(44).unwrap();
        let json = serde_json::to_string(&records).unwrap();
        let back: Vec<VariantRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn test_offset() {
        let mut variant = substitution(2);
        variant.offset(10, 12);
        assert_eq!(variant.start, 17);
        assert_eq!(variant.end, 17);
        assert_eq!(variant.reference_span, (16, 17));
        assert_eq!(variant.sample_span, (18, 19));
    }
}

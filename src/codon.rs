//! Codon tables and frame-shift compatibility tables.
//!
//! A codon table is supplied as a 64-character string indexed by the
//! lexicographic order of codons (AAA, AAC, AAG, AAT, ACA, ... TTT over
//! A < C < G < T), mapping each codon to a single-letter amino acid or
//! the stop symbol `*`.
//!
//! From the codon table five frame-shift compatibility tables are derived:
//! for two amino acids `a` and `b`, the table for shift `+1` holds iff
//! some codon pair whose first codon translates to `a` yields `b` when the
//! reading frame is advanced by one nucleotide, and analogously for `+2`
//! and for the three reverse-complement frames. The protein description
//! path uses these tables to annotate changed regions that are explainable
//! as frame shifts.

use crate::error::{ExtractorError, Result};

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Frame-shift kind detected between a reference and an observed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameShiftKind {
    /// Reading frame advanced by one nucleotide.
    Plus1,
    /// Reading frame advanced by two nucleotides.
    Plus2,
    /// Reverse-complement strand, same frame.
    Inverse,
    /// Reverse-complement strand, frame advanced by one.
    Plus1Inverse,
    /// Reverse-complement strand, frame advanced by two.
    Plus2Inverse,
}

impl FrameShiftKind {
    /// All kinds, in the order they are tested.
    pub const ALL: [FrameShiftKind; 5] = [
        FrameShiftKind::Plus1,
        FrameShiftKind::Plus2,
        FrameShiftKind::Inverse,
        FrameShiftKind::Plus1Inverse,
        FrameShiftKind::Plus2Inverse,
    ];

    fn index(self) -> usize {
        match self {
            FrameShiftKind::Plus1 => 0,
            FrameShiftKind::Plus2 => 1,
            FrameShiftKind::Inverse => 2,
            FrameShiftKind::Plus1Inverse => 3,
            FrameShiftKind::Plus2Inverse => 4,
        }
    }
}

/// Amino-acid compatibility table for one frame-shift kind, indexed by
/// ASCII byte pairs.
type FsTable = [[bool; 128]; 128];

/// A codon translation table plus derived frame-shift tables.
///
/// Immutable after construction and safely shareable across concurrent
/// comparisons.
pub struct CodonTable {
    amino_acids: [u8; 64],
    fs_tables: Box<[FsTable; 5]>,
}

impl CodonTable {
    /// Build a codon table from a 64-character amino acid string in
    /// lexicographic codon order.
    pub fn new(amino_acids: &str) -> Result<Self> {
        let bytes = amino_acids.as_bytes();
        if bytes.len() != 64 || !bytes.iter().all(|b| b.is_ascii()) {
            return Err(ExtractorError::InvalidCodonTable {
                length: bytes.len(),
            });
        }
        let mut table = [0u8; 64];
        table.copy_from_slice(bytes);
        let fs_tables = build_fs_tables(&table);
        Ok(CodonTable {
            amino_acids: table,
            fs_tables,
        })
    }

    /// The standard genetic code.
    pub fn standard() -> Self {
        // Safe by construction: the string is 64 ASCII characters.
        CodonTable::new("KNKNTTTTRSRSIIMIQHQHPPPPRRRRLLLLEDEDAAAAGGGGVVVV*Y*YSSSS*CWCLFLF")
            .expect("standard codon table is well-formed")
    }

    /// Translate one codon index (0..64) to its amino acid.
    fn amino_acid(&self, codon: usize) -> u8 {
        self.amino_acids[codon]
    }

    /// Translate a DNA/RNA sequence into a protein string.
    ///
    /// 'U' is treated as 'T'. The sequence length must be a multiple of
    /// three; stop codons translate to `*` and are kept in the output.
    pub fn translate(&self, dna: &str) -> Result<String> {
        let bytes = dna.as_bytes();
        if bytes.len() % 3 != 0 {
            return Err(ExtractorError::Translation {
                msg: format!("length {} is not a multiple of 3", bytes.len()),
            });
        }
        let mut protein = String::with_capacity(bytes.len() / 3);
        for chunk in bytes.chunks_exact(3) {
            let index = codon_index(chunk).ok_or_else(|| ExtractorError::Translation {
                msg: format!(
                    "unrecognized codon '{}'",
                    String::from_utf8_lossy(chunk)
                ),
            })?;
            protein.push(self.amino_acid(index) as char);
        }
        Ok(protein)
    }

    /// Whether amino acid `observed` can arise from `reference` under the
    /// given frame-shift kind.
    pub fn is_frame_shift_pair(
        &self,
        kind: FrameShiftKind,
        reference: u8,
        observed: u8,
    ) -> bool {
        self.fs_tables[kind.index()][reference as usize & 0x7f][observed as usize & 0x7f]
    }

    /// Frame-shift kinds under which every aligned position of `observed`
    /// can arise from `reference`. Tested over the overlap of the two
    /// regions; empty regions match no kind.
    pub fn frame_shift_kinds(&self, reference: &str, observed: &str) -> Vec<FrameShiftKind> {
        let overlap = reference.len().min(observed.len());
        if overlap == 0 {
            return Vec::new();
        }
        let reference = reference.as_bytes();
        let observed = observed.as_bytes();
        FrameShiftKind::ALL
            .into_iter()
            .filter(|&kind| {
                (0..overlap).all(|i| self.is_frame_shift_pair(kind, reference[i], observed[i]))
            })
            .collect()
    }
}

impl std::fmt::Debug for CodonTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodonTable")
            .field("amino_acids", &String::from_utf8_lossy(&self.amino_acids))
            .finish()
    }
}

/// Index of a codon in lexicographic order, or None for bases outside
/// A/C/G/T/U.
fn codon_index(codon: &[u8]) -> Option<usize> {
    let mut index = 0usize;
    for &base in codon {
        let digit = match base.to_ascii_uppercase() {
            b'A' => 0,
            b'C' => 1,
            b'G' => 2,
            b'T' | b'U' => 3,
            _ => return None,
        };
        index = index * 4 + digit;
    }
    Some(index)
}

fn codon_bases(index: usize) -> [u8; 3] {
    [
        BASES[(index >> 4) & 3],
        BASES[(index >> 2) & 3],
        BASES[index & 3],
    ]
}

fn complement_base(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        _ => base,
    }
}

fn reverse_complement_codon(codon: [u8; 3]) -> [u8; 3] {
    [
        complement_base(codon[2]),
        complement_base(codon[1]),
        complement_base(codon[0]),
    ]
}

/// Enumerate all codon pairs and record, per frame-shift kind, which
/// amino acid pairs are reachable.
fn build_fs_tables(amino_acids: &[u8; 64]) -> Box<[FsTable; 5]> {
    let mut tables: Box<[FsTable; 5]> = vec![[[false; 128]; 128]; 5]
        .into_boxed_slice()
        .try_into()
        .expect("five tables");

    for p in 0..64usize {
        let from = amino_acids[p] as usize & 0x7f;
        let pb = codon_bases(p);
        for q in 0..64usize {
            let qb = codon_bases(q);

            let shifted1 = [pb[1], pb[2], qb[0]];
            let shifted2 = [pb[2], qb[0], qb[1]];
            let entries = [
                (FrameShiftKind::Plus1, shifted1),
                (FrameShiftKind::Plus2, shifted2),
                (FrameShiftKind::Inverse, reverse_complement_codon(pb)),
                (FrameShiftKind::Plus1Inverse, reverse_complement_codon(shifted1)),
                (FrameShiftKind::Plus2Inverse, reverse_complement_codon(shifted2)),
            ];
            for (kind, codon) in entries {
                let index = codon_index(&codon).expect("generated codons are canonical");
                let to = amino_acids[index] as usize & 0x7f;
                tables[kind.index()][from][to] = true;
            }
        }
    }
    tables
}

//! Longest common substring search in forward and reverse-complement space.
//!
//! The extractor repeatedly needs the longest common substrings between a
//! reference region and a sample region, where a match may also be a
//! reverse complement (the complement string traversed backwards). Two
//! strategies are provided:
//!
//! * [`lcs_dp`] — the classic quadratic dynamic program, keeping only two
//!   matrix rows. Exact, but not for large regions.
//! * [`lcs_kmer`] — encodes the reference into non-overlapping k-mers and
//!   the sample into overlapping k-mers, finds runs of matching k-mers and
//!   extends them by up to `k` characters on both sides. Suitable for
//!   large, similar regions; a result shorter than `2k` may not be the
//!   true LCS, in which case the caller retries with a smaller `k`.
//!
//! [`lcs`] drives the reduction of `k` and falls back to the quadratic
//! search for small regions, returning an empty set once the configured
//! area ceiling would be exceeded (the caller then degrades the region to
//! a plain deletion-insertion).
//!
//! # Coordinate System
//!
//! All positions are 0-based indices into the full reference and sample
//! strings; `[start, end)` regions are half-open.

use log::trace;

/// A common substring between the reference and sample regions.
///
/// For a reverse-complement match, `reverse_complement(reference[
/// reference_index..reference_index + length])` equals
/// `sample[sample_index..sample_index + length]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substring {
    /// Start of the substring in the reference.
    pub reference_index: usize,
    /// Start of the substring in the sample.
    pub sample_index: usize,
    pub length: usize,
    pub reverse_complement: bool,
}

impl Substring {
    pub fn new(
        reference_index: usize,
        sample_index: usize,
        length: usize,
        reverse_complement: bool,
    ) -> Self {
        Substring {
            reference_index,
            sample_index,
            length,
            reverse_complement,
        }
    }
}

/// Quadratic-time longest common substring over the given regions.
///
/// When `complement` is supplied (DNA/RNA mode), matches against the
/// complement traversed backwards are searched simultaneously; both match
/// spaces compete for the same maximum. Returns all substrings of maximal
/// length.
pub fn lcs_dp(
    reference: &[u8],
    complement: Option<&[u8]>,
    reference_start: usize,
    reference_end: usize,
    sample: &[u8],
    sample_start: usize,
    sample_end: usize,
) -> Vec<Substring> {
    let reference_length = reference_end - reference_start;
    let sample_length = sample_end - sample_start;
    if reference_length == 0 || sample_length == 0 {
        return Vec::new();
    }

    let mut prev = vec![0usize; reference_length];
    let mut cur = vec![0usize; reference_length];
    let mut prev_rc = vec![0usize; reference_length];
    let mut cur_rc = vec![0usize; reference_length];

    let mut result: Vec<Substring> = Vec::new();
    let mut length = 0usize;

    for i in 0..sample_length {
        for j in 0..reference_length {
            // Forward match space.
            if reference[reference_start + j] == sample[sample_start + i] {
                cur[j] = if i == 0 || j == 0 { 1 } else { prev[j - 1] + 1 };
                if cur[j] > length {
                    length = cur[j];
                    result.clear();
                    result.push(Substring::new(
                        reference_start + j + 1 - length,
                        sample_start + i + 1 - length,
                        length,
                        false,
                    ));
                } else if cur[j] == length {
                    result.push(Substring::new(
                        reference_start + j + 1 - length,
                        sample_start + i + 1 - length,
                        length,
                        false,
                    ));
                }
            } else {
                cur[j] = 0;
            }

            // Reverse complement match space: the complement string is
            // traversed backwards, so a diagonal run pairs ascending
            // sample positions with descending reference positions.
            if let Some(comp) = complement {
                if comp[reference_end - j - 1] == sample[sample_start + i] {
                    cur_rc[j] = if i == 0 || j == 0 { 1 } else { prev_rc[j - 1] + 1 };
                    if cur_rc[j] > length {
                        length = cur_rc[j];
                        result.clear();
                        result.push(Substring::new(
                            reference_end - j - 1,
                            sample_start + i + 1 - length,
                            length,
                            true,
                        ));
                    } else if cur_rc[j] == length {
                        result.push(Substring::new(
                            reference_end - j - 1,
                            sample_start + i + 1 - length,
                            length,
                            true,
                        ));
                    }
                } else {
                    cur_rc[j] = 0;
                }
            }
        }
        std::mem::swap(&mut prev, &mut cur);
        std::mem::swap(&mut prev_rc, &mut cur_rc);
    }

    result
}

/// k-mer based longest common substring for large regions.
///
/// The reference region is cut into non-overlapping k-mers and the sample
/// region into overlapping ones; runs of matching k-mers are found with
/// the same two-space dynamic program and then extended by up to `k`
/// characters at both ends to recover their exact boundaries. All
/// candidates within one k-mer of the maximum are kept during the scan
/// because extension can promote them.
pub fn lcs_kmer(
    reference: &[u8],
    complement: Option<&[u8]>,
    reference_start: usize,
    reference_end: usize,
    sample: &[u8],
    sample_start: usize,
    sample_end: usize,
    k: usize,
) -> Vec<Substring> {
    debug_assert!(k > 1, "k-mer size must be greater than 1");
    let reference_length = (reference_end - reference_start) / k;
    if sample_end - sample_start < k || reference_length == 0 {
        return Vec::new();
    }
    let sample_length = sample_end - sample_start - k + 1;

    // Row `i % (k + 1)` is current; row `(i + 1) % (k + 1)` holds the
    // values from k sample positions ago, the diagonal predecessor in
    // k-mer space.
    let mut rows = vec![vec![0usize; reference_length]; k + 1];
    let mut rows_rc = vec![vec![0usize; reference_length]; k + 1];

    // Candidate lengths are counted in k-mers until the extension pass.
    let mut result: Vec<Substring> = Vec::new();
    let mut length = 0usize;

    for i in 0..sample_length {
        let row = i % (k + 1);
        let prev_row = (i + 1) % (k + 1);
        for j in 0..reference_length {
            let ref_kmer_start = reference_start + j * k;
            let forward_match = reference[ref_kmer_start..ref_kmer_start + k]
                == sample[sample_start + i..sample_start + i + k];
            if forward_match {
                let value = if i < k || j == 0 {
                    1
                } else {
                    rows[prev_row][j - 1] + 1
                };
                rows[row][j] = value;
                if value > length {
                    length = value;
                    prune_candidates(&mut result, length, j, i, k);
                    result.push(Substring::new(j, i, length, false));
                } else if value == length {
                    result.push(Substring::new(j, i, length, false));
                }
            } else {
                rows[row][j] = 0;
            }

            if let Some(comp) = complement {
                let rc_match = (0..k)
                    .all(|t| comp[reference_end - j * k - 1 - t] == sample[sample_start + i + t]);
                if rc_match {
                    let value = if i < k || j == 0 {
                        1
                    } else {
                        rows_rc[prev_row][j - 1] + 1
                    };
                    rows_rc[row][j] = value;
                    if value > length {
                        length = value;
                        prune_candidates(&mut result, length, j, i, k);
                        result.push(Substring::new(j, i, length, true));
                    } else if value == length {
                        result.push(Substring::new(j, i, length, true));
                    }
                } else {
                    rows_rc[row][j] = 0;
                }
            }
        }
    }

    // Convert k-mer coordinates to character coordinates and extend each
    // candidate up to k positions on both sides to find its exact length.
    let mut max_chars = length * k;
    for entry in &mut result {
        if entry.reverse_complement {
            let comp = match complement {
                Some(c) => c,
                None => continue,
            };
            entry.reference_index = reference_end - (entry.reference_index + 1) * k;
            entry.sample_index = entry.sample_index - (entry.length - 1) * k + sample_start;
            entry.length *= k;

            // Extend left (in the sample; right in the complement).
            let mut j = 1;
            while j < k
                && entry.reference_index + entry.length + j - 1 < reference_end
                && entry.sample_index >= sample_start + j
                && comp[entry.reference_index + entry.length + j - 1]
                    == sample[entry.sample_index - j]
            {
                j += 1;
            }
            entry.sample_index -= j - 1;
            entry.length += j - 1;

            // Extend right (in the sample; left in the complement).
            let mut j = 1;
            while j < k
                && entry.reference_index >= reference_start + j
                && entry.sample_index + entry.length + j - 1 < sample_end
                && comp[entry.reference_index - j]
                    == sample[entry.sample_index + entry.length + j - 1]
            {
                j += 1;
            }
            entry.reference_index -= j - 1;
            entry.length += j - 1;
        } else {
            entry.reference_index =
                reference_start + (entry.reference_index + 1 - entry.length) * k;
            entry.sample_index = entry.sample_index - (entry.length - 1) * k + sample_start;
            entry.length *= k;

            let mut j = 1;
            while j < k
                && entry.reference_index >= reference_start + j
                && entry.sample_index >= sample_start + j
                && reference[entry.reference_index - j] == sample[entry.sample_index - j]
            {
                j += 1;
            }
            entry.reference_index -= j - 1;
            entry.sample_index -= j - 1;
            entry.length += j - 1;

            let mut j = 0;
            while j < k - 1
                && entry.reference_index + entry.length + j < reference_end
                && entry.sample_index + entry.length + j < sample_end
                && reference[entry.reference_index + entry.length + j]
                    == sample[entry.sample_index + entry.length + j]
            {
                j += 1;
            }
            entry.length += j;
        }
        if entry.length > max_chars {
            max_chars = entry.length;
        }
    }

    result.retain(|entry| entry.length == max_chars);
    result
}

/// Drop candidates that can no longer reach the new maximum, including the
/// direct predecessor of the run that was just extended (it is guaranteed
/// to be one k-mer shorter).
fn prune_candidates(result: &mut Vec<Substring>, length: usize, j: usize, i: usize, k: usize) {
    result.retain(|entry| {
        let too_short = length - entry.length > 1;
        let is_predecessor =
            j > 0 && i >= k && entry.reference_index == j - 1 && entry.sample_index == i - k;
        !(too_short || is_predecessor)
    });
}

/// Longest common substrings with automatic k reduction.
///
/// Starts from `k = reference_region / 3` and halves it until a substring
/// of at least `2k` characters is found. Small regions use the quadratic
/// search directly; regions whose area exceeds `max_dp_area` return an
/// empty set instead, which the caller treats as "no usable match" and
/// degrades to a deletion-insertion (bounded-resource policy).
#[allow(clippy::too_many_arguments)]
pub fn lcs(
    reference: &[u8],
    complement: Option<&[u8]>,
    reference_start: usize,
    reference_end: usize,
    sample: &[u8],
    sample_start: usize,
    sample_end: usize,
    max_dp_area: usize,
) -> Vec<Substring> {
    let mut k = (reference_end - reference_start) / 3;

    while k > 1 {
        let result = lcs_kmer(
            reference,
            complement,
            reference_start,
            reference_end,
            sample,
            sample_start,
            sample_end,
            k,
        );
        if !result.is_empty() && result[0].length >= 2 * k {
            trace!(
                "lcs: k-mer search succeeded at k={} with length {}",
                k,
                result[0].length
            );
            return result;
        }
        k /= 2;
    }

    let area = (reference_end - reference_start) * (sample_end - sample_start);
    if area > max_dp_area {
        trace!(
            "lcs: area {} exceeds ceiling {}, degrading region",
            area,
            max_dp_area
        );
        return Vec::new();
    }
    lcs_dp(
        reference,
        complement,
        reference_start,
        reference_end,
        sample,
        sample_start,
        sample_end,
    )
}

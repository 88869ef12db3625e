//! Short tandem repeat discovery.
//!
//! [`short_tandem_repeats`] decomposes a sequence into maximal tandem
//! repeat stretches and the gaps between them; [`find_repeat_units`]
//! reduces that structure to the distinct units worth describing, which
//! feed [`crate::describe::describe_repeats`].
//!
//! # Coordinate System
//!
//! Repeat spans are 0-based half-open over the input string.

use log::debug;

/// Cap on the unit lengths considered; repeat discovery is quadratic in
/// this bound.
pub const REPEAT_SEARCH_THRESHOLD: usize = 10_000;

/// One stretch of the repeat decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeat {
    /// Start of the unit (for repeats) or of the gap.
    pub start: usize,
    /// End of the unit (for repeats) or of the gap.
    pub end: usize,
    /// Number of additional copies following the unit; `0` marks a
    /// non-repeating gap.
    pub count: usize,
}

impl Repeat {
    fn new(start: usize, end: usize, count: usize) -> Self {
        Repeat { start, end, count }
    }
}

/// Extract the short tandem repeat structure of a string.
///
/// At each position the unit length with the most consecutive extra
/// copies wins (ties go to the longest unit); positions without any
/// repetition are collected into gap entries with `count == 0`. The
/// entries tile the whole string in order.
pub fn short_tandem_repeats(string: &str, min_length: usize) -> Vec<Repeat> {
    let bytes = string.as_bytes();
    let length = bytes.len();

    let mut k_max = length / 2 + 1;
    if k_max > REPEAT_SEARCH_THRESHOLD {
        k_max = REPEAT_SEARCH_THRESHOLD / 2;
    }

    let mut repeats = Vec::new();
    let mut i = 0usize;
    let mut last_repeat = 0usize;

    while i < length {
        let mut max_count = 0usize;
        let mut max_k = 1usize;
        for k in min_length..k_max {
            let mut count = 0usize;
            let mut j = i + k;
            while j + k <= length && bytes[i..i + k] == bytes[j..j + k] {
                count += 1;
                j += k;
            }
            if count > 0 && count >= max_count {
                max_count = count;
                max_k = k;
            }
        }

        if max_count > 0 {
            if last_repeat < i {
                repeats.push(Repeat::new(last_repeat, i, 0));
            }
            repeats.push(Repeat::new(i, i + max_k, max_count));
            last_repeat = i + max_k * (max_count + 1);
        }
        i += max_k * (max_count + 1);
    }

    if last_repeat < i {
        repeats.push(Repeat::new(last_repeat, i.min(length), 0));
    }
    repeats
}

/// Distinct repeat units occurring at least `min_count` times in a row,
/// in order of first appearance.
pub fn find_repeat_units(string: &str, min_length: usize, min_count: usize) -> Vec<String> {
    let mut units: Vec<String> = Vec::new();
    for repeat in short_tandem_repeats(string, min_length) {
        if repeat.count + 1 < min_count {
            continue;
        }
        let unit = string[repeat.start..repeat.end].to_string();
        if !units.contains(&unit) {
            units.push(unit);
        }
    }
    debug!(
        "find_repeat_units: {} units in a {} base sequence",
        units.len(),
        string.len()
    );
    units
}

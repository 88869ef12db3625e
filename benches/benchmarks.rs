//! Performance benchmarks for hgvs-extractor
//!
//! Run with: cargo bench
//! Run specific benchmark: cargo bench -- describe

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hgvs_extractor::{describe_dna, short_tandem_repeats};

/// Deterministic pseudo-random DNA, so runs are comparable.
fn synthetic_dna(length: usize, seed: u64) -> String {
    const BASES: [char; 4] = ['A', 'C', 'G', 'T'];
    let mut state = seed.wrapping_mul(0x9E3779B97F4A7C15) | 1;
    (0..length)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            BASES[(state >> 32) as usize % 4]
        })
        .collect()
}

// =============================================================================
// Description benchmarks
// =============================================================================

/// Benchmark the common comparison shapes at increasing sizes.
fn bench_describe(c: &mut Criterion) {
    let mut group = c.benchmark_group("describe");

    for &length in &[1_000usize, 10_000, 100_000] {
        let reference = synthetic_dna(length, 7);
        group.throughput(Throughput::Bytes(length as u64));

        group.bench_with_input(
            BenchmarkId::new("identity", length),
            &reference,
            |b, reference| {
                b.iter(|| describe_dna(black_box(reference), black_box(reference)).unwrap())
            },
        );

        let mut substituted = reference.clone();
        let position = length / 2;
        let replacement = if &reference[position..position + 1] == "A" {
            "G"
        } else {
            "A"
        };
        substituted.replace_range(position..position + 1, replacement);
        group.bench_with_input(
            BenchmarkId::new("substitution", length),
            &(reference.clone(), substituted),
            |b, (reference, observed)| {
                b.iter(|| describe_dna(black_box(reference), black_box(observed)).unwrap())
            },
        );

        let mut deleted = reference.clone();
        deleted.replace_range(position..position + 50, "");
        group.bench_with_input(
            BenchmarkId::new("deletion", length),
            &(reference.clone(), deleted),
            |b, (reference, observed)| {
                b.iter(|| describe_dna(black_box(reference), black_box(observed)).unwrap())
            },
        );
    }
    group.finish();
}

/// Benchmark a comparison whose middle region actually needs the aligner:
/// two separated substitutions force a full LCS decomposition between
/// them.
fn bench_describe_decomposition(c: &mut Criterion) {
    let mut group = c.benchmark_group("describe_decomposition");

    for &length in &[1_000usize, 5_000] {
        let reference = synthetic_dna(length, 11);
        let mut observed = reference.clone();
        for position in [length / 4, 3 * length / 4] {
            let replacement = if &reference[position..position + 1] == "C" {
                "T"
            } else {
                "C"
            };
            observed.replace_range(position..position + 1, replacement);
        }
        group.throughput(Throughput::Bytes(length as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(length),
            &(reference, observed),
            |b, (reference, observed)| {
                b.iter(|| describe_dna(black_box(reference), black_box(observed)).unwrap())
            },
        );
    }
    group.finish();
}

// =============================================================================
// Repeat discovery benchmarks
// =============================================================================

fn bench_repeat_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("repeats");

    let mut sequence = synthetic_dna(500, 3);
    sequence.push_str(&"TCCT".repeat(40));
    sequence.push_str(&synthetic_dna(500, 5));
    group.throughput(Throughput::Bytes(sequence.len() as u64));
    group.bench_function("short_tandem_repeats", |b| {
        b.iter(|| short_tandem_repeats(black_box(&sequence), 2))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_describe,
    bench_describe_decomposition,
    bench_repeat_discovery
);
criterion_main!(benches);

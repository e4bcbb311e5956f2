//! Query benchmarks.
//!
//! `count` is the hot path of a read classifier: per fingerprint it
//! ANDs one word per hash function for each 64-bin column and decodes
//! the survivors. The bin count determines the column count per block,
//! so the 64 to 1024 sweep shows the per-word cost of widening.

use binbloom::InterleavedBloomFilter;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const KMER_SIZE: usize = 20;
const BITS: u64 = (1 << 26) + 256;

fn random_dna(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

fn populated_filter(rng: &mut StdRng, bins: usize) -> InterleavedBloomFilter {
    let filter = InterleavedBloomFilter::new(bins, 3, KMER_SIZE, BITS).unwrap();
    for bin in 0..bins {
        let reference = random_dna(rng, 2_000);
        filter.insert_kmer(&reference, bin).unwrap();
    }
    filter
}

fn count_by_bin_count(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xc001);
    let read = random_dna(&mut rng, 250);

    let mut group = c.benchmark_group("count/bins");
    group.sample_size(40);
    for bins in [64usize, 256, 1_024] {
        let filter = populated_filter(&mut rng, bins);
        group.throughput(Throughput::Elements((250 - KMER_SIZE + 1) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(bins), &filter, |b, filter| {
            b.iter(|| black_box(filter.count(black_box(&read))));
        });
    }
    group.finish();
}

fn select_by_threshold(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xc002);
    let filter = populated_filter(&mut rng, 256);
    let read = random_dna(&mut rng, 250);

    let mut group = c.benchmark_group("select/threshold");
    group.sample_size(40);
    for threshold in [1u16, 10, 100] {
        group.bench_with_input(
            BenchmarkId::from_parameter(threshold),
            &threshold,
            |b, &threshold| {
                b.iter(|| black_box(filter.select(black_box(&read), threshold)));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, count_by_bin_count, select_by_threshold);
criterion_main!(benches);

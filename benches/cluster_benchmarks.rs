use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use readcluster::index::ReadIndex;
use readcluster::overlap::{FmOverlapper, OverlapEngine};
use readcluster::utils::reverse_complement_str;
use readcluster::ReadCluster;

const READ_LEN: usize = 100;

/// Reads tiled along a random genome every `step` bases, every third one reversed
fn tiled_reads(genome_len: usize, step: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let genome: String = (0..genome_len)
        .map(|_| b"ACGT"[rng.gen_range(0..4)] as char)
        .collect();

    (0..=genome_len - READ_LEN)
        .step_by(step)
        .enumerate()
        .map(|(i, start)| {
            let read = &genome[start..start + READ_LEN];
            if i % 3 == 2 {
                reverse_complement_str(read)
            } else {
                read.to_string()
            }
        })
        .collect()
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    for genome_len in [10_000, 50_000] {
        let reads = tiled_reads(genome_len, 25, 1);
        group.throughput(Throughput::Elements(reads.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(genome_len), &reads, |b, reads| {
            b.iter(|| ReadIndex::build(black_box(reads)))
        });
    }
    group.finish();
}

fn bench_overlap_read(c: &mut Criterion) {
    let reads = tiled_reads(20_000, 25, 2);
    let overlapper = FmOverlapper::new(ReadIndex::build(&reads).unwrap());
    let query = reads[reads.len() / 2].clone();

    c.bench_function("overlap_read", |b| {
        b.iter(|| overlapper.overlap_read(black_box(&query), black_box(45)))
    });
}

fn bench_cluster_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster_growth");
    for genome_len in [5_000, 20_000] {
        let reads = tiled_reads(genome_len, 25, 3);
        let overlapper = FmOverlapper::new(ReadIndex::build(&reads).unwrap());
        group.throughput(Throughput::Elements(reads.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(genome_len), &reads, |b, reads| {
            b.iter(|| {
                let mut cluster = ReadCluster::new(&overlapper, 45);
                cluster.add_seed(&reads[0], true).ok();
                cluster.run(reads.len());
                cluster.get_output().len()
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_index_build,
    bench_overlap_read,
    bench_cluster_growth
);
criterion_main!(benches);

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use vidsift::ranking::{RangeDefinition, RankingEntry, entries_in_range};
use vidsift::sampler::{pool_seed, range_pool_identity, sample};

const SAMPLE_SIZE: usize = 100;

fn ranking_of(count: u32) -> Vec<RankingEntry> {
    (1..=count)
        .map(|rank| RankingEntry {
            rank,
            score: 1.0 - rank as f64 / count as f64,
            filename: format!("vid{rank:06}.mp4"),
        })
        .collect()
}

fn bench_pool_seed(c: &mut Criterion) {
    c.bench_function("pool_seed", |b| {
        b.iter(|| pool_seed(black_box("range_1001_5000")));
    });
}

fn bench_range_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_sampling");
    for total in [1_000u32, 10_000, 50_000] {
        let ranking = ranking_of(total);
        let range = RangeDefinition::new("bench", 1, total);
        let in_range = entries_in_range(&ranking, &range);
        let identity = range_pool_identity(&range);
        group.bench_with_input(BenchmarkId::from_parameter(total), &total, |b, _| {
            b.iter(|| {
                let result = sample(
                    black_box(&range),
                    black_box(&in_range),
                    black_box(&identity),
                    SAMPLE_SIZE,
                );
                black_box(result.sample.len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pool_seed, bench_range_sampling);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reversi_selfplay::{assign_credit, play_episode, PolicyValueModel, SelfPlayConfig};

/// Cheap deterministic predictor so the benchmark measures the engine and orchestrator
struct PositionalModel;

impl PolicyValueModel for PositionalModel {
    fn predict(&self, features: &[f32]) -> anyhow::Result<(Vec<f32>, f32)> {
        let logits = (0..64)
            .map(|i| {
                let (r, c) = (i / 8, i % 8);
                let edge = (r == 0 || r == 7) as u8 + (c == 0 || c == 7) as u8;
                f32::from(edge)
            })
            .collect();
        let value = features.iter().sum::<f32>() / 64.0;
        Ok((logits, value))
    }
}

/// Benchmark a single self-play episode with different step caps
fn bench_single_episode(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_episode");

    for max_steps in [10usize, 30, 60].iter() {
        let config = SelfPlayConfig::default().with_max_steps(*max_steps);

        group.bench_with_input(BenchmarkId::from_parameter(max_steps), max_steps, |b, _| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| {
                let record = play_episode(black_box(&PositionalModel), black_box(&config), &mut rng)
                    .expect("Episode failed");
                let credit = assign_credit(&record.trajectory, &record.rewards, config.attribution);
                black_box((record, credit))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_episode);
criterion_main!(benches);

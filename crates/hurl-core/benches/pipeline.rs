use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use hurl_core::{FeedSystem, GenerateParams, Mode, SystemConfig, TopicGraph, TrendEngine};

fn bench_generate(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let system = FeedSystem::new(SystemConfig::default());
    let mut group = c.benchmark_group("generate");

    for mode in [Mode::Emergent, Mode::PureRandom] {
        let params = GenerateParams {
            toxicity_max: 1.0,
            ..GenerateParams::new(100).with_seed(42).with_mode(mode)
        };
        group.bench_function(mode.as_str(), |b| {
            b.iter(|| rt.block_on(system.generate(&params)).unwrap())
        });
    }
    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let engine = TrendEngine::new(Arc::new(TopicGraph::seeded()));
    for id in ["ai", "crypto", "gaming", "memes"] {
        engine.inject_shock_at(id, 5.0, 3600.0, 0.0).unwrap();
    }
    let mut now = 0.0;
    c.bench_function("tick", |b| {
        b.iter(|| {
            now += 1.0;
            engine.tick_at(now).unwrap()
        })
    });
}

criterion_group!(benches, bench_generate, bench_tick);
criterion_main!(benches);

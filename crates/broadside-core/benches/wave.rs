use broadside_core::prelude::*;
use broadside_core::systems::Ocean;
use broadside_logic::config::WaveConfig;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;

/// Buoyancy-style sampling: four corners per hull, hulls spread over a grid.
fn sample_points(hulls: usize) -> Vec<(f32, f32)> {
    let side = (hulls as f32).sqrt().ceil() as usize;
    (0..hulls)
        .flat_map(|i| {
            let cx = (i % side) as f32 * 25.0;
            let cz = (i / side) as f32 * 25.0;
            [(-1.5, -3.2), (1.5, -3.2), (-1.5, 3.2), (1.5, 3.2)].map(|(dx, dz)| (cx + dx, cz + dz))
        })
        .collect()
}

fn bench_sampling(c: &mut Criterion) {
    let points = sample_points(64);
    let mut group = c.benchmark_group("wave_sampling");

    for cached in [true, false] {
        let config = WaveConfig {
            cache_enabled: cached,
            ..WaveConfig::default()
        };
        let name = if cached { "cached" } else { "uncached" };
        let mut ocean = Ocean::new(config);
        group.bench_function(name, |b| {
            b.iter(|| {
                ocean.begin_tick(1.0 / 50.0);
                let mut sum = 0.0;
                // Every point twice per tick, as buoyancy and splash checks do.
                for _ in 0..2 {
                    for &(x, z) in &points {
                        sum += ocean.height(x, z);
                    }
                }
                black_box(sum)
            })
        });
    }
    group.finish();
}

fn bench_engine_step(c: &mut Criterion) {
    let config = GameConfig::default();
    let mut engine = SimulationEngine::new(config.clone()).unwrap();
    for i in 0..16 {
        let x = (i % 4) as f32 * 30.0;
        let z = (i / 4) as f32 * 30.0;
        engine.spawn_vessel(VesselBuilder::gunboat(format!("Boat {}", i), Faction::Friendly, &config).at(Vec3::new(x, 0.0, z)));
    }
    c.bench_function("engine_step_16_vessels", |b| b.iter(|| engine.step()));
}

criterion_group!(benches, bench_sampling, bench_engine_step);
criterion_main!(benches);

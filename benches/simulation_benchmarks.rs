//! 模拟热路径性能基准测试
//!
//! 测试缓动求值、粒子/精灵推进和镜头积分的每帧成本

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use glam::Vec2;
use living_map::animation::{EasingConfig, EasingPreset};
use living_map::config::MapConfig;
use living_map::core::MapEngine;
use living_map::effects::{
    ParticleEffectConfig, ParticleMode, ParticleSimulator, SpriteEffectConfig, SpriteSimulator,
};

fn bench_easing(c: &mut Criterion) {
    let mut group = c.benchmark_group("easing");

    let linear = EasingConfig::Preset(EasingPreset::Linear).resolve();
    let bezier = EasingConfig::ControlPoints([0.25, 0.1, 0.25, 1.0]).resolve();

    group.bench_function("linear", |b| {
        b.iter(|| black_box(linear.eval(black_box(0.37))));
    });

    group.bench_function("cubic_bezier", |b| {
        b.iter(|| black_box(bezier.eval(black_box(0.37))));
    });

    group.finish();
}

fn bench_particles(c: &mut Criterion) {
    let mut group = c.benchmark_group("particle_tick");
    let region = Vec2::new(1024.0, 512.0);

    for count in [64, 512, 4096] {
        let config = ParticleEffectConfig {
            max_count: count,
            mode: ParticleMode::Drift {
                speed: 30.0,
                speed_variance: 0.4,
                direction: 0.8,
                direction_variance: std::f32::consts::PI,
                max_distance: 200.0,
            },
            seed: Some(42),
            ..Default::default()
        };
        let mut simulator = ParticleSimulator::new(config, region);

        group.bench_with_input(BenchmarkId::new("drift", count), &count, |b, _| {
            b.iter(|| {
                simulator.tick(black_box(0.016), region);
            });
        });
    }

    group.finish();
}

fn bench_sprites(c: &mut Criterion) {
    let mut group = c.benchmark_group("sprite_tick");
    let region = Vec2::new(1024.0, 512.0);

    let mut simulator = SpriteSimulator::new(
        SpriteEffectConfig {
            max_count: 64,
            seed: Some(7),
            ..Default::default()
        },
        region,
    );

    group.bench_function("roaming_64", |b| {
        b.iter(|| {
            simulator.tick(black_box(0.016), region);
        });
    });

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_tick");

    let mut engine = MapEngine::new(MapConfig {
        particles: vec![ParticleEffectConfig {
            max_count: 256,
            seed: Some(1),
            ..Default::default()
        }],
        sprites: vec![SpriteEffectConfig {
            max_count: 12,
            seed: Some(2),
            ..Default::default()
        }],
        ..Default::default()
    });
    engine.wheel(Vec2::new(640.0, 360.0), -100.0);

    group.bench_function("full_frame", |b| {
        b.iter(|| {
            black_box(engine.tick(black_box(0.016)));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_easing,
    bench_particles,
    bench_sprites,
    bench_engine
);
criterion_main!(benches);

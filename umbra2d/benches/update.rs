#![allow(missing_docs)]

use criterion::{Criterion, criterion_group, criterion_main};
use euclid::{point2, vec2};
use rand::{Rng as _, SeedableRng as _};
use rand_xoshiro::Xoshiro256Plus;

use umbra2d::math::{Aabb, LightColor};
use umbra2d::testing::FixtureWorld;
use umbra2d::world::BodyKind;
use umbra2d::{Light, LightSet};

/// A cluttered scene: static boxes and circles scattered over the view, plus
/// one dynamic circle the awake benchmarks can nudge.
fn scene(rng: &mut Xoshiro256Plus) -> (FixtureWorld, umbra2d::world::OccluderId) {
    let mut world = FixtureWorld::new();
    for _ in 0..40 {
        let center = point2(rng.random_range(-40.0..40.0), rng.random_range(-40.0..40.0));
        if rng.random_range(0..2) == 0 {
            let half = vec2(rng.random_range(0.5..2.0), rng.random_range(0.5..2.0));
            world.add_box(BodyKind::Static, Aabb::centered(center, half));
        } else {
            world.add_circle(BodyKind::Static, center, rng.random_range(0.3..1.5));
        }
    }
    let mover = world.add_circle(BodyKind::Dynamic, point2(0., 0.), 1.0);
    (world, mover)
}

fn light_set(lights: impl IntoIterator<Item = Light>) -> LightSet {
    let mut set = LightSet::default();
    for light in lights {
        set.insert(light);
    }
    set.set_view_bounds(Aabb::new(-50., 50., -50., 50.));
    set
}

pub fn update_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");

    // Fixed fans recompute every ray every frame; this is the baseline cost.
    group.bench_function("uniform point", |b| {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let (world, _) = scene(&mut rng);
        let mut set = light_set((0..16).map(|_| {
            Light::point(
                128,
                LightColor::DEFAULT,
                15.0,
                point2(rng.random_range(-40.0..40.0), rng.random_range(-40.0..40.0)),
            )
        }));
        b.iter(|| set.update(&world));
    });

    // Silhouette-driven lights with a body moving among them, so every update
    // gathers and re-aims.
    group.bench_function("exact point awake", |b| {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let (mut world, mover) = scene(&mut rng);
        let mut set = light_set((0..16).map(|_| {
            Light::exact_point(
                32,
                LightColor::DEFAULT,
                15.0,
                point2(rng.random_range(-40.0..40.0), rng.random_range(-40.0..40.0)),
            )
        }));
        let mut step = 0.1f32;
        b.iter(|| {
            world.translate(mover, vec2(step, 0.));
            step = -step;
            set.update(&world);
        });
    });

    // The same lights holding still: every update should notice nothing
    // changed and skip the raycasts.
    group.bench_function("exact point sleeping", |b| {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let (world, _) = scene(&mut rng);
        let mut set = light_set((0..16).map(|_| {
            Light::exact_point(
                32,
                LightColor::DEFAULT,
                15.0,
                point2(rng.random_range(-40.0..40.0), rng.random_range(-40.0..40.0)),
            )
        }));
        set.update(&world);
        b.iter(|| set.update(&world));
    });

    // One wide strip light instead of many points.
    group.bench_function("exact line awake", |b| {
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let (mut world, mover) = scene(&mut rng);
        let mut set = light_set([Light::exact_line(
            64,
            LightColor::DEFAULT,
            60.0,
            point2(0., 45.),
            umbra2d::math::WorldAngle::degrees(180.),
            80.0,
        )]);
        let mut step = 0.1f32;
        b.iter(|| {
            world.translate(mover, vec2(step, 0.));
            step = -step;
            set.update(&world);
        });
    });

    group.finish();
}

criterion_group!(benches, update_bench);
criterion_main!(benches);

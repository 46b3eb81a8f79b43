use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slog::{o, Drain};
use spawner_engine::prelude::*;
use spawner_engine::sandbox::{Cuboid, Sandbox};
use std::time::Duration;

fn logger() -> slog::Logger {
    slog::Logger::root(slog::Discard.fuse(), o!())
}

fn host() -> Sandbox {
    let mut host = Sandbox::default();
    host.add_region(
        RegionId(1),
        Cuboid::new(Location::new(0., 0., 0.), Location::new(64., 8., 64.)),
    )
    .add_actor(Actor::new(Location::new(5., 1., 5.)));
    host
}

fn definitions(n: u32) -> Vec<SpawnPointDefinition> {
    (0..n)
        .map(|i| {
            SpawnPointDefinition::builder()
                .with_spawn_region(RegionId(1))
                .with_player_region(RegionId(1))
                .with_min_delay(Duration::from_millis(50))
                .with_max_delay(Duration::from_millis(50 + (i as u64 % 20) * 50))
                .with_max_entities(8)
                .with_object(SpawnableObject::Creature {
                    kind: CreatureKind("zombie".to_owned()),
                    count: 2,
                })
                .build()
                .expect("valid definition")
        })
        .collect()
}

fn tick_large_match(c: &mut Criterion) {
    let engine = SpawnEngine::new(logger()).with_seed(42);
    let handle = engine.load(definitions(4096));
    let mut host = host();

    c.bench_function("tick 4096 spawners", |b| {
        b.iter(|| {
            let report = engine
                .tick(handle, Duration::from_millis(50), &mut host)
                .expect("tick");
            // keep the spawners below their caps so every tick does real work
            for object in engine.tracked_objects(handle).expect("tracked") {
                host.remove(object);
                engine.notify_removed(handle, object);
            }
            black_box(report)
        })
    });
}

fn tick_idle_match(c: &mut Criterion) {
    let engine = SpawnEngine::new(logger()).with_seed(42);
    let handle = engine.load(definitions(4096));
    let mut host = host();
    host.clear_actors();

    c.bench_function("tick 4096 unoccupied spawners", |b| {
        b.iter(|| {
            black_box(
                engine
                    .tick(handle, Duration::from_millis(50), &mut host)
                    .expect("tick"),
            )
        })
    });
}

criterion_group!(benches, tick_large_match, tick_idle_match);
criterion_main!(benches);

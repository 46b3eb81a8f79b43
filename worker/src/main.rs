mod config;
mod init;

use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use slog::{debug, info, o, trace, Drain, Logger};
use spawner_engine::prelude::*;
use spawner_engine::sandbox::Sandbox;
use std::time::{Duration, Instant};

fn init() {
    #[cfg(feature = "dotenv")]
    dep_dotenv::dotenv().unwrap_or_default();
}

fn tick(
    logger: &Logger,
    engine: &SpawnEngine,
    handle: EngineHandle,
    sandbox: &mut Sandbox,
    elapsed: Duration,
) -> anyhow::Result<()> {
    let start = Utc::now();
    let report = engine.tick(handle, elapsed, sandbox)?;
    for (index, outcome) in report.triggered.iter() {
        match outcome {
            TriggerOutcome::Unoccupied => debug!(logger, "Spawner {} is unoccupied", index),
            TriggerOutcome::Discarded => debug!(logger, "Spawner {} was unloaded", index),
            TriggerOutcome::Spawned(summary) => debug!(
                logger,
                "Spawner {} spawned {} tracked and {} untracked objects, {} capped",
                index,
                summary.tracked.len(),
                summary.untracked,
                summary.capped
            ),
        }
    }
    let duration = Utc::now() - start;
    trace!(
        logger,
        "Tick has been completed in {} ms",
        duration.num_milliseconds()
    );
    Ok(())
}

/// Kill off random tracked objects, standing in for deaths, pickups and despawns
fn remove_random_objects(
    logger: &Logger,
    engine: &SpawnEngine,
    handle: EngineHandle,
    sandbox: &mut Sandbox,
    rng: &mut SmallRng,
    chance: f64,
) -> anyhow::Result<()> {
    for object in engine.tracked_objects(handle)? {
        if rng.gen_bool(chance) {
            sandbox.remove(object);
            if engine.notify_removed(handle, object) {
                trace!(logger, "Removed {:?}", object);
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init();

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain).fuse();
    let drain = slog_async::Async::new(drain)
        .overflow_strategy(slog_async::OverflowStrategy::DropAndReport)
        .build()
        .fuse();
    let logger = slog::Logger::root(drain, o!());

    let conf = config::WorkerConfig::load();
    info!(logger, "Starting with config {:?}", conf);

    let world = init::read_world(&logger, &conf.world_path)?;
    let mut sandbox = init::init_sandbox(&logger, &world);

    let mut engine = SpawnEngine::new(logger.new(o!("system" => "spawners")));
    let mut rng = match conf.seed {
        Some(seed) => {
            engine = engine.with_seed(seed);
            SmallRng::seed_from_u64(seed)
        }
        None => SmallRng::from_entropy(),
    };
    let handle = init::load_spawners(&logger, &engine, &world)?;

    let tick_freq = Duration::from_millis(conf.target_tick_freq_ms);
    let mut last_tick: DateTime<Utc> = Utc::now();
    let mut time = 0u64;
    loop {
        if conf.n_ticks.map(|n| time >= n).unwrap_or(false) {
            break;
        }
        let start = Instant::now();

        let now = Utc::now();
        let dt = (now - last_tick).to_std().unwrap_or_default();
        last_tick = now;

        let logger = logger.new(o!("tick" => time));
        tick(&logger, &engine, handle, &mut sandbox, dt)?;
        remove_random_objects(
            &logger,
            &engine,
            handle,
            &mut sandbox,
            &mut rng,
            conf.removal_chance,
        )?;
        time += 1;

        let sleep_duration = tick_freq
            .checked_sub(Instant::now() - start)
            .unwrap_or_else(|| Duration::from_millis(0));
        std::thread::sleep(sleep_duration);
    }

    for i in 0..engine.spawner_count(handle)? {
        info!(
            logger,
            "Spawner {} finished with {:?} live objects",
            i,
            engine.live_count(handle, i)?
        );
    }
    info!(
        logger,
        "{} objects remain in the world",
        sandbox.objects().count()
    );
    engine.unload(handle);
    Ok(())
}

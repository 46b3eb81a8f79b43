use crate::definition::SpawnPointDefinition;
use crate::model::{EngineHandle, ObjectHandle};
use crate::systems::scheduler::{
    SpawnPoint, SpawnerState, TrackedIndex, Tracking, TriggerOutcome,
};
use crate::world::Host;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_derive::Serialize;
use slog::{debug, info, o, trace, Drain, Logger};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;

#[cfg(not(feature = "disable-parallelism"))]
use rayon::prelude::*;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("No spawners are loaded under handle {0}")]
    UnknownHandle(EngineHandle),
}

/// Outcomes of the spawn points that triggered during a tick
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// (spawn point index, outcome) in definition order
    pub triggered: Vec<(usize, TriggerOutcome)>,
}

/// Spawn points of a single match
struct MatchSpawners {
    points: Vec<SpawnPoint>,
    tracked: TrackedIndex,
    logger: Logger,
}

impl MatchSpawners {
    fn tracked(&self) -> MutexGuard<Tracking> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance every countdown, return the indices of the expired ones
    fn advance(&self, elapsed: Duration) -> Vec<usize> {
        #[cfg(not(feature = "disable-parallelism"))]
        let points = self.points.par_iter();
        #[cfg(feature = "disable-parallelism")]
        let points = self.points.iter();

        points
            .enumerate()
            .filter_map(|(i, point)| if point.advance(elapsed) { Some(i) } else { None })
            .collect()
    }

    fn discard(&self) {
        self.tracked()
            .discard(self.points.iter().map(|point| point.counter()));
    }
}

/// Runs the spawners of any number of concurrent matches.
///
/// Every method takes `&self`, removal notifications may arrive from other threads while a tick
/// is in progress.
pub struct SpawnEngine {
    logger: Logger,
    rng: Mutex<SmallRng>,
    next_handle: AtomicU64,
    matches: RwLock<HashMap<EngineHandle, Arc<MatchSpawners>>>,
}

impl Default for SpawnEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SpawnEngine {
    pub fn new(logger: impl Into<Option<Logger>>) -> Self {
        let logger = logger.into().unwrap_or_else(|| {
            let decorator = slog_term::TermDecorator::new().build();
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            let drain = slog_envlogger::new(drain).fuse();
            let drain = slog_async::Async::new(drain)
                .overflow_strategy(slog_async::OverflowStrategy::DropAndReport)
                .chan_size(16000)
                .build()
                .fuse();
            Logger::root(drain, o!())
        });
        Self {
            logger,
            rng: Mutex::new(SmallRng::from_entropy()),
            next_handle: AtomicU64::new(0),
            matches: RwLock::new(HashMap::new()),
        }
    }

    /// Make delay draws and spawn locations reproducible
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            ..self
        }
    }

    fn get(&self, handle: EngineHandle) -> Result<Arc<MatchSpawners>, EngineError> {
        self.matches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
            .ok_or(EngineError::UnknownHandle(handle))
    }

    /// Begin tracking a fresh set of spawn points, e.g. when a match starts.
    ///
    /// Definitions may be shared between matches, every load gets its own runtime state.
    pub fn load<I, D>(&self, definitions: I) -> EngineHandle
    where
        I: IntoIterator<Item = D>,
        D: Into<Arc<SpawnPointDefinition>>,
    {
        let handle = EngineHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let logger = self.logger.new(o!("match" => handle.0));

        let points = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            definitions
                .into_iter()
                .enumerate()
                .map(|(i, def)| {
                    let def: Arc<SpawnPointDefinition> = def.into();
                    let logger = match def.id() {
                        Some(id) => logger.new(o!("spawner" => id.to_owned())),
                        None => logger.new(o!("spawner" => i)),
                    };
                    SpawnPoint::new(def, SmallRng::seed_from_u64(rng.gen()), logger)
                })
                .collect::<Vec<_>>()
        };

        info!(logger, "Loaded {} spawners", points.len());
        let spawners = MatchSpawners {
            points,
            tracked: TrackedIndex::default(),
            logger,
        };
        self.matches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, Arc::new(spawners));
        handle
    }

    /// Advance every spawn point under `handle` by `elapsed` and run the ones that expired
    pub fn tick<H: Host>(
        &self,
        handle: EngineHandle,
        elapsed: Duration,
        host: &mut H,
    ) -> Result<TickReport, EngineError> {
        let spawners = self.get(handle)?;
        trace!(spawners.logger, "Tick {:?}", elapsed);

        let expired = spawners.advance(elapsed);
        let mut triggered = Vec::with_capacity(expired.len());
        // triggers mutate the host, so these run one at a time
        for i in expired {
            let outcome = spawners.points[i].trigger(host, &spawners.tracked);
            triggered.push((i, outcome));
        }

        if !triggered.is_empty() {
            debug!(spawners.logger, "{} spawners triggered", triggered.len());
        }
        Ok(TickReport { triggered })
    }

    /// A tracked object left the world.
    ///
    /// Objects removed while their spawn call is still running never count against the cap.
    /// Unknown handles and objects of unloaded matches are ignored.
    /// Returns whether a spawn point's count was released.
    pub fn notify_removed(&self, handle: EngineHandle, object: ObjectHandle) -> bool {
        let spawners = match self.get(handle) {
            Ok(s) => s,
            Err(_) => {
                trace!(self.logger, "Removal of {:?} in unloaded match {}", object, handle);
                return false;
            }
        };
        let mut tracked = spawners.tracked();
        match tracked.remove(object) {
            Some(counter) => {
                counter.release(1);
                trace!(
                    spawners.logger,
                    "Released {:?}, live: {}",
                    object,
                    counter.live()
                );
                true
            }
            None => false,
        }
    }

    /// Discard every spawn point under `handle`, e.g. when the match ends.
    /// Returns false if nothing was loaded under `handle`.
    pub fn unload(&self, handle: EngineHandle) -> bool {
        let spawners = self
            .matches
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        match spawners {
            Some(spawners) => {
                spawners.discard();
                info!(spawners.logger, "Unloaded");
                true
            }
            None => false,
        }
    }

    pub fn is_loaded(&self, handle: EngineHandle) -> bool {
        self.get(handle).is_ok()
    }

    pub fn spawner_count(&self, handle: EngineHandle) -> Result<usize, EngineError> {
        self.get(handle).map(|s| s.points.len())
    }

    /// Live tracked objects of the `index`th spawn point
    pub fn live_count(
        &self,
        handle: EngineHandle,
        index: usize,
    ) -> Result<Option<u32>, EngineError> {
        self.get(handle)
            .map(|s| s.points.get(index).map(|p| p.counter().live()))
    }

    pub fn state(
        &self,
        handle: EngineHandle,
        index: usize,
    ) -> Result<Option<SpawnerState>, EngineError> {
        self.get(handle)
            .map(|s| s.points.get(index).map(|p| p.state()))
    }

    /// Tracked objects currently in the world, in no particular order
    pub fn tracked_objects(&self, handle: EngineHandle) -> Result<Vec<ObjectHandle>, EngineError> {
        self.get(handle)
            .map(|s| s.tracked().handles().collect())
    }
}

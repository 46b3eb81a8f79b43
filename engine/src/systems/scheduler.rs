//! Timer state machine of a spawn point.
//!
//! - On load the countdown is drawn from `[min_delay, max_delay]`
//! - Ticks decrement the countdown
//! - When it reaches 0 the occupancy gate is consulted, objects are spawned if it passes, and a
//! new countdown is drawn either way
//!
//! Spawn points without objects stay `Idle` forever.
//!
use super::accounting::LiveCounter;
use super::occupancy;
use crate::definition::SpawnPointDefinition;
use crate::model::ObjectHandle;
use crate::world::Host;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::SmallRng;
use serde_derive::Serialize;
use slog::{debug, trace, warn, Logger};
use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Tracked objects of a match
#[derive(Debug, Default)]
pub(crate) struct Tracking {
    /// object -> counter of the spawn point that created it
    objects: HashMap<ObjectHandle, Arc<LiveCounter>>,
    /// removals reported before the spawn call that created the object returned
    early_removals: HashSet<ObjectHandle>,
    /// triggers currently creating objects
    in_flight: usize,
}

pub(crate) type TrackedIndex = Mutex<Tracking>;

fn lock(index: &TrackedIndex) -> MutexGuard<Tracking> {
    index.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Tracking {
    pub fn handles(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.objects.keys().copied()
    }

    /// Forget `object`, returning the counter it was charged to.
    ///
    /// Unknown objects reported while a trigger is creating objects are remembered, they may
    /// belong to a spawn call that has not returned yet.
    pub fn remove(&mut self, object: ObjectHandle) -> Option<Arc<LiveCounter>> {
        let counter = self.objects.remove(&object);
        if counter.is_none() && self.in_flight > 0 {
            self.early_removals.insert(object);
        }
        counter
    }

    /// Track the objects that are still in the world.
    /// Returns the registered handles.
    fn register(
        &mut self,
        handles: Vec<ObjectHandle>,
        counter: &Arc<LiveCounter>,
    ) -> Vec<ObjectHandle> {
        if counter.is_discarded() {
            return Vec::new();
        }
        let early_removals = &mut self.early_removals;
        let registered = handles
            .into_iter()
            .filter(|handle| !early_removals.remove(handle))
            .collect::<Vec<_>>();
        for handle in registered.iter() {
            self.objects.insert(*handle, Arc::clone(counter));
        }
        registered
    }

    /// Discard every counter and forget every object
    pub fn discard<'a>(&mut self, counters: impl Iterator<Item = &'a Arc<LiveCounter>>) {
        for counter in counters {
            counter.discard();
        }
        self.objects.clear();
        self.early_removals.clear();
    }
}

/// Marks a trigger as creating objects for as long as it lives
struct InFlight<'a> {
    index: &'a TrackedIndex,
}

impl<'a> InFlight<'a> {
    fn enter(index: &'a TrackedIndex) -> Self {
        lock(index).in_flight += 1;
        Self { index }
    }
}

impl<'a> Drop for InFlight<'a> {
    fn drop(&mut self) {
        let mut tracking = lock(self.index);
        tracking.in_flight -= 1;
        if tracking.in_flight == 0 {
            tracking.early_removals.clear();
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SpawnerState {
    Idle,
    Waiting { remaining: Duration },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnSummary {
    /// Handles of the tracked objects created by this trigger
    pub tracked: Vec<ObjectHandle>,
    /// Number of untracked objects created by this trigger
    pub untracked: u32,
    /// Tracked instances skipped because the spawn point was at its cap
    pub capped: u32,
    /// Instances the world refused to create
    pub failed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerOutcome {
    Unoccupied,
    Spawned(SpawnSummary),
    /// The match was unloaded before the trigger ran
    Discarded,
}

/// Draw a delay uniformly from `[min_delay, max_delay]`
pub fn draw_delay(definition: &SpawnPointDefinition, rng: &mut SmallRng) -> Duration {
    let nanos = |d: Duration| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
    let min = nanos(definition.min_delay());
    let max = nanos(definition.max_delay());
    if min >= max {
        return definition.min_delay();
    }
    Duration::from_nanos(Uniform::new_inclusive(min, max).sample(rng))
}

struct Timer {
    state: SpawnerState,
    rng: SmallRng,
}

impl Timer {
    fn rearm(&mut self, definition: &SpawnPointDefinition) {
        let remaining = draw_delay(definition, &mut self.rng);
        self.state = SpawnerState::Waiting { remaining };
    }
}

/// Runtime state of a single spawn point within a single match
pub struct SpawnPoint {
    definition: Arc<SpawnPointDefinition>,
    timer: Mutex<Timer>,
    counter: Arc<LiveCounter>,
    logger: Logger,
}

impl SpawnPoint {
    pub fn new(definition: Arc<SpawnPointDefinition>, rng: SmallRng, logger: Logger) -> Self {
        let mut timer = Timer {
            state: SpawnerState::Idle,
            rng,
        };
        if !definition.is_idle() {
            timer.rearm(&definition);
        }
        trace!(logger, "Initial state {:?}", timer.state);
        let counter = Arc::new(LiveCounter::new(definition.max_entities()));
        Self {
            definition,
            timer: Mutex::new(timer),
            counter,
            logger,
        }
    }

    fn timer(&self) -> MutexGuard<Timer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn counter(&self) -> &Arc<LiveCounter> {
        &self.counter
    }

    pub fn state(&self) -> SpawnerState {
        self.timer().state
    }

    /// Count down by `elapsed`.
    /// Returns true if the spawn point has to trigger.
    pub fn advance(&self, elapsed: Duration) -> bool {
        let mut timer = self.timer();
        match &mut timer.state {
            SpawnerState::Idle => false,
            SpawnerState::Waiting { remaining } => {
                *remaining = remaining.checked_sub(elapsed).unwrap_or_default();
                *remaining == Duration::default()
            }
        }
    }

    /// Consult the occupancy gate and spawn the definition's objects if it passes.
    /// Draws a new countdown in both cases.
    pub(crate) fn trigger<H: Host>(&self, host: &mut H, tracked: &TrackedIndex) -> TriggerOutcome {
        let definition = &*self.definition;
        let mut timer = self.timer();

        if self.counter.is_discarded() {
            return TriggerOutcome::Discarded;
        }
        if !occupancy::evaluate(definition, &*host) {
            debug!(self.logger, "Player region is not occupied, skipping");
            timer.rearm(definition);
            return TriggerOutcome::Unoccupied;
        }

        let _spawning = InFlight::enter(tracked);
        let mut summary = SpawnSummary::default();
        // the cap is shared by all tracked objects, earlier entries get the headroom first
        for object in definition.objects() {
            if self.counter.is_discarded() {
                debug!(self.logger, "Unloaded while spawning, stopping");
                break;
            }
            let count = object.spawn_count();
            let location = match host.random_point(definition.spawn_region(), &mut timer.rng) {
                Some(l) => l,
                None => {
                    warn!(
                        self.logger,
                        "Spawn region {:?} is empty, skipping {}",
                        definition.spawn_region(),
                        object.name()
                    );
                    summary.failed += count;
                    continue;
                }
            };

            if !object.is_tracked() {
                let res = object.materialize(&location, count, &mut *host, &self.logger);
                summary.untracked += res.created;
                summary.failed += res.failed;
                continue;
            }

            let reservation = self.counter.try_reserve(count);
            let granted = reservation.granted();
            summary.capped += count - granted;
            if granted == 0 {
                trace!(self.logger, "No headroom for {}", object.name());
                continue;
            }
            let res = object.materialize(&location, granted, &mut *host, &self.logger);
            summary.failed += res.failed;
            let registered = {
                let mut tracked = lock(tracked);
                let registered = tracked.register(res.handles, &self.counter);
                reservation.confirm(registered.len() as u32);
                registered
            };
            summary.tracked.extend(registered);
        }

        timer.rearm(definition);
        debug!(
            self.logger,
            "Spawned {} tracked {} untracked objects. Capped: {} Failed: {} Live: {}",
            summary.tracked.len(),
            summary.untracked,
            summary.capped,
            summary.failed,
            self.counter.live()
        );
        TriggerOutcome::Spawned(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TriggerFilter;
    use crate::model::{Actor, Location, RegionId};
    use crate::objects::{CreatureKind, ItemStack, SpawnableObject};
    use crate::sandbox::{Cuboid, Sandbox};
    use crate::utils::test_logger;
    use rand::SeedableRng;

    fn creatures(count: u32) -> SpawnableObject {
        SpawnableObject::Creature {
            kind: CreatureKind("skeleton".to_owned()),
            count,
        }
    }

    fn items() -> SpawnableObject {
        SpawnableObject::Item {
            stack: ItemStack {
                material: "arrow".to_owned(),
                amount: 16,
                name: None,
            },
        }
    }

    fn occupied_host() -> Sandbox {
        let mut host = Sandbox::default();
        host.add_region(
            RegionId(1),
            Cuboid::new(Location::new(0., 0., 0.), Location::new(4., 4., 4.)),
        );
        host.add_actor(Actor::new(Location::new(1., 1., 1.)));
        host
    }

    fn point(definition: SpawnPointDefinition) -> SpawnPoint {
        SpawnPoint::new(
            Arc::new(definition),
            SmallRng::seed_from_u64(42),
            test_logger(),
        )
    }

    fn definition() -> crate::definition::SpawnPointDefinitionBuilder {
        SpawnPointDefinition::builder()
            .with_spawn_region(RegionId(1))
            .with_player_region(RegionId(1))
            .with_delay(Duration::from_secs(1))
    }

    #[test]
    fn draws_stay_within_bounds() {
        let def = SpawnPointDefinition::builder()
            .with_spawn_region(RegionId(1))
            .with_player_region(RegionId(1))
            .with_min_delay(Duration::from_millis(1500))
            .with_max_delay(Duration::from_millis(4000))
            .build()
            .unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..1000 {
            let d = draw_delay(&def, &mut rng);
            assert!(def.min_delay() <= d && d <= def.max_delay(), "{:?}", d);
        }
    }

    #[test]
    fn zero_width_range_is_a_fixed_period() {
        let def = definition().build().unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(draw_delay(&def, &mut rng), Duration::from_secs(1));
        }
    }

    #[test]
    fn empty_definition_stays_idle() {
        let p = point(definition().build().unwrap());
        assert_eq!(p.state(), SpawnerState::Idle);
        assert!(!p.advance(Duration::from_secs(100)));
        assert_eq!(p.state(), SpawnerState::Idle);
    }

    #[test]
    fn advance_expires_at_zero() {
        let p = point(definition().with_object(creatures(1)).build().unwrap());
        assert!(!p.advance(Duration::from_millis(400)));
        assert_eq!(
            p.state(),
            SpawnerState::Waiting {
                remaining: Duration::from_millis(600)
            }
        );
        assert!(p.advance(Duration::from_millis(600)));
    }

    #[test]
    fn unoccupied_trigger_rearms_without_spawning() {
        let mut host = occupied_host();
        host.clear_actors();
        let tracked = TrackedIndex::default();
        let p = point(definition().with_object(creatures(1)).build().unwrap());
        assert!(p.advance(Duration::from_secs(1)));

        let outcome = p.trigger(&mut host, &tracked);

        assert_eq!(outcome, TriggerOutcome::Unoccupied);
        assert_eq!(host.objects().count(), 0);
        assert_eq!(
            p.state(),
            SpawnerState::Waiting {
                remaining: Duration::from_secs(1)
            }
        );
    }

    #[test]
    fn trigger_is_capped_for_tracked_objects() {
        let mut host = occupied_host();
        let tracked = TrackedIndex::default();
        let p = point(
            definition()
                .with_max_entities(2)
                .with_object(creatures(5))
                .build()
                .unwrap(),
        );

        let summary = match p.trigger(&mut host, &tracked) {
            TriggerOutcome::Spawned(s) => s,
            o => panic!("unexpected outcome {:?}", o),
        };
        assert_eq!(summary.tracked.len(), 2);
        assert_eq!(summary.capped, 3);
        assert_eq!(p.counter().live(), 2);
        assert_eq!(tracked.lock().unwrap().handles().count(), 2);

        let summary = match p.trigger(&mut host, &tracked) {
            TriggerOutcome::Spawned(s) => s,
            o => panic!("unexpected outcome {:?}", o),
        };
        assert!(summary.tracked.is_empty());
        assert_eq!(summary.capped, 5);
        assert_eq!(p.counter().live(), 2);
        assert_eq!(host.objects().count(), 2);
    }

    #[test]
    fn untracked_objects_ignore_the_cap() {
        let mut host = occupied_host();
        let tracked = TrackedIndex::default();
        let p = point(
            definition()
                .with_max_entities(0)
                .with_object(creatures(3))
                .with_object(items())
                .build()
                .unwrap(),
        );

        for _ in 0..3 {
            match p.trigger(&mut host, &tracked) {
                TriggerOutcome::Spawned(s) => {
                    assert_eq!(s.untracked, 1);
                    assert_eq!(s.capped, 3);
                    assert!(s.tracked.is_empty());
                }
                o => panic!("unexpected outcome {:?}", o),
            }
        }
        assert_eq!(host.objects().count(), 3);
        assert_eq!(p.counter().live(), 0);
    }

    #[test]
    fn shared_cap_goes_to_earlier_entries_first() {
        let mut host = occupied_host();
        let tracked = TrackedIndex::default();
        let explosives = SpawnableObject::Explosive {
            power: 2.,
            fuse_ticks: 40,
            count: 2,
        };
        let p = point(
            definition()
                .with_max_entities(3)
                .with_object(creatures(2))
                .with_object(explosives)
                .build()
                .unwrap(),
        );

        match p.trigger(&mut host, &tracked) {
            TriggerOutcome::Spawned(s) => {
                assert_eq!(s.tracked.len(), 3);
                assert_eq!(s.capped, 1);
            }
            o => panic!("unexpected outcome {:?}", o),
        }
        assert_eq!(host.count_kind("creature"), 2);
        assert_eq!(host.count_kind("explosive"), 1);
    }

    #[test]
    fn failed_instances_are_not_counted() {
        let mut host = occupied_host();
        host.reject_next(1);
        let tracked = TrackedIndex::default();
        let p = point(
            definition()
                .with_max_entities(4)
                .with_object(creatures(3))
                .build()
                .unwrap(),
        );

        match p.trigger(&mut host, &tracked) {
            TriggerOutcome::Spawned(s) => {
                assert_eq!(s.failed, 1);
                assert_eq!(s.tracked.len(), 2);
            }
            o => panic!("unexpected outcome {:?}", o),
        }
        assert_eq!(p.counter().live(), 2);
        assert_eq!(p.counter().headroom(), 2);
    }

    #[test]
    fn empty_spawn_region_skips_the_entry() {
        let mut host = occupied_host();
        let tracked = TrackedIndex::default();
        let p = point(
            SpawnPointDefinition::builder()
                .with_spawn_region(RegionId(99))
                .with_player_region(RegionId(1))
                .with_filter(TriggerFilter::Allow)
                .with_object(creatures(2))
                .build()
                .unwrap(),
        );

        match p.trigger(&mut host, &tracked) {
            TriggerOutcome::Spawned(s) => {
                assert_eq!(s.failed, 2);
                assert!(s.tracked.is_empty());
            }
            o => panic!("unexpected outcome {:?}", o),
        }
        assert_eq!(p.counter().live(), 0);
    }
}

//! In-memory host, used by the demo worker, the benchmarks and the tests.
//!
use crate::model::{Actor, FilterId, Location, ObjectHandle, RegionId};
use crate::objects::{CreatureKind, EffectDescriptor, ItemStack};
use crate::world::{Filters, MatchState, Regions, SpawnRejected, SpawnWorld};
use rand::{Rng, RngCore};
use serde_derive::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Axis aligned box region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cuboid {
    pub min: Location,
    pub max: Location,
}

impl Cuboid {
    pub fn new(min: Location, max: Location) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, at: &Location) -> bool {
        self.min.x <= at.x
            && at.x <= self.max.x
            && self.min.y <= at.y
            && at.y <= self.max.y
            && self.min.z <= at.z
            && at.z <= self.max.z
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnedObject {
    Creature(CreatureKind),
    ItemStack(ItemStack),
    Explosive { power: f32, fuse_ticks: u32 },
    ThrownEffect(EffectDescriptor),
}

impl SpawnedObject {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SpawnedObject::Creature(_) => "creature",
            SpawnedObject::ItemStack(_) => "item",
            SpawnedObject::Explosive { .. } => "explosive",
            SpawnedObject::ThrownEffect(_) => "thrown effect",
        }
    }
}

type FilterFn = Box<dyn Fn(&Actor) -> bool + Send + Sync>;

#[derive(Default)]
pub struct Sandbox {
    actors: Vec<Actor>,
    regions: HashMap<RegionId, Cuboid>,
    filters: HashMap<FilterId, FilterFn>,
    objects: BTreeMap<ObjectHandle, (Location, SpawnedObject)>,
    next_handle: u64,
    rejections: u32,
}

impl fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sandbox")
            .field("actors", &self.actors)
            .field("regions", &self.regions)
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("objects", &self.objects)
            .field("rejections", &self.rejections)
            .finish()
    }
}

impl Sandbox {
    pub fn add_region(&mut self, id: RegionId, region: Cuboid) -> &mut Self {
        self.regions.insert(id, region);
        self
    }

    pub fn add_filter<F>(&mut self, id: FilterId, filter: F) -> &mut Self
    where
        F: Fn(&Actor) -> bool + Send + Sync + 'static,
    {
        self.filters.insert(id, Box::new(filter));
        self
    }

    pub fn add_actor(&mut self, actor: Actor) -> &mut Self {
        self.actors.push(actor);
        self
    }

    pub fn clear_actors(&mut self) {
        self.actors.clear();
    }

    /// The next `n` spawn calls fail
    pub fn reject_next(&mut self, n: u32) {
        self.rejections = n;
    }

    /// Remove an object from the world.
    /// Returns the removed object, if it existed.
    pub fn remove(&mut self, handle: ObjectHandle) -> Option<SpawnedObject> {
        self.objects.remove(&handle).map(|(_, o)| o)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectHandle, &SpawnedObject)> {
        self.objects.iter().map(|(id, (_, o))| (*id, o))
    }

    pub fn location_of(&self, handle: ObjectHandle) -> Option<Location> {
        self.objects.get(&handle).map(|(l, _)| *l)
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.objects
            .values()
            .filter(|(_, o)| o.kind_name() == kind)
            .count()
    }

    fn insert(
        &mut self,
        at: &Location,
        object: SpawnedObject,
    ) -> Result<ObjectHandle, SpawnRejected> {
        if self.rejections > 0 {
            self.rejections -= 1;
            return Err(SpawnRejected::Refused(format!(
                "{} rejected by the sandbox",
                object.kind_name()
            )));
        }
        if !(at.x.is_finite() && at.y.is_finite() && at.z.is_finite()) {
            return Err(SpawnRejected::InvalidLocation(*at));
        }
        let handle = ObjectHandle(self.next_handle);
        self.next_handle += 1;
        self.objects.insert(handle, (*at, object));
        Ok(handle)
    }
}

impl SpawnWorld for Sandbox {
    fn spawn_creature(
        &mut self,
        at: &Location,
        kind: &CreatureKind,
    ) -> Result<ObjectHandle, SpawnRejected> {
        self.insert(at, SpawnedObject::Creature(kind.clone()))
    }

    fn spawn_item_stack(
        &mut self,
        at: &Location,
        stack: &ItemStack,
    ) -> Result<ObjectHandle, SpawnRejected> {
        self.insert(at, SpawnedObject::ItemStack(stack.clone()))
    }

    fn spawn_explosive(
        &mut self,
        at: &Location,
        power: f32,
        fuse_ticks: u32,
    ) -> Result<ObjectHandle, SpawnRejected> {
        self.insert(at, SpawnedObject::Explosive { power, fuse_ticks })
    }

    fn spawn_thrown_effect(
        &mut self,
        at: &Location,
        effect: &EffectDescriptor,
    ) -> Result<ObjectHandle, SpawnRejected> {
        self.insert(at, SpawnedObject::ThrownEffect(effect.clone()))
    }
}

impl Regions for Sandbox {
    fn contains(&self, region: RegionId, at: &Location) -> bool {
        self.regions
            .get(&region)
            .map(|r| r.contains(at))
            .unwrap_or(false)
    }

    fn random_point(&self, region: RegionId, rng: &mut dyn RngCore) -> Option<Location> {
        let region = self.regions.get(&region).filter(|r| !r.is_empty())?;
        let mut axis = |min: f64, max: f64| {
            if min < max {
                rng.gen_range(min, max)
            } else {
                min
            }
        };
        let x = axis(region.min.x, region.max.x);
        let y = axis(region.min.y, region.max.y);
        let z = axis(region.min.z, region.max.z);
        Some(Location { x, y, z })
    }
}

impl Filters for Sandbox {
    fn accepts(&self, filter: FilterId, actor: &Actor) -> bool {
        self.filters
            .get(&filter)
            .map(|f| f(actor))
            .unwrap_or(false)
    }
}

impl MatchState for Sandbox {
    fn actors(&self) -> &[Actor] {
        &self.actors
    }
}

//! Interfaces of the host the engine runs inside of.
//!
//! The engine never owns the world, it only asks the host to place objects, to test region
//! membership and to evaluate filters.
//!
use crate::model::{Actor, FilterId, Location, ObjectHandle, RegionId};
use crate::objects::{CreatureKind, EffectDescriptor, ItemStack};
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SpawnRejected {
    #[error("Can not place an object at {0:?}")]
    InvalidLocation(Location),
    #[error("The world refused to create the object: {0}")]
    Refused(String),
}

/// World mutation primitives, one call per instance
pub trait SpawnWorld {
    fn spawn_creature(
        &mut self,
        at: &Location,
        kind: &CreatureKind,
    ) -> Result<ObjectHandle, SpawnRejected>;

    fn spawn_item_stack(
        &mut self,
        at: &Location,
        stack: &ItemStack,
    ) -> Result<ObjectHandle, SpawnRejected>;

    fn spawn_explosive(
        &mut self,
        at: &Location,
        power: f32,
        fuse_ticks: u32,
    ) -> Result<ObjectHandle, SpawnRejected>;

    fn spawn_thrown_effect(
        &mut self,
        at: &Location,
        effect: &EffectDescriptor,
    ) -> Result<ObjectHandle, SpawnRejected>;
}

pub trait Regions {
    fn contains(&self, region: RegionId, at: &Location) -> bool;

    /// Pick a random point inside `region`.
    /// Returns None if the region has no points.
    fn random_point(&self, region: RegionId, rng: &mut dyn RngCore) -> Option<Location>;
}

pub trait Filters {
    fn accepts(&self, filter: FilterId, actor: &Actor) -> bool;
}

pub trait MatchState {
    /// Actors currently recognized by the match
    fn actors(&self) -> &[Actor];
}

/// Everything a tick needs from the host
pub trait Host: SpawnWorld + Regions + Filters + MatchState {}

impl<T> Host for T where T: SpawnWorld + Regions + Filters + MatchState {}

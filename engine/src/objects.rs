//! Descriptions of the things a spawner creates.
//!
use crate::model::{Location, ObjectHandle};
use crate::world::SpawnWorld;
use serde_derive::{Deserialize, Serialize};
use slog::{trace, warn, Logger};
use std::time::Duration;

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureKind(pub String);

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStack {
    pub material: String,
    pub amount: u32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectDescriptor {
    pub effect: String,
    pub duration: Duration,
    pub amplifier: u8,
}

/// What a spawner creates on every trigger.
///
/// Tracked variants count against the owning spawner's `max_entities` until the host reports
/// their removal. Untracked variants are forgotten as soon as they are placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpawnableObject {
    Creature { kind: CreatureKind, count: u32 },
    /// A single stack per trigger
    Item { stack: ItemStack },
    Explosive { power: f32, fuse_ticks: u32, count: u32 },
    ThrownEffect { effect: EffectDescriptor, count: u32 },
}

/// Result of materializing a batch of instances
#[derive(Debug, Clone, Default)]
pub struct Materialized {
    /// Handles of the created instances, empty for untracked variants
    pub handles: Vec<ObjectHandle>,
    pub created: u32,
    pub failed: u32,
}

impl SpawnableObject {
    pub fn is_tracked(&self) -> bool {
        match self {
            SpawnableObject::Creature { .. } | SpawnableObject::Explosive { .. } => true,
            SpawnableObject::Item { .. } | SpawnableObject::ThrownEffect { .. } => false,
        }
    }

    /// Number of instances created per trigger
    pub fn spawn_count(&self) -> u32 {
        match self {
            SpawnableObject::Creature { count, .. }
            | SpawnableObject::Explosive { count, .. }
            | SpawnableObject::ThrownEffect { count, .. } => *count,
            SpawnableObject::Item { .. } => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpawnableObject::Creature { .. } => "creature",
            SpawnableObject::Item { .. } => "item",
            SpawnableObject::Explosive { .. } => "explosive",
            SpawnableObject::ThrownEffect { .. } => "thrown effect",
        }
    }

    /// Create `count` instances at `at`.
    ///
    /// The caller decides `count`; cap and occupancy checks happen before this is called.
    /// A rejected instance does not abort the rest of the batch.
    pub fn materialize(
        &self,
        at: &Location,
        count: u32,
        world: &mut dyn SpawnWorld,
        logger: &Logger,
    ) -> Materialized {
        let tracked = self.is_tracked();
        let mut result = Materialized::default();
        for _ in 0..count {
            let spawned = match self {
                SpawnableObject::Creature { kind, .. } => world.spawn_creature(at, kind),
                SpawnableObject::Item { stack } => world.spawn_item_stack(at, stack),
                SpawnableObject::Explosive {
                    power, fuse_ticks, ..
                } => world.spawn_explosive(at, *power, *fuse_ticks),
                SpawnableObject::ThrownEffect { effect, .. } => {
                    world.spawn_thrown_effect(at, effect)
                }
            };
            match spawned {
                Ok(handle) => {
                    trace!(logger, "Spawned {} {:?} at {:?}", self.name(), handle, at);
                    result.created += 1;
                    if tracked {
                        result.handles.push(handle);
                    }
                }
                Err(err) => {
                    warn!(logger, "Failed to spawn {}: {}", self.name(), err);
                    result.failed += 1;
                }
            }
        }
        result
    }
}

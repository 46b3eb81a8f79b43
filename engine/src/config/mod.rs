//! Declarative spawner documents.
//!
//! ```json
//! {
//!     "spawners": [{
//!         "id": "mid-zombies",
//!         "spawn-region": 1,
//!         "player-region": 2,
//!         "min-delay": "5s",
//!         "max-delay": "10s",
//!         "max-entities": 4,
//!         "objects": [
//!             { "type": "entity", "kind": "zombie", "count": 2 },
//!             { "type": "tnt", "power": 3.0, "fuse": "2s" }
//!         ]
//!     }]
//! }
//! ```
//!
mod duration;

pub use duration::*;

use crate::definition::{DefinitionError, SpawnPointDefinition, TriggerFilter};
use crate::model::RegionId;
use crate::objects::{CreatureKind, EffectDescriptor, ItemStack, SpawnableObject};
use serde_derive::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_FUSE: Duration = Duration::from_secs(4);
pub const DEFAULT_EFFECT_DURATION: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse spawner document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid duration in attribute '{attribute}': {source}")]
    Duration {
        attribute: &'static str,
        source: DurationParseError,
    },
    #[error("Spawner #{index} ({id:?}) is invalid: {source}")]
    Definition {
        index: usize,
        id: Option<String>,
        source: DefinitionError,
    },
    #[error("Spawner id '{0}' is used more than once")]
    DuplicateId(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpawnersDocument {
    #[serde(default)]
    pub spawners: Vec<SpawnerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SpawnerConfig {
    pub id: Option<String>,
    pub spawn_region: Option<RegionId>,
    pub player_region: Option<RegionId>,
    pub delay: Option<String>,
    pub min_delay: Option<String>,
    pub max_delay: Option<String>,
    pub max_entities: Option<u32>,
    pub filter: Option<TriggerFilter>,
    #[serde(default)]
    pub objects: Vec<ObjectConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ObjectConfig {
    Entity {
        kind: String,
        count: Option<u32>,
    },
    Item {
        material: String,
        amount: Option<u32>,
        name: Option<String>,
    },
    Tnt {
        power: f32,
        fuse: Option<String>,
        count: Option<u32>,
    },
    Effect {
        effect: String,
        duration: Option<String>,
        amplifier: Option<u8>,
        count: Option<u32>,
    },
}

fn duration_attr(
    attribute: &'static str,
    value: Option<&String>,
) -> Result<Option<Duration>, ConfigError> {
    value
        .map(|v| parse_duration(v).map_err(|source| ConfigError::Duration { attribute, source }))
        .transpose()
}

impl ObjectConfig {
    pub fn to_spawnable(&self) -> Result<SpawnableObject, ConfigError> {
        let object = match self {
            ObjectConfig::Entity { kind, count } => SpawnableObject::Creature {
                kind: CreatureKind(kind.clone()),
                count: count.unwrap_or(1),
            },
            ObjectConfig::Item {
                material,
                amount,
                name,
            } => SpawnableObject::Item {
                stack: ItemStack {
                    material: material.clone(),
                    amount: amount.unwrap_or(1),
                    name: name.clone(),
                },
            },
            ObjectConfig::Tnt { power, fuse, count } => {
                let fuse = duration_attr("fuse", fuse.as_ref())?.unwrap_or(DEFAULT_FUSE);
                let fuse_ticks = to_ticks(fuse).map_err(|source| ConfigError::Duration {
                    attribute: "fuse",
                    source,
                })?;
                SpawnableObject::Explosive {
                    power: *power,
                    fuse_ticks,
                    count: count.unwrap_or(1),
                }
            }
            ObjectConfig::Effect {
                effect,
                duration,
                amplifier,
                count,
            } => SpawnableObject::ThrownEffect {
                effect: EffectDescriptor {
                    effect: effect.clone(),
                    duration: duration_attr("duration", duration.as_ref())?
                        .unwrap_or(DEFAULT_EFFECT_DURATION),
                    amplifier: amplifier.unwrap_or(0),
                },
                count: count.unwrap_or(1),
            },
        };
        Ok(object)
    }
}

impl SpawnerConfig {
    pub fn to_definition(&self, index: usize) -> Result<SpawnPointDefinition, ConfigError> {
        let mut builder = SpawnPointDefinition::builder();
        if let Some(ref id) = self.id {
            builder = builder.with_id(id.as_str());
        }
        if let Some(region) = self.spawn_region {
            builder = builder.with_spawn_region(region);
        }
        if let Some(region) = self.player_region {
            builder = builder.with_player_region(region);
        }
        if let Some(delay) = duration_attr("delay", self.delay.as_ref())? {
            builder = builder.with_delay(delay);
        }
        if let Some(delay) = duration_attr("min-delay", self.min_delay.as_ref())? {
            builder = builder.with_min_delay(delay);
        }
        if let Some(delay) = duration_attr("max-delay", self.max_delay.as_ref())? {
            builder = builder.with_max_delay(delay);
        }
        if let Some(max) = self.max_entities {
            builder = builder.with_max_entities(max);
        }
        if let Some(filter) = self.filter {
            builder = builder.with_filter(filter);
        }
        let objects = self
            .objects
            .iter()
            .map(ObjectConfig::to_spawnable)
            .collect::<Result<Vec<_>, _>>()?;
        builder.with_objects(objects).build().map_err(|source| ConfigError::Definition {
            index,
            id: self.id.clone(),
            source,
        })
    }
}

impl SpawnersDocument {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let doc = serde_json::from_str(json)?;
        Ok(doc)
    }

    /// Validate every spawner, in document order
    pub fn to_definitions(&self) -> Result<Vec<SpawnPointDefinition>, ConfigError> {
        let mut ids = HashSet::with_capacity(self.spawners.len());
        self.spawners
            .iter()
            .enumerate()
            .map(|(i, spawner)| {
                if let Some(ref id) = spawner.id {
                    if !ids.insert(id.as_str()) {
                        return Err(ConfigError::DuplicateId(id.clone()));
                    }
                }
                spawner.to_definition(i)
            })
            .collect()
    }
}

use crate::model::{Actor, FilterId, RegionId};
use crate::objects::SpawnableObject;
use crate::world::Filters;
use serde_derive::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);
/// Sentinel for spawners without an entity cap
pub const UNBOUNDED_ENTITIES: u32 = u32::MAX;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
    #[error("Attribute 'min-delay' and 'max-delay' cannot be combined with 'delay'")]
    DelayConflict,
    #[error("Max delay cannot be smaller than min delay. Min: {min:?} Max: {max:?}")]
    InvertedDelay { min: Duration, max: Duration },
    #[error("Missing required region property '{0}'")]
    MissingRegion(&'static str),
}

/// Decides which actors may trigger a spawner
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerFilter {
    Allow,
    Deny,
    Custom(FilterId),
}

impl Default for TriggerFilter {
    fn default() -> Self {
        TriggerFilter::Allow
    }
}

impl TriggerFilter {
    pub fn query<F: Filters + ?Sized>(&self, filters: &F, actor: &Actor) -> bool {
        match self {
            TriggerFilter::Allow => true,
            TriggerFilter::Deny => false,
            TriggerFilter::Custom(id) => filters.accepts(*id, actor),
        }
    }
}

/// Immutable configuration of a single spawn point.
///
/// Only [SpawnPointDefinitionBuilder](struct.SpawnPointDefinitionBuilder.html) creates these, so
/// every instance satisfies `min_delay <= max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPointDefinition {
    id: Option<String>,
    spawn_region: RegionId,
    player_region: RegionId,
    min_delay: Duration,
    max_delay: Duration,
    max_entities: u32,
    filter: TriggerFilter,
    objects: Vec<SpawnableObject>,
}

impl SpawnPointDefinition {
    pub fn builder() -> SpawnPointDefinitionBuilder {
        SpawnPointDefinitionBuilder::default()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Where objects appear
    pub fn spawn_region(&self) -> RegionId {
        self.spawn_region
    }

    /// Where occupancy is checked
    pub fn player_region(&self) -> RegionId {
        self.player_region
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn max_entities(&self) -> u32 {
        self.max_entities
    }

    pub fn filter(&self) -> TriggerFilter {
        self.filter
    }

    /// Objects in spawn order
    pub fn objects(&self) -> &[SpawnableObject] {
        &self.objects
    }

    pub fn is_idle(&self) -> bool {
        self.objects.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpawnPointDefinitionBuilder {
    id: Option<String>,
    spawn_region: Option<RegionId>,
    player_region: Option<RegionId>,
    delay: Option<Duration>,
    min_delay: Option<Duration>,
    max_delay: Option<Duration>,
    max_entities: Option<u32>,
    filter: Option<TriggerFilter>,
    objects: Vec<SpawnableObject>,
}

impl SpawnPointDefinitionBuilder {
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_spawn_region(mut self, region: RegionId) -> Self {
        self.spawn_region = Some(region);
        self
    }

    pub fn with_player_region(mut self, region: RegionId) -> Self {
        self.player_region = Some(region);
        self
    }

    /// Fixed delay between triggers. Excludes `min_delay` and `max_delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = Some(delay);
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    pub fn with_max_entities(mut self, max_entities: u32) -> Self {
        self.max_entities = Some(max_entities);
        self
    }

    pub fn with_filter(mut self, filter: TriggerFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_object(mut self, object: SpawnableObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_objects<I: IntoIterator<Item = SpawnableObject>>(mut self, objects: I) -> Self {
        self.objects.extend(objects);
        self
    }

    pub fn build(self) -> Result<SpawnPointDefinition, DefinitionError> {
        if self.delay.is_some() && (self.min_delay.is_some() || self.max_delay.is_some()) {
            return Err(DefinitionError::DelayConflict);
        }
        let spawn_region = self
            .spawn_region
            .ok_or(DefinitionError::MissingRegion("spawn-region"))?;
        let player_region = self
            .player_region
            .ok_or(DefinitionError::MissingRegion("player-region"))?;

        let delay = self.delay.unwrap_or(DEFAULT_DELAY);
        let min_delay = self.min_delay.unwrap_or(delay);
        let max_delay = self.max_delay.unwrap_or(delay);
        if max_delay < min_delay {
            return Err(DefinitionError::InvertedDelay {
                min: min_delay,
                max: max_delay,
            });
        }

        Ok(SpawnPointDefinition {
            id: self.id,
            spawn_region,
            player_region,
            min_delay,
            max_delay,
            max_entities: self.max_entities.unwrap_or(UNBOUNDED_ENTITIES),
            filter: self.filter.unwrap_or_default(),
            objects: self.objects,
        })
    }
}

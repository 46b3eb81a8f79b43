pub use crate::config::{SpawnerConfig, SpawnersDocument};
pub use crate::definition::{SpawnPointDefinition, TriggerFilter};
pub use crate::engine::{EngineError, SpawnEngine, TickReport};
pub use crate::model::*;
pub use crate::objects::{CreatureKind, EffectDescriptor, ItemStack, SpawnableObject};
pub use crate::systems::scheduler::{SpawnSummary, SpawnerState, TriggerOutcome};
pub use crate::world::{Filters, Host, MatchState, Regions, SpawnRejected, SpawnWorld};

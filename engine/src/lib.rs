pub mod config;
pub mod definition;
pub mod engine;
pub mod model;
pub mod objects;
pub mod prelude;
pub mod sandbox;
pub mod world;

mod systems;
mod utils;

pub use engine::{EngineError, SpawnEngine, TickReport};
pub use systems::accounting::{LiveCounter, Reservation};
pub use systems::occupancy;
pub use systems::scheduler::{SpawnSummary, SpawnerState, TriggerOutcome};

use serde_derive::{Deserialize, Serialize};

/// Subsystems the spawners have to be initialized after, if the host has them at all
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Subsystem {
    Regions,
    Filters,
}

/// Weak initialization-order constraint of the spawner subsystem.
/// Hosts that load their subsystems in order should schedule these before calling
/// [SpawnEngine::load](engine/struct.SpawnEngine.html#method.load).
pub const LOAD_AFTER: [Subsystem; 2] = [Subsystem::Regions, Subsystem::Filters];

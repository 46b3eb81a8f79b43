use anyhow::Context;
use serde_derive::Deserialize;
use slog::{debug, info, Logger};
use spawner_engine::prelude::*;
use spawner_engine::sandbox::{Cuboid, Sandbox};
use std::fs;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegionConfig {
    pub id: RegionId,
    pub min: Location,
    pub max: Location,
}

/// Demo world: the sandbox layout plus the spawners that run in it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorldDocument {
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub actors: Vec<Location>,
    #[serde(flatten)]
    pub spawners: SpawnersDocument,
}

pub fn read_world(logger: &Logger, path: &str) -> anyhow::Result<WorldDocument> {
    debug!(logger, "Reading world document {}", path);
    let payload = fs::read_to_string(path)
        .with_context(|| format!("Failed to read world document {}", path))?;
    let doc = serde_json::from_str(&payload)
        .with_context(|| format!("Failed to parse world document {}", path))?;
    Ok(doc)
}

pub fn init_sandbox(logger: &Logger, doc: &WorldDocument) -> Sandbox {
    let mut sandbox = Sandbox::default();
    for region in doc.regions.iter() {
        sandbox.add_region(region.id, Cuboid::new(region.min, region.max));
    }
    for location in doc.actors.iter() {
        sandbox.add_actor(Actor::new(*location));
    }
    info!(
        logger,
        "Sandbox has {} regions and {} actors",
        doc.regions.len(),
        doc.actors.len()
    );
    sandbox
}

pub fn load_spawners(
    logger: &Logger,
    engine: &SpawnEngine,
    doc: &WorldDocument,
) -> anyhow::Result<EngineHandle> {
    let definitions = doc
        .spawners
        .to_definitions()
        .with_context(|| "Invalid spawner configuration")?;
    debug!(logger, "Validated {} spawners", definitions.len());
    Ok(engine.load(definitions))
}

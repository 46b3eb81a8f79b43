use serde_derive::Serialize;
use std::env;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
    pub world_path: String,
    pub target_tick_freq_ms: u64,
    /// Stop after this many ticks, run forever if None
    pub n_ticks: Option<u64>,
    pub seed: Option<u64>,
    /// Chance of a tracked object being removed in a tick
    pub removal_chance: f64,
}

impl WorkerConfig {
    pub fn load() -> Self {
        let world_path =
            env::var("SPAWNER_CONFIG").unwrap_or_else(|_| "worker/spawners.json".to_owned());
        let target_tick_freq_ms = env::var("SPAWNER_TICK_MS")
            .ok()
            .and_then(|x| x.parse().ok())
            .unwrap_or(50);
        let n_ticks = env::var("SPAWNER_TICKS")
            .ok()
            .and_then(|x| x.parse().ok())
            .or(Some(200));
        let seed = env::var("SPAWNER_SEED").ok().and_then(|x| x.parse().ok());
        let removal_chance = env::var("SPAWNER_REMOVAL_CHANCE")
            .ok()
            .and_then(|x| x.parse().ok())
            .filter(|p: &f64| (0.0..=1.0).contains(p))
            .unwrap_or(0.05);

        Self {
            world_path,
            target_tick_freq_ms,
            n_ticks: n_ticks.filter(|n| *n > 0),
            seed,
            removal_chance,
        }
    }
}

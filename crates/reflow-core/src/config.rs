//! Engine tuning knobs.

use serde::{Deserialize, Serialize};

/// Per-engine settings. Every field has a default, so a partial TOML table
/// deserializes cleanly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Give undefined `"number"` inputs a value when a computation is registered,
    /// so the computation can run on its first trigger.
    pub seed_inputs: bool,
    /// The value used for seeding.
    pub seed_value: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            seed_inputs: true,
            seed_value: 0.0,
        }
    }
}

impl EngineConfig {
    /// The seed to apply, if seeding is enabled.
    pub fn seed(&self) -> Option<f64> {
        self.seed_inputs.then_some(self.seed_value)
    }
}

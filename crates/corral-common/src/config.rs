//! Configuration model for scenario drivers.

use serde::{Deserialize, Serialize};

/// Parameters for a multi-thread scheduling scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Number of containers to populate.
    pub containers: u64,
    /// Number of member threads per container.
    pub threads_per_container: u64,
    /// Number of rotation calls to issue while members drain.
    pub rotations: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            containers: 4,
            threads_per_container: 8,
            rotations: 64,
        }
    }
}

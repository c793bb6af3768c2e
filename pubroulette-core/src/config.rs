//! Selection tunables, deserializable from the server configuration file.

use serde::{Deserialize, Serialize};

/// Default venue categories queried on every selection.
pub const DEFAULT_CATEGORIES: [&str; 2] = ["pub", "bar"];
/// Default bound on build attempts per selection.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
/// Default name of the exclusion set.
pub const DEFAULT_EXCLUSION_SET: &str = "blacklist";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Configuration of the roulette service.
pub struct RouletteConfig {
    /// Categories fetched from the geodata backend, in merge order.
    pub categories: Vec<String>,
    /// Upper bound on candidates tried per selection.
    pub max_attempts: usize,
    /// Name of the set exclusions are recorded in.
    pub exclusion_set: String,
}

impl Default for RouletteConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.map(str::to_owned).to_vec(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            exclusion_set: DEFAULT_EXCLUSION_SET.to_owned(),
        }
    }
}

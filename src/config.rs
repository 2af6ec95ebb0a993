//! Analysis tunables.
//!
//! Stored as a JSON object on disk; every key is optional:
//! ```json
//! {
//!   "speed_limit_kmh": 50.0,
//!   "punctuality": { "window_hours": 0.1, "stop_radius_km": 1.0 }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::punctuality::PunctualityRules;
use crate::analysis::speed::DEFAULT_SPEED_LIMIT_KMH;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub speed_limit_kmh: f64,
    pub punctuality: PunctualityRules,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            speed_limit_kmh: DEFAULT_SPEED_LIMIT_KMH,
            punctuality: PunctualityRules::default(),
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("Invalid config '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads `path` when given, otherwise falls back to the defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}

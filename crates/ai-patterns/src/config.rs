//! Designer-facing tuning for registered patterns, loaded from YAML.
//!
//! ```yaml
//! archetypes:
//!   brute:
//!     ground_slam: { priority: 9, cooldown_ms: 4000 }
//!     charge: { cooldown_ms: 2500 }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{PatternError, Result};

/// Overrides for one pattern. Absent fields keep the registered value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<u64>,
}

impl PatternOverride {
    pub fn cooldown(&self) -> Option<Duration> {
        self.cooldown_ms.map(Duration::from_millis)
    }
}

/// Archetype name, then pattern name, then overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternTuning {
    pub archetypes: BTreeMap<String, BTreeMap<String, PatternOverride>>,
}

impl PatternTuning {
    /// Load tuning from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PatternError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| PatternError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.values().all(BTreeMap::is_empty)
    }
}

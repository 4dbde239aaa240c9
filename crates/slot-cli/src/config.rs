//! CLI configuration: defaults, then a YAML file, then `SLOTS_*` environment
//! variables.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use slot_engine::EngineConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// JSON file holding every window and booking between invocations.
    pub state_file: PathBuf,
    pub engine: EngineConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("slots-state.json"),
            engine: EngineConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load and validate the configuration. A missing YAML file is not an error.
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(path).extract()?;
        config
            .engine
            .validate()
            .map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(CliConfig::default()))
            .merge(Yaml::file(path))
            // e.g. SLOTS_ENGINE__TIMEZONE=Europe/Berlin
            .merge(Env::prefixed("SLOTS_").split("__"))
    }
}

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use directories::UserDirs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_TARGET_CURRENCY};
use crate::errors::ConfigError;
use crate::sources::{SourceDescriptor, SourceRegistry};

/// On-disk configuration, `~/.llm-balance/config.toml`. Everything is
/// optional; a missing file means registry defaults all the way down.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub currency: String,
    pub sources: BTreeMap<String, SourceOverride>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOverride {
    pub enabled: Option<bool>,
    pub api_url: Option<String>,
    pub env_var: Option<String>,
    pub params: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: DEFAULT_TARGET_CURRENCY.to_string(),
            sources: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        UserDirs::new().map(|dirs| {
            dirs.home_dir()
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME)
        })
    }

    /// Loads the config from `path`, or from the default location when
    /// `path` is `None`. A file that does not exist yet yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => {
                debug!("No home directory resolved, using built-in defaults");
                return Ok(AppConfig::default());
            }
        };
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        let raw = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&raw)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// Produces the effective descriptor set: registry defaults with this
    /// config's per-source overrides folded in, sorted by source id.
    pub fn descriptors(&self, registry: &SourceRegistry) -> Vec<SourceDescriptor> {
        let mut descriptors: Vec<SourceDescriptor> = registry
            .list()
            .into_iter()
            .filter_map(|id| registry.resolve(id).ok())
            .map(|entry| {
                let mut descriptor = entry.defaults.clone();
                if let Some(overrides) = self.sources.get(&descriptor.id) {
                    if let Some(enabled) = overrides.enabled {
                        descriptor.enabled = enabled;
                    }
                    if let Some(api_url) = &overrides.api_url {
                        descriptor.api_url = api_url.clone();
                    }
                    if let Some(env_var) = &overrides.env_var {
                        descriptor.env_var = Some(env_var.clone());
                    }
                    for (key, value) in &overrides.params {
                        descriptor.params.insert(key.clone(), value.clone());
                    }
                }
                descriptor
            })
            .collect();
        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        descriptors
    }

    /// Flips a source on or off, recording an override even when the
    /// registry default already matches.
    pub fn set_enabled(&mut self, source_id: &str, enabled: bool) {
        self.sources.entry(source_id.to_string()).or_default().enabled = Some(enabled);
    }
}

//! Application config: `config.toml` in the user config dir, or an explicit path.

use crate::error::ConfigError;
use directories::ProjectDirs;
use reflow_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

/// Everything the composition root needs. Missing keys take defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default `tracing` filter; `RUST_LOG` overrides it.
    pub log_filter: String,
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_filter: "reflow=info".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Read and parse one config file, refusing oversized files.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let size = std::fs::metadata(path)?.len();
    if size > MAX_CONFIG_FILE_BYTES {
        return Err(ConfigError::TooLarge {
            size,
            max: MAX_CONFIG_FILE_BYTES,
        });
    }
    parse_config(&std::fs::read_to_string(path)?)
}

/// Load config from `explicit` or the user config dir.
///
/// Never fails: problems come back as warnings alongside the defaults.
/// A missing user config is silent; a missing explicit file is not.
pub fn load_config(explicit: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings = Vec::new();
    let path = explicit.map(Path::to_path_buf).or_else(user_config_path);

    let Some(path) = path else {
        return (Config::default(), warnings);
    };
    if !path.exists() {
        if explicit.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    match read_config(&path) {
        Ok(config) => (config, warnings),
        Err(ConfigError::TooLarge { size, max }) => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                size,
                max
            ));
            (Config::default(), warnings)
        }
        Err(err) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), err));
            (Config::default(), warnings)
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "reflow")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

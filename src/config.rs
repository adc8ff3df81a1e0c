use crate::core::error::{Error, Result};
use crate::core::generate::GeneratorMode;
use crate::utils::get_config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Defaults for the command line, every field optional in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generator used when `--generator` is not given
    #[serde(default)]
    pub generator: GeneratorMode,
    /// Log level before `-v`/`-q` adjustments (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    /// Checks fields serde cannot check on its own.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(format!(
                "invalid log_level '{}', expected one of error, warn, info, debug, trace",
                self.log_level
            ));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorMode::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Path of the per-user config file, if a config directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Parses a config file.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let json = std::fs::read_to_string(path).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let config: AppConfig = serde_json::from_str(&json).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    config.validate().map_err(|message| Error::Config {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(config)
}

/// Loads the app config.
///
/// An explicitly given path must exist. The per-user file is optional and
/// the defaults are used when it is missing; a file that exists but does
/// not parse is still an error so the caller can decide how loud to be.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    match default_config_path() {
        Some(path) if path.is_file() => load_config_from(&path),
        _ => Ok(AppConfig::default()),
    }
}

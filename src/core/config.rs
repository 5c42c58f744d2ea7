//! Configuration loaded from `qdash.yaml`
//!
//! Lookup order: an explicit path, then `./qdash.yaml`, then the user config
//! directory. When nothing is found the built-in defaults apply. Every field
//! is optional in the file.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::pareto::PARETO_TOP_N;
use crate::core::yields::StationScope;
use crate::yaml::{parse_yaml_file, YamlError};

/// Name of the config file looked up in the working and user config dirs
pub const CONFIG_FILE_NAME: &str = "qdash.yaml";

/// Days covered by a report when no window is given
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    #[diagnostic(code(qdash::config::not_found))]
    NotFound(PathBuf),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV file or directory of CSV exports
    pub data_path: Option<PathBuf>,

    /// SQLite file holding saved weekly rollups
    pub store_path: Option<PathBuf>,

    /// Length of the default "last N days" window
    pub default_window_days: u32,

    pub pareto: ParetoConfig,

    #[serde(rename = "yield")]
    pub yields: YieldConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: None,
            store_path: None,
            default_window_days: DEFAULT_WINDOW_DAYS,
            pareto: ParetoConfig::default(),
            yields: YieldConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParetoConfig {
    /// Categories kept on a Pareto chart
    pub top_n: usize,
}

impl Default for ParetoConfig {
    fn default() -> Self {
        Self {
            top_n: PARETO_TOP_N,
        }
    }
}

/// Station subsets used by FPY and TPY
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldConfig {
    /// Key stations of the line
    pub focused_stations: Vec<String>,

    /// Every test station of the line, in flow order
    pub complete_stations: Vec<String>,

    /// Subset used when the command line does not pick one
    pub default_scope: StationScope,
}

impl Default for YieldConfig {
    fn default() -> Self {
        Self {
            focused_stations: vec!["FCT".to_string(), "FI".to_string()],
            complete_stations: vec![
                "VI1".to_string(),
                "ICT".to_string(),
                "FCT".to_string(),
                "FI".to_string(),
            ],
            default_scope: StationScope::Focused,
        }
    }
}

impl YieldConfig {
    /// Stations for a scope
    pub fn stations(&self, scope: StationScope) -> &[String] {
        match scope {
            StationScope::Focused => &self.focused_stations,
            StationScope::Complete => &self.complete_stations,
        }
    }
}

impl Config {
    /// Load configuration, falling back to defaults when no file exists
    ///
    /// An explicit path that does not exist is an error; the implicit
    /// locations are skipped silently.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::from_file(path);
        }

        match Self::discover() {
            Some(path) => Self::from_file(&path),
            None => {
                tracing::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
                Ok(Self::default())
            }
        }
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!(path = %path.display(), "loading config");
        Ok(parse_yaml_file(path)?)
    }

    /// First existing config file in the implicit lookup locations
    pub fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        Self::user_config_path().filter(|p| p.is_file())
    }

    /// Config file location in the user's config directory
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "qdash").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Configured stations for a yield scope
    pub fn stations(&self, scope: StationScope) -> &[String] {
        self.yields.stations(scope)
    }
}

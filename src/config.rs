// Configuration for babynames-explorer, read from
// ~/.config/babynames-explorer/config.toml unless --config points elsewhere.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dataset::DataPaths;
use crate::error::ExplorerError;
use crate::models::GenderFilter;

/// Environment variable that overrides `[data] dir`.
pub const DATA_DIR_ENV: &str = "BABYNAMES_DATA_DIR";

/// `[data]` section: where the four tables live
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: Option<PathBuf>,
    pub national_names: String,
    pub state_names: String,
    pub national_unisex: String,
    pub state_unisex: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            dir: None,
            national_names: "NationalNames.csv".to_string(),
            state_names: "StateNames.csv".to_string(),
            national_unisex: "Top50_Unisex_National.csv".to_string(),
            state_unisex: "Top30_Unisex_State.csv".to_string(),
        }
    }
}

impl DataConfig {
    /// Resolves table paths. `dir_override` wins over the environment, which
    /// wins over the config file.
    pub fn paths(&self, dir_override: Option<&Path>, env_dir: Option<PathBuf>) -> DataPaths {
        let dir = dir_override
            .map(Path::to_path_buf)
            .or(env_dir)
            .or_else(|| self.dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        DataPaths {
            national_names: dir.join(&self.national_names),
            state_names: dir.join(&self.state_names),
            national_unisex: dir.join(&self.national_unisex),
            state_unisex: dir.join(&self.state_unisex),
        }
    }
}

/// `[defaults]` section: filter values used when an argument is omitted
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub names: Vec<String>,
    pub year_start: i32,
    pub year_end: i32,
    pub state: String,
    pub gender: GenderFilter,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            names: vec!["Emma".to_string()],
            year_start: 2000,
            year_end: 2010,
            state: "CA".to_string(),
            gender: GenderFilter::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Result of loading configuration
pub struct ConfigResult {
    pub config: Config,
    pub warning: Option<String>,
}

/// Loads configuration from `path`, or the default location when `None`.
/// Falls back to defaults on any failure. A missing default file is silent;
/// a missing `--config` file, or an unreadable or invalid one, adds a warning.
pub fn load_config(path: Option<&Path>) -> ConfigResult {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path(),
    };

    if !config_path.exists() {
        log::debug!("no config at {}, using defaults", config_path.display());
        return ConfigResult {
            config: Config::default(),
            warning: path.map(|p| format!("Config file {} not found", p.display())),
        };
    }

    match parse_config(&config_path) {
        Ok(config) => ConfigResult {
            config,
            warning: None,
        },
        Err(e) => {
            log::error!("{e}");
            ConfigResult {
                config: Config::default(),
                warning: Some(e.to_string()),
            }
        }
    }
}

fn parse_config(path: &Path) -> Result<Config, ExplorerError> {
    let contents = fs::read_to_string(path)?;
    toml::from_str::<Config>(&contents).map_err(|e| ExplorerError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("babynames-explorer")
        .join("config.toml")
}

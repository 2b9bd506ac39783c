//! Configuration loading and data folder resolution
//!
//! Bootstrap configuration comes from an optional TOML file. A missing file
//! is not fatal: built-in defaults are used and a warning is logged.
//!
//! Data folder resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `TAXA_GALLERY_DATA_FOLDER`
//! 3. TOML `data_folder`
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable overriding the reference data folder
pub const DATA_FOLDER_ENV: &str = "TAXA_GALLERY_DATA_FOLDER";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "TAXA_GALLERY_CONFIG";

/// Default number of gallery items rendered per page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Default minimum autocomplete query length
pub const DEFAULT_MIN_QUERY_LEN: usize = 3;

/// Where the species filter gets its answer from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataSource {
    /// Static distribution data (`gbif_mapping.json` + continent rules)
    #[default]
    #[serde(rename = "local")]
    Local,
    /// GBIF occurrence search facets
    #[serde(rename = "occurrence-api")]
    OccurrenceApi,
}

impl DataSource {
    /// Value used in query strings and config files
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Local => "local",
            DataSource::OccurrenceApi => "occurrence-api",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "local" | "" => Ok(DataSource::Local),
            "occurrence-api" => Ok(DataSource::OccurrenceApi),
            other => Err(Error::InvalidInput(format!("unknown data source '{}'", other))),
        }
    }
}

/// Which remote service backs taxon autocomplete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutocompleteProvider {
    /// GBIF species/suggest, one request per rank
    #[default]
    Gbif,
    /// Wikidata entity search followed by a claims lookup
    Wikidata,
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding gbif_mapping.json and the continent rule files
    #[serde(default)]
    pub data_folder: Option<PathBuf>,

    /// Default species filter strategy
    #[serde(default)]
    pub data_source: DataSource,

    /// Items per gallery page
    #[serde(default)]
    pub page_size: Option<usize>,

    /// Image feed: "qlever", an http(s) JSON endpoint, or a JSON file path
    #[serde(default)]
    pub image_feed: Option<String>,

    #[serde(default)]
    pub autocomplete: AutocompleteConfig,

    #[serde(default)]
    pub endpoints: EndpointsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Effective page size (never zero)
    pub fn page_size(&self) -> usize {
        self.page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Effective image feed setting
    pub fn image_feed(&self) -> &str {
        self.image_feed.as_deref().unwrap_or("qlever")
    }
}

/// Autocomplete settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutocompleteConfig {
    #[serde(default)]
    pub provider: AutocompleteProvider,

    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            provider: AutocompleteProvider::default(),
            min_query_len: DEFAULT_MIN_QUERY_LEN,
        }
    }
}

fn default_min_query_len() -> usize {
    DEFAULT_MIN_QUERY_LEN
}

/// Base URLs of the remote services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_gbif_api")]
    pub gbif_api: String,
    #[serde(default = "default_wikidata_api")]
    pub wikidata_api: String,
    #[serde(default = "default_wikidata_sparql")]
    pub wikidata_sparql: String,
    #[serde(default = "default_commons_api")]
    pub commons_api: String,
    #[serde(default = "default_qlever")]
    pub qlever: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            gbif_api: default_gbif_api(),
            wikidata_api: default_wikidata_api(),
            wikidata_sparql: default_wikidata_sparql(),
            commons_api: default_commons_api(),
            qlever: default_qlever(),
        }
    }
}

fn default_gbif_api() -> String {
    "https://api.gbif.org/v1".to_string()
}

fn default_wikidata_api() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}

fn default_wikidata_sparql() -> String {
    "https://query.wikidata.org/sparql".to_string()
}

fn default_commons_api() -> String {
    "https://commons.wikimedia.org/w/api.php".to_string()
}

fn default_qlever() -> String {
    "https://qlever.cs.uni-freiburg.de/api/wikimedia-commons".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load the bootstrap configuration
///
/// Lookup order: explicit path → `TAXA_GALLERY_CONFIG` → platform config dir.
/// A missing file yields defaults; a file that exists but fails to parse is an error.
pub fn load_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match cli_path {
        Some(p) => Some(p.to_path_buf()),
        None => std::env::var(CONFIG_PATH_ENV)
            .ok()
            .map(PathBuf::from)
            .or_else(default_config_path),
    };

    let Some(path) = path else {
        warn!("Could not determine config directory, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using built-in defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let config = TomlConfig::load(&path)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Platform config file path (`<config dir>/taxa-gallery/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("taxa-gallery").join("config.toml"))
}

/// Resolves the reference data folder from the available sources
pub struct DataFolderResolver {
    cli_arg: Option<PathBuf>,
}

impl DataFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self { cli_arg }
    }

    /// Resolve following CLI → ENV → TOML → compiled default
    pub fn resolve(&self, config: &TomlConfig) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &config.data_folder {
            return path.clone();
        }

        default_data_folder()
    }
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("taxa-gallery"))
        .unwrap_or_else(|| PathBuf::from("./taxa_gallery_data"))
}

/// User-Agent sent by every HTTP client
pub fn get_user_agent() -> String {
    format!("taxa-gallery/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_round_trip_strings() {
        assert_eq!("local".parse::<DataSource>().unwrap(), DataSource::Local);
        assert_eq!(
            "occurrence-api".parse::<DataSource>().unwrap(),
            DataSource::OccurrenceApi
        );
        assert_eq!("".parse::<DataSource>().unwrap(), DataSource::Local);
        assert!("sparql".parse::<DataSource>().is_err());
    }

    #[test]
    fn test_page_size_defaults_and_rejects_zero() {
        let mut config = TomlConfig::default();
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE);
        config.page_size = Some(0);
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE);
        config.page_size = Some(10);
        assert_eq!(config.page_size(), 10);
    }

    #[test]
    fn test_user_agent_contains_version() {
        assert!(get_user_agent().contains(env!("CARGO_PKG_VERSION")));
    }
}

//! Unit tests for configuration loading and graceful degradation
//!
//! Tests cover:
//! - Missing TOML files fall back to defaults
//! - Malformed TOML files are reported
//! - Data folder priority order (CLI → ENV → TOML → default)
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.

use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use taxa_common::config::{
    default_data_folder, load_config, AutocompleteProvider, DataFolderResolver, DataSource,
    TomlConfig, DATA_FOLDER_ENV,
};
use tempfile::TempDir;

#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let config = load_config(Some(&missing)).expect("missing file must not be fatal");

    assert_eq!(config.data_source, DataSource::Local);
    assert_eq!(config.page_size(), 20);
    assert_eq!(config.image_feed(), "qlever");
    assert_eq!(config.autocomplete.min_query_len, 3);
    assert_eq!(config.autocomplete.provider, AutocompleteProvider::Gbif);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.endpoints.gbif_api, "https://api.gbif.org/v1");
}

#[test]
#[serial]
fn test_full_config_file_is_parsed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
data_folder = "/srv/taxa"
data_source = "occurrence-api"
page_size = 10
image_feed = "https://example.org/api/images"

[autocomplete]
provider = "wikidata"

[endpoints]
gbif_api = "http://localhost:9000/v1"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();

    assert_eq!(config.data_folder, Some(PathBuf::from("/srv/taxa")));
    assert_eq!(config.data_source, DataSource::OccurrenceApi);
    assert_eq!(config.page_size(), 10);
    assert_eq!(config.image_feed(), "https://example.org/api/images");
    assert_eq!(config.autocomplete.provider, AutocompleteProvider::Wikidata);
    // Unspecified keys in a present section keep their defaults
    assert_eq!(config.autocomplete.min_query_len, 3);
    assert_eq!(config.endpoints.gbif_api, "http://localhost:9000/v1");
    assert_eq!(
        config.endpoints.wikidata_sparql,
        "https://query.wikidata.org/sparql"
    );
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_malformed_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "page_size = \"twenty\"").unwrap();

    assert!(load_config(Some(&path)).is_err());
}

#[test]
#[serial]
fn test_resolver_cli_argument_wins() {
    env::set_var(DATA_FOLDER_ENV, "/tmp/from-env");
    let config = TomlConfig {
        data_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let resolver = DataFolderResolver::new(Some(PathBuf::from("/tmp/from-cli")));
    assert_eq!(resolver.resolve(&config), PathBuf::from("/tmp/from-cli"));

    env::remove_var(DATA_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    env::set_var(DATA_FOLDER_ENV, "/tmp/from-env");
    let config = TomlConfig {
        data_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let resolver = DataFolderResolver::new(None);
    assert_eq!(resolver.resolve(&config), PathBuf::from("/tmp/from-env"));

    env::remove_var(DATA_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_toml_then_default() {
    env::remove_var(DATA_FOLDER_ENV);

    let with_toml = TomlConfig {
        data_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };
    let resolver = DataFolderResolver::new(None);
    assert_eq!(resolver.resolve(&with_toml), PathBuf::from("/tmp/from-toml"));

    assert_eq!(resolver.resolve(&TomlConfig::default()), default_data_folder());
}

use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use glucose_ml_catalog::config::{
    Config, ConfigLoader, SourceLocation, SourcePaths, SourcesConfig,
};
use glucose_ml_catalog::error::CatalogError;

#[test]
fn base_url_wins_over_data_dir() {
    let config = Config {
        schema_version: None,
        data_dir: Some("site".to_string()),
        base_url: Some("https://datasets.example.org/".to_string()),
        timeout_secs: Some(5),
        sources: SourcesConfig::default(),
    };

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(
        resolved.location,
        SourceLocation::BaseUrl("https://datasets.example.org/".to_string())
    );
    assert_eq!(resolved.timeout, Duration::from_secs(5));
}

#[test]
fn blank_source_paths_fall_back_to_defaults() {
    let config = Config {
        data_dir: Some("dist".to_string()),
        sources: SourcesConfig {
            cards: Some("cards.json".to_string()),
            table1: Some("   ".to_string()),
            ..SourcesConfig::default()
        },
        ..Config::default()
    };

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    let defaults = SourcePaths::default();
    assert_eq!(resolved.paths.cards, "cards.json");
    assert_eq!(resolved.paths.table1, defaults.table1);
    assert_eq!(
        resolved.location,
        SourceLocation::Directory(Utf8PathBuf::from("dist"))
    );
}

#[test]
fn unsupported_schema_version_is_rejected() {
    let config = Config {
        schema_version: Some(2),
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, CatalogError::ConfigParse(_));
}

#[test]
fn explicit_config_file_is_read() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("gml-catalog.json");
    std::fs::write(
        &path,
        r#"{"data_dir": "public", "sources": {"histogram": "h.json"}}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.paths.histogram, "h.json");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, CatalogError::ConfigRead(_));
}

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub const CONFIG_FILE: &str = "gml-catalog.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub cards: Option<String>,
    #[serde(default)]
    pub table1: Option<String>,
    #[serde(default)]
    pub glossary: Option<String>,
    #[serde(default)]
    pub histogram: Option<String>,
    #[serde(default)]
    pub time_in_range: Option<String>,
}

/// Relative paths of the five static documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub cards: String,
    pub table1: String,
    pub glossary: String,
    pub histogram: String,
    pub time_in_range: String,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            cards: "static_data/dataset_card_info.json".to_string(),
            table1: "static_data/table1_detail_data.json".to_string(),
            glossary: "static_data/data_source_map.json".to_string(),
            histogram: "static_data/all-projects-histogram_data_fixed.json".to_string(),
            time_in_range: "static_data/time_in_ranges_by_type.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Directory(Utf8PathBuf),
    BaseUrl(String),
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub location: SourceLocation,
    pub timeout: Duration,
    pub paths: SourcePaths,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads an explicit config path, else `gml-catalog.json` in the working
    /// directory, else the per-user config file. Without any file the
    /// defaults apply.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CatalogError> {
        let config_path = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::discover(),
        };

        let config = match config_path {
            Some(config_path) => {
                let content = fs::read_to_string(&config_path)
                    .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
                serde_json::from_str(&content)
                    .map_err(|err| CatalogError::ConfigParse(err.to_string()))?
            }
            None => Config::default(),
        };

        Self::resolve_config(config)
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("org", "glucose-ml", "gml-catalog")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .filter(|path| path.exists())
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, CatalogError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(CatalogError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let location = match (non_blank(config.base_url), non_blank(config.data_dir)) {
            (Some(url), _) => SourceLocation::BaseUrl(url),
            (None, Some(dir)) => SourceLocation::Directory(Utf8PathBuf::from(dir)),
            (None, None) => SourceLocation::Directory(Utf8PathBuf::from("public")),
        };

        let defaults = SourcePaths::default();
        let sources = config.sources;
        let paths = SourcePaths {
            cards: non_blank(sources.cards).unwrap_or(defaults.cards),
            table1: non_blank(sources.table1).unwrap_or(defaults.table1),
            glossary: non_blank(sources.glossary).unwrap_or(defaults.glossary),
            histogram: non_blank(sources.histogram).unwrap_or(defaults.histogram),
            time_in_range: non_blank(sources.time_in_range).unwrap_or(defaults.time_in_range),
        };

        Ok(ResolvedConfig {
            schema_version,
            location,
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(30).max(1)),
            paths,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_public_dir() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(
            resolved.location,
            SourceLocation::Directory(Utf8PathBuf::from("public"))
        );
        assert_eq!(resolved.paths, SourcePaths::default());
        assert_eq!(resolved.timeout, Duration::from_secs(30));
    }
}

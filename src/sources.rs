use std::time::Duration;

use async_trait::async_trait;
use camino::Utf8PathBuf;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::CatalogError;
use crate::records::{
    CardRecord, DataSourceGlossary, HistogramSeries, Table1Record, TimeInRangeEntry,
    time_in_range_entries,
};

/// Raw access to the static JSON documents.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: Utf8PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, path: &str) -> Utf8PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl SourceFetcher for FileFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, CatalogError> {
        let full = self.path_for(path);
        tokio::fs::read(full.as_std_path())
            .await
            .map_err(|err| CatalogError::SourceUnavailable {
                path: full.to_string(),
                message: err.to_string(),
            })
    }
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("gml-catalog/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CatalogError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| CatalogError::Http(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        base_url_join(&self.base_url, path)
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, CatalogError> {
        let url = self.url_for(path);
        let unavailable = |message: String| CatalogError::SourceUnavailable {
            path: url.clone(),
            message,
        };
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| unavailable(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "request failed".to_string());
            return Err(unavailable(format!("status {status}: {body}")));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| unavailable(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Joins a relative document path onto a static-site base, the way asset
/// URLs are resolved: one `/` between base and path.
pub fn base_url_join(base: &str, relative: &str) -> String {
    let base = base.trim_end_matches('/');
    let relative = relative.trim_start_matches('/');
    format!("{base}/{relative}")
}

/// Parses a whole document as JSON after stripping a UTF-8 BOM and
/// surrounding whitespace. A successful transport with a non-JSON body is
/// still an error.
pub fn parse_json_strict<T: DeserializeOwned>(
    path: &str,
    bytes: &[u8],
) -> Result<T, CatalogError> {
    let malformed = |message: String| CatalogError::MalformedSource {
        path: path.to_string(),
        message,
    };
    let text = std::str::from_utf8(bytes).map_err(|err| malformed(err.to_string()))?;
    let cleaned = text.trim().trim_start_matches('\u{feff}').trim_start();
    serde_json::from_str(cleaned).map_err(|err| malformed(err.to_string()))
}

async fn fetch_json<T: DeserializeOwned>(
    fetcher: &dyn SourceFetcher,
    path: &str,
    cancel: &CancelToken,
) -> Result<T, CatalogError> {
    let bytes = cancel.guard(fetcher.fetch(path)).await?;
    parse_json_strict(path, &bytes)
}

/// Loads the card list. Any failure here ends the resolution.
pub async fn load_cards(
    fetcher: &dyn SourceFetcher,
    path: &str,
    cancel: &CancelToken,
) -> Result<Vec<CardRecord>, CatalogError> {
    let cards = fetch_json::<Vec<CardRecord>>(fetcher, path, cancel)
        .await
        .map_err(|err| match err {
            CatalogError::SourceUnavailable { path, message } => {
                CatalogError::DatasetNotLoadable { path, message }
            }
            other => other,
        })?;
    debug!(path, count = cards.len(), "loaded card list");
    Ok(cards)
}

/// Best-effort load: failures are logged and become `None`. Only
/// cancellation is returned as an error.
async fn load_optional<T: DeserializeOwned>(
    fetcher: &dyn SourceFetcher,
    path: &str,
    cancel: &CancelToken,
) -> Result<Option<T>, CatalogError> {
    match fetch_json::<T>(fetcher, path, cancel).await {
        Ok(value) => {
            debug!(path, "loaded optional source");
            Ok(Some(value))
        }
        Err(CatalogError::Cancelled) => Err(CatalogError::Cancelled),
        Err(err) => {
            warn!(path, error = %err, "optional source skipped");
            Ok(None)
        }
    }
}

pub async fn load_table1(
    fetcher: &dyn SourceFetcher,
    path: &str,
    cancel: &CancelToken,
) -> Result<Option<Vec<Table1Record>>, CatalogError> {
    load_optional(fetcher, path, cancel).await
}

pub async fn load_glossary(
    fetcher: &dyn SourceFetcher,
    path: &str,
    cancel: &CancelToken,
) -> Result<Option<DataSourceGlossary>, CatalogError> {
    load_optional(fetcher, path, cancel).await
}

pub async fn load_histograms(
    fetcher: &dyn SourceFetcher,
    path: &str,
    cancel: &CancelToken,
) -> Result<Option<Vec<HistogramSeries>>, CatalogError> {
    load_optional(fetcher, path, cancel).await
}

pub async fn load_time_in_range(
    fetcher: &dyn SourceFetcher,
    path: &str,
    cancel: &CancelToken,
) -> Result<Option<Vec<TimeInRangeEntry>>, CatalogError> {
    let document = load_optional::<Value>(fetcher, path, cancel).await?;
    Ok(document.and_then(|document| {
        let entries = time_in_range_entries(&document);
        if entries.is_none() {
            warn!(path, "time-in-range document is not an object, skipped");
        }
        entries
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_join_has_single_separator() {
        assert_eq!(
            base_url_join("https://example.org/app/", "/static_data/a.json"),
            "https://example.org/app/static_data/a.json"
        );
        assert_eq!(base_url_join("/", "static_data/a.json"), "/static_data/a.json");
    }

    #[test]
    fn bom_is_stripped() {
        let value: Value = parse_json_strict("x", "\u{feff}{\"a\": 1}\n".as_bytes()).unwrap();
        assert_eq!(value["a"], 1);
    }
}

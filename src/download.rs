//! HTTP layer source.
//!
//! Fetches layer GeoJSON from a base URL with a blocking client. A fetch
//! timeout surfaces as an ordinary error, which the store records as a
//! `Failed` layer rather than leaving the load in flight.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::{config::LayerConfig, io::geojson, layer::{Feature, LayerSource}};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote source: `<base_url>/<geojson_file>` per layer.
pub struct HttpSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("[download] failed to build HTTP client")?;
        Ok(Self { base_url: base_url.into().trim_end_matches('/').to_string(), client })
    }
}

impl LayerSource for HttpSource {
    fn fetch(&self, config: &LayerConfig) -> Result<Vec<Feature>> {
        let url = format!("{}/{}", self.base_url, config.geojson_file);
        log::info!("[download] {url}");

        let value: Value = self
            .client
            .get(&url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("[download] request failed: {url}"))?
            .json()
            .with_context(|| format!("[download] invalid JSON from {url}"))?;

        geojson::parse_feature_collection(&value)
    }
}

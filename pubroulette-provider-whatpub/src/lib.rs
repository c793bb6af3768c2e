//! Enrichment source scraping venue pages from WhatPub.

/// HTML extraction for venue pages.
pub mod page;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use pubroulette_core::{
    model::PartialVenue,
    ports::{EnrichmentSource, PortError},
};

/// Public WhatPub site.
pub const DEFAULT_BASE_URL: &str = "https://whatpub.com";

/// Response from /search/autocomplete
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    href: String,
}

/// Enrichment source looking venues up by name on WhatPub.
pub struct WhatPubSource {
    client: Client,
    base_url: String,
}

impl WhatPubSource {
    /// Create a source using the public site.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Create a source using a custom base URL.
    #[must_use]
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    async fn find_page(&self, venue_name: &str) -> Result<String, PortError> {
        let req = self
            .client
            .get(format!("{}/search/autocomplete", self.base_url))
            .query(&[
                ("q", venue_name),
                ("features", ""),
                ("limit", "10"),
                ("AdditionalServices", "false"),
                ("home", "1"),
            ]);

        let resp: SearchResponse = serde_json::from_str(&fetch_text(req).await?)
            .map_err(|err| PortError::Decode(err.to_string()))?;
        let href = single_result(resp)?;

        Ok(format!("{}{href}", self.base_url))
    }
}

#[async_trait]
impl EnrichmentSource for WhatPubSource {
    fn name(&self) -> &str {
        "whatpub"
    }

    async fn enrich(&self, venue_name: &str) -> Result<PartialVenue, PortError> {
        let url = self.find_page(venue_name).await?;
        debug!(venue = venue_name, %url, "fetching whatpub page");

        let html = fetch_text(self.client.get(url)).await?;
        page::parse_page(&html)
    }
}

fn single_result(resp: SearchResponse) -> Result<String, PortError> {
    let count = resp.results.len();
    let mut results = resp.results.into_iter();
    match (results.next(), count) {
        (Some(result), 1) => Ok(result.href),
        _ => Err(PortError::SourceMiss(format!(
            "unexpected number of results: {count}"
        ))),
    }
}

async fn fetch_text(req: RequestBuilder) -> Result<String, PortError> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(PortError::SourceMiss(format!(
            "unexpected status code: {status}"
        )));
    }
    Ok(resp.text().await?)
}

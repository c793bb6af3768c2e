use std::sync::Arc;

use anyhow::{Context, Result, bail};
use reqwest::Client;

use pubroulette_core::{
    builder::EntityBuilder,
    crawl::CrawlService,
    enrichment::EnrichmentChain,
    exclusion::MemoryExclusionStore,
    ports::{EnrichmentSource, ExclusionStore, GeoSource, RouteOrderer},
    service::RouletteService,
};
use pubroulette_provider_osm::{NominatimGeocoder, OsrmRouteOrderer, OverpassGeoSource};
use pubroulette_provider_places::PlacesGeoSource;
use pubroulette_provider_whatpub::WhatPubSource;
use pubroulette_store_sqlite::SqliteExclusionStore;

use crate::config::{GeodataBackend, MEMORY_STORE, ServerConfig};

/// Services shared by every request handler.
#[derive(Clone)]
pub(crate) struct AppState {
    pub roulette: Arc<RouletteService>,
    pub crawl: Arc<CrawlService>,
}

impl AppState {
    pub(crate) fn new(roulette: RouletteService, orderer: Arc<dyn RouteOrderer>) -> Self {
        let roulette = Arc::new(roulette);
        let crawl = Arc::new(CrawlService::new(Arc::clone(&roulette), orderer));
        Self { roulette, crawl }
    }

    /// Wire the configured backends together.
    pub(crate) async fn from_config(config: &ServerConfig, client: Client) -> Result<Self> {
        let geo = geo_source(config, &client)?;
        let exclusions = exclusion_store(config).await?;
        let enrichment = enrichment_chain(config, &client)?;

        let geocoder = Arc::new(NominatimGeocoder::with_base_url(
            client.clone(),
            config.geocoding.nominatim_url.as_str(),
        ));
        let orderer = Arc::new(OsrmRouteOrderer::with_base_url(
            client,
            config.routing.osrm_url.as_str(),
            config.routing.profile.as_str(),
        ));

        tracing::info!(
            geodata = geo.name(),
            enrichment = ?enrichment.names().collect::<Vec<_>>(),
            categories = ?config.roulette.categories,
            "services wired"
        );

        let roulette = RouletteService::new(
            config.roulette.clone(),
            geo,
            exclusions,
            EntityBuilder::new(geocoder),
            enrichment,
        );
        Ok(Self::new(roulette, orderer))
    }
}

fn geo_source(config: &ServerConfig, client: &Client) -> Result<Arc<dyn GeoSource>> {
    let geodata = &config.geodata;
    let source: Arc<dyn GeoSource> = match geodata.backend {
        GeodataBackend::Overpass => Arc::new(OverpassGeoSource::with_url(
            client.clone(),
            geodata.overpass_url.as_str(),
        )),
        GeodataBackend::Places => {
            let key = geodata
                .places_api_key
                .as_deref()
                .filter(|key| !key.trim().is_empty())
                .context("geodata.places_api_key is required for the places backend")?;
            Arc::new(PlacesGeoSource::with_base_url(
                client.clone(),
                key,
                geodata.places_url.as_str(),
            ))
        }
    };
    Ok(source)
}

async fn exclusion_store(config: &ServerConfig) -> Result<Arc<dyn ExclusionStore>> {
    let url = config.store.url.as_str();
    if url == MEMORY_STORE {
        tracing::warn!("using in-memory exclusion store, exclusions are lost on restart");
        return Ok(Arc::new(MemoryExclusionStore::new()));
    }

    let store = SqliteExclusionStore::connect(url, config.roulette.exclusion_set.as_str())
        .await
        .with_context(|| format!("failed to open exclusion store {url}"))?;
    Ok(Arc::new(store))
}

fn enrichment_chain(config: &ServerConfig, client: &Client) -> Result<EnrichmentChain> {
    let mut sources: Vec<Arc<dyn EnrichmentSource>> = Vec::new();
    for name in &config.enrichment.sources {
        match name.as_str() {
            "whatpub" => sources.push(Arc::new(WhatPubSource::with_base_url(
                client.clone(),
                config.enrichment.whatpub_url.as_str(),
            ))),
            other => bail!("unknown enrichment source {other:?}"),
        }
    }
    Ok(EnrichmentChain::new(sources))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_backend_requires_a_key() {
        let mut config = ServerConfig::default();
        config.geodata.backend = GeodataBackend::Places;
        assert!(geo_source(&config, &Client::new()).is_err());

        config.geodata.places_api_key = Some(String::from("key"));
        let source = geo_source(&config, &Client::new()).expect("key present");
        assert_eq!(source.name(), "places");
    }

    #[test]
    fn unknown_enrichment_source_is_rejected() {
        let mut config = ServerConfig::default();
        config.enrichment.sources = vec![String::from("whatpub"), String::from("yelp")];
        assert!(enrichment_chain(&config, &Client::new()).is_err());

        config.enrichment.sources.clear();
        let chain = enrichment_chain(&config, &Client::new()).expect("empty chain");
        assert!(chain.is_empty());
    }

    #[tokio::test]
    async fn memory_store_wires_without_network() {
        let mut config = ServerConfig::default();
        config.store.url = MEMORY_STORE.to_owned();

        let state = AppState::from_config(&config, Client::new())
            .await
            .expect("wiring");
        assert_eq!(state.roulette.config().categories, vec!["pub", "bar"]);
    }

    #[tokio::test]
    async fn sqlite_store_is_created_on_startup() {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let mut config = ServerConfig::default();
        config.store.url = format!("sqlite:{}", dir.path().join("ex.db").display());

        AppState::from_config(&config, Client::new())
            .await
            .expect("wiring");
        assert!(dir.path().join("ex.db").exists());
    }
}

use std::{fs, net::SocketAddr, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

use pubroulette_core::config::RouletteConfig;

/// Store setting selecting the process-local exclusion store.
pub(crate) const MEMORY_STORE: &str = "memory";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ServerConfig {
    pub server: HttpConfig,
    pub geodata: GeodataConfig,
    pub geocoding: GeocodingConfig,
    pub routing: RoutingConfig,
    pub enrichment: EnrichmentConfig,
    pub store: StoreConfig,
    pub roulette: RouletteConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct HttpConfig {
    pub bind: SocketAddr,
    pub allowed_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum GeodataBackend {
    #[default]
    Overpass,
    Places,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct GeodataConfig {
    pub backend: GeodataBackend,
    pub overpass_url: String,
    pub places_url: String,
    pub places_api_key: Option<String>,
}

impl Default for GeodataConfig {
    fn default() -> Self {
        Self {
            backend: GeodataBackend::Overpass,
            overpass_url: pubroulette_provider_osm::overpass::DEFAULT_INTERPRETER_URL.to_owned(),
            places_url: pubroulette_provider_places::DEFAULT_BASE_URL.to_owned(),
            places_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct GeocodingConfig {
    pub nominatim_url: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            nominatim_url: pubroulette_provider_osm::nominatim::DEFAULT_BASE_URL.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct RoutingConfig {
    pub osrm_url: String,
    pub profile: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            osrm_url: pubroulette_provider_osm::osrm::DEFAULT_BASE_URL.to_owned(),
            profile: pubroulette_provider_osm::osrm::DEFAULT_PROFILE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct EnrichmentConfig {
    pub sources: Vec<String>,
    pub whatpub_url: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            sources: vec![String::from("whatpub")],
            whatpub_url: pubroulette_provider_whatpub::DEFAULT_BASE_URL.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct StoreConfig {
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::from("sqlite:pubroulette.db"),
        }
    }
}

impl ServerConfig {
    /// Read the TOML file at `path`, or use defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            tracing::info!("no config file given, using defaults");
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub(crate) fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

//! Candidate search backed by the Google Places nearby-search API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use pubroulette_core::{
    builder::NAME_KEY,
    model::{CandidateId, CandidateRecord, Coordinates, RecordKind, SearchArea},
    ports::{GeoSource, PortError},
};

/// Nearby-search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Attribute holding the short address Places calls `vicinity`.
pub const VICINITY_KEY: &str = "addr:full";

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    place_id: String,
    name: Option<String>,
    vicinity: Option<String>,
    geometry: Geometry,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Google Places geodata backend.
pub struct PlacesGeoSource {
    client: Client,
    api_key: String,
    base_url: String,
}

impl PlacesGeoSource {
    /// Create a source for the public API.
    #[must_use]
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    /// Create a source using a custom endpoint.
    #[must_use]
    pub fn with_base_url(
        client: Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl GeoSource for PlacesGeoSource {
    fn name(&self) -> &str {
        "places"
    }

    async fn fetch(
        &self,
        area: &SearchArea,
        category: &str,
    ) -> Result<Vec<CandidateRecord>, PortError> {
        debug!(category, "querying places nearby search");

        let location = format!(
            "{},{}",
            area.center.latitude_fixed(),
            area.center.longitude_fixed()
        );
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("location", location.as_str()),
                ("radius", area.radius_metres.to_string().as_str()),
                ("type", category),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PortError::BackendUnavailable(format!(
                "Places returned status {status}"
            )));
        }

        let body = resp.bytes().await?;
        parse_nearby(&body)
    }
}

/// Parse a nearby-search response into candidate records.
///
/// # Errors
///
/// Returns [`PortError::BackendUnavailable`] for any API status other than
/// `OK` or `ZERO_RESULTS`, and [`PortError::Decode`] for malformed bodies.
pub fn parse_nearby(body: &[u8]) -> Result<Vec<CandidateRecord>, PortError> {
    let resp: NearbyResponse =
        serde_json::from_slice(body).map_err(|err| PortError::Decode(err.to_string()))?;

    match resp.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(Vec::new()),
        other => {
            return Err(PortError::BackendUnavailable(format!(
                "Places status {other}: {}",
                resp.error_message.unwrap_or_default()
            )));
        }
    }

    Ok(resp.results.into_iter().filter_map(to_record).collect())
}

fn to_record(place: Place) -> Option<CandidateRecord> {
    let location = Coordinates::new(place.geometry.location.lat, place.geometry.location.lng).ok()?;

    let mut tags = BTreeMap::new();
    if let Some(name) = place.name {
        tags.insert(NAME_KEY.to_owned(), name);
    }
    if let Some(vicinity) = place.vicinity {
        tags.insert(VICINITY_KEY.to_owned(), vicinity);
    }
    for kind in place.types {
        tags.insert(kind, String::from("yes"));
    }

    Some(CandidateRecord {
        id: place_id_to_candidate(&place.place_id),
        location,
        tags,
        kind: RecordKind::Node,
    })
}

/// Stable numeric identifier for a textual place id.
#[must_use]
pub fn place_id_to_candidate(place_id: &str) -> CandidateId {
    let digest = Sha256::digest(place_id.as_bytes());
    let bytes = digest.first_chunk::<8>().copied().unwrap_or_default();
    CandidateId(i64::from_be_bytes(bytes) & i64::MAX)
}

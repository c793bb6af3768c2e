use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use pubroulette_core::{
    model::{CandidateId, CandidateRecord, Coordinates, RecordKind, SearchArea},
    ports::{GeoSource, PortError},
};

/// Public Overpass interpreter.
pub const DEFAULT_INTERPRETER_URL: &str = "https://overpass-api.de/api/interpreter";

/// Response from the interpreter with `[out:json]`.
#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,

    // nodes carry lat/lon directly, ways and relations only with `out center`
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Center>,

    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Center {
    lat: f64,
    lon: f64,
}

/// Amenity search backed by the Overpass API.
pub struct OverpassGeoSource {
    client: Client,
    interpreter_url: String,
}

impl OverpassGeoSource {
    /// Create a source using the public interpreter.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_url(client, DEFAULT_INTERPRETER_URL)
    }

    /// Create a source using a custom interpreter endpoint.
    #[must_use]
    pub fn with_url(client: Client, interpreter_url: impl Into<String>) -> Self {
        Self {
            client,
            interpreter_url: interpreter_url.into(),
        }
    }
}

#[async_trait]
impl GeoSource for OverpassGeoSource {
    fn name(&self) -> &str {
        "overpass"
    }

    async fn fetch(
        &self,
        area: &SearchArea,
        category: &str,
    ) -> Result<Vec<CandidateRecord>, PortError> {
        let query = build_query(area, category);
        debug!(category, "querying overpass");

        let resp = self
            .client
            .post(&self.interpreter_url)
            .form(&[("data", query.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PortError::BackendUnavailable(format!(
                "Overpass returned status {status}"
            )));
        }

        let body = resp.bytes().await?;
        parse_elements(&body)
    }
}

/// Overpass QL selecting every node, way and relation with
/// `amenity=<category>` inside `area`.
#[must_use]
pub fn build_query(area: &SearchArea, category: &str) -> String {
    let amenity = category.replace('\\', "\\\\").replace('"', "\\\"");
    let around = format!(
        "(around:{},{},{})",
        area.radius_metres,
        area.center.latitude_fixed(),
        area.center.longitude_fixed()
    );

    format!(
        "[out:json];\n(\n  node[\"amenity\"=\"{amenity}\"]{around};\n  way[\"amenity\"=\"{amenity}\"]{around};\n  relation[\"amenity\"=\"{amenity}\"]{around};\n);\nout center;"
    )
}

/// Parse an interpreter response into candidate records.
///
/// Elements without a position or with an unknown type are dropped.
///
/// # Errors
///
/// Returns [`PortError::Decode`] when the body is not a valid response.
pub fn parse_elements(body: &[u8]) -> Result<Vec<CandidateRecord>, PortError> {
    let resp: OverpassResponse =
        serde_json::from_slice(body).map_err(|err| PortError::Decode(err.to_string()))?;

    Ok(resp.elements.into_iter().filter_map(to_record).collect())
}

fn to_record(element: OverpassElement) -> Option<CandidateRecord> {
    let kind = match element.kind.as_str() {
        "node" => RecordKind::Node,
        "way" => RecordKind::Way,
        "relation" => RecordKind::Relation,
        _ => return None,
    };

    let (lat, lon) = match (element.lat, element.lon, element.center) {
        (Some(lat), Some(lon), _) => (lat, lon),
        (_, _, Some(center)) => (center.lat, center.lon),
        _ => return None,
    };

    Some(CandidateRecord {
        id: CandidateId(element.id),
        location: Coordinates::new(lat, lon).ok()?,
        tags: element.tags,
        kind,
    })
}

//! OpenStreetMap-backed providers: Overpass candidate search, Nominatim
//! reverse geocoding and OSRM trip ordering.

/// Nominatim reverse geocoder.
pub mod nominatim;
/// OSRM trip planner.
pub mod osrm;
/// Overpass geodata backend.
pub mod overpass;

pub use nominatim::NominatimGeocoder;
pub use osrm::OsrmRouteOrderer;
pub use overpass::OverpassGeoSource;

use pubroulette_core::ports::PortError;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

// Small helper to fetch and decode JSON, reporting non-success statuses as backend errors.
async fn fetch_json<T: DeserializeOwned>(
    service: &str,
    req: RequestBuilder,
) -> Result<T, PortError> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(PortError::BackendUnavailable(format!(
            "{service} returned status {status}"
        )));
    }
    resp.json()
        .await
        .map_err(|err| PortError::Decode(format!("{service}: {err}")))
}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use pubroulette_core::{
    model::Coordinates,
    ports::{PortError, ReverseGeocoder},
};

use crate::fetch_json;

/// Public Nominatim instance.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<Address>,
    // set instead of `address` when nothing is found at the point
    error: Option<String>,
}

/// Address components of a `jsonv2` reverse lookup.
#[derive(Debug, Default, Deserialize)]
pub struct Address {
    /// Street name.
    pub road: Option<String>,
    /// City, for large settlements.
    pub city: Option<String>,
    /// Town, when there is no city.
    pub town: Option<String>,
    /// Village, when there is neither city nor town.
    pub village: Option<String>,
    /// State or region.
    pub state: Option<String>,
    /// Postal code.
    pub postcode: Option<String>,
    /// Country name.
    pub country: Option<String>,
}

/// Reverse geocoder backed by the Nominatim API.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Create a geocoder using the public instance.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Create a geocoder using a self-hosted instance.
    #[must_use]
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn lookup(&self, at: Coordinates) -> Result<Option<String>, PortError> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));
        let req = self.client.get(url).query(&[
            ("format", "jsonv2".to_owned()),
            ("lat", at.latitude_fixed()),
            ("lon", at.longitude_fixed()),
        ]);

        let resp: ReverseResponse = fetch_json("Nominatim", req).await?;
        if let Some(reason) = resp.error {
            tracing::debug!(%reason, "nominatim found nothing");
            return Ok(None);
        }

        Ok(resp.address.as_ref().and_then(format_address))
    }
}

/// Join the usable address parts with `", "`.
///
/// Returns `None` when no part is present.
#[must_use]
pub fn format_address(address: &Address) -> Option<String> {
    let locality = address
        .city
        .as_ref()
        .or(address.town.as_ref())
        .or(address.village.as_ref());

    let parts: Vec<&str> = [
        address.road.as_ref(),
        locality,
        address.state.as_ref(),
        address.postcode.as_ref(),
        address.country.as_ref(),
    ]
    .into_iter()
    .flatten()
    .map(|part| part.trim())
    .filter(|part| !part.is_empty())
    .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}

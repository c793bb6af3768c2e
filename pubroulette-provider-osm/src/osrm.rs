use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use pubroulette_core::{
    model::Coordinates,
    ports::{PortError, RouteOrderer},
};

use crate::fetch_json;

/// Public OSRM demo server.
pub const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Default routing profile.
pub const DEFAULT_PROFILE: &str = "walking";

#[derive(Debug, Deserialize)]
struct TripResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    waypoints: Vec<TripWaypoint>,
}

#[derive(Debug, Deserialize)]
struct TripWaypoint {
    waypoint_index: usize,
}

/// Route orderer backed by the OSRM trip service.
///
/// The first stop stays first and the trip does not return to it.
pub struct OsrmRouteOrderer {
    client: Client,
    base_url: String,
    profile: String,
}

impl OsrmRouteOrderer {
    /// Create an orderer using the public demo server.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL, DEFAULT_PROFILE)
    }

    /// Create an orderer for a custom server and profile.
    #[must_use]
    pub fn with_base_url(
        client: Client,
        base_url: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            profile: profile.into(),
        }
    }

    fn trip_url(&self, stops: &[Coordinates]) -> String {
        let coords = stops
            .iter()
            .map(|stop| format!("{},{}", stop.longitude_fixed(), stop.latitude_fixed()))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/trip/v1/{}/{coords}",
            self.base_url.trim_end_matches('/'),
            self.profile
        )
    }
}

#[async_trait]
impl RouteOrderer for OsrmRouteOrderer {
    async fn order(&self, stops: &[Coordinates]) -> Result<Vec<usize>, PortError> {
        if stops.len() < 2 {
            return Ok((0..stops.len()).collect());
        }

        let req = self
            .client
            .get(self.trip_url(stops))
            .query(&[("source", "first"), ("roundtrip", "false")]);

        let resp: TripResponse = fetch_json("OSRM", req).await?;
        trip_order(resp, stops.len())
    }
}

// waypoints[i].waypoint_index is where input i lands in the trip; invert it.
fn trip_order(resp: TripResponse, len: usize) -> Result<Vec<usize>, PortError> {
    if resp.code != "Ok" {
        return Err(PortError::BackendUnavailable(format!(
            "OSRM trip failed with {}: {}",
            resp.code,
            resp.message.unwrap_or_default()
        )));
    }

    if resp.waypoints.len() != len {
        return Err(PortError::Decode(format!(
            "expected {len} waypoints, got {}",
            resp.waypoints.len()
        )));
    }

    let mut order = vec![None; len];
    for (input, waypoint) in resp.waypoints.iter().enumerate() {
        match order.get_mut(waypoint.waypoint_index) {
            Some(slot @ None) => *slot = Some(input),
            _ => {
                return Err(PortError::Decode(format!(
                    "invalid waypoint index {}",
                    waypoint.waypoint_index
                )));
            }
        }
    }

    Ok(order.into_iter().flatten().collect())
}

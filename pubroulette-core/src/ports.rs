//! Traits describing external collaborators and shared helper types.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{CandidateId, CandidateRecord, Coordinates, PartialVenue, SearchArea};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to external collaborators.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Geodata or routing backend rejected the request or is down.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
    /// Exclusion store could not be reached.
    #[error("Exclusion store unavailable: {0}")]
    StoreUnavailable(String),
    /// Enrichment source had nothing to offer for the venue.
    #[error("Source miss: {0}")]
    SourceMiss(String),
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
/// Geodata backend returning raw candidates around a point.
pub trait GeoSource: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Fetch every record of `category` inside `area`.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] on transport or parse failure.
    async fn fetch(
        &self,
        area: &SearchArea,
        category: &str,
    ) -> Result<Vec<CandidateRecord>, PortError>;
}

#[async_trait]
/// Durable set of candidate identifiers to skip.
pub trait ExclusionStore: Send + Sync {
    /// Whether `id` has been excluded.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::StoreUnavailable`] when the store cannot be read.
    async fn is_excluded(&self, id: CandidateId) -> Result<bool, PortError>;

    /// Mark `id` as excluded. Excluding an already excluded id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::StoreUnavailable`] when the store cannot be written.
    async fn exclude(&self, id: CandidateId) -> Result<(), PortError>;
}

#[async_trait]
/// Reverse geocoding lookup.
pub trait ReverseGeocoder: Send + Sync {
    /// Formatted address at `at`, or `None` when the service knows of none.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the lookup request fails.
    async fn lookup(&self, at: Coordinates) -> Result<Option<String>, PortError>;
}

#[async_trait]
/// Secondary source of venue data, looked up by name.
pub trait EnrichmentSource: Send + Sync {
    /// Source name used in diagnostics.
    fn name(&self) -> &str;

    /// Fetch supplementary data for the venue called `venue_name`.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the venue is unknown to the source or the
    /// source could not be read. Callers treat every error as a miss.
    async fn enrich(&self, venue_name: &str) -> Result<PartialVenue, PortError>;
}

#[async_trait]
/// Trip planner that orders stops for travel.
pub trait RouteOrderer: Send + Sync {
    /// Return a permutation of stop indices: element `k` is the index into
    /// `stops` of the `k`-th stop to visit.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the routing service fails.
    async fn order(&self, stops: &[Coordinates]) -> Result<Vec<usize>, PortError>;
}

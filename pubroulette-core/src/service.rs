//! Random venue selection over a merged, exclusion-filtered candidate pool.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::builder::{BuildError, EntityBuilder};
use crate::config::RouletteConfig;
use crate::enrichment::EnrichmentChain;
use crate::model::{CandidateId, CandidateRecord, SearchArea, Venue};
use crate::ports::{ExclusionStore, GeoSource, PortError};

#[derive(thiserror::Error, Debug)]
/// Outcomes of a selection that are surfaced to callers.
pub enum RouletteError {
    /// A geodata request failed while gathering candidates.
    #[error("failed to search for venues: {0}")]
    SearchFailure(#[source] PortError),
    /// No candidate exists within the search area.
    #[error("no venues within the radius of the provided location were found")]
    NoCandidatesFound,
    /// Every attempted candidate failed to build.
    #[error("failed to build a valid venue after {attempts} attempts")]
    ParsingFailure {
        /// Number of distinct candidates tried.
        attempts: usize,
    },
}

/// Entry point for picking a random venue near a point.
pub struct RouletteService {
    config: RouletteConfig,
    geo: Arc<dyn GeoSource>,
    exclusions: Arc<dyn ExclusionStore>,
    builder: EntityBuilder,
    enrichment: EnrichmentChain,
}

impl RouletteService {
    /// Create a service wired to its collaborators.
    #[must_use]
    pub fn new(
        config: RouletteConfig,
        geo: Arc<dyn GeoSource>,
        exclusions: Arc<dyn ExclusionStore>,
        builder: EntityBuilder,
        enrichment: EnrichmentChain,
    ) -> Self {
        Self {
            config,
            geo,
            exclusions,
            builder,
            enrichment,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RouletteConfig {
        &self.config
    }

    /// Pick one random, fully built and enriched venue inside `area`.
    ///
    /// At most `min(max_attempts, pool size)` distinct candidates are tried.
    /// Each candidate that fails to build is excluded for future selections.
    ///
    /// # Errors
    ///
    /// Returns [`RouletteError::SearchFailure`] or
    /// [`RouletteError::NoCandidatesFound`] when gathering fails, and
    /// [`RouletteError::ParsingFailure`] when every attempt fails.
    pub async fn play(&self, area: &SearchArea) -> Result<Venue, RouletteError> {
        let mut pool = self.candidate_pool(area).await?;
        let attempts = self.config.max_attempts.min(pool.len());

        for attempt in 1..=attempts {
            let picked = rand::rng().random_range(0..pool.len());
            let record = pool.swap_remove(picked);

            match self.resolve(&record).await {
                Ok(venue) => {
                    info!(id = %record.id, venue = %venue.name, attempt, "venue selected");
                    return Ok(venue);
                }
                Err(err) => {
                    warn!(id = %record.id, attempt, error = %err, "candidate could not be built");
                    self.exclude_best_effort(record.id).await;
                }
            }
        }

        Err(RouletteError::ParsingFailure { attempts })
    }

    /// Gather candidates for every configured category and drop excluded ones.
    ///
    /// # Errors
    ///
    /// Returns [`RouletteError::SearchFailure`] when any category fails and
    /// [`RouletteError::NoCandidatesFound`] when the merged pool is empty.
    pub async fn candidate_pool(
        &self,
        area: &SearchArea,
    ) -> Result<Vec<CandidateRecord>, RouletteError> {
        let merged = self.gather(area).await?;
        if merged.is_empty() {
            return Err(RouletteError::NoCandidatesFound);
        }
        Ok(self.without_excluded(merged).await)
    }

    /// Build `record` and merge every enrichment source into it.
    ///
    /// # Errors
    ///
    /// Returns the [`BuildError`] of the failed build; enrichment never fails.
    pub async fn resolve(&self, record: &CandidateRecord) -> Result<Venue, BuildError> {
        let mut venue = self.builder.build(record).await?;
        let misses = self.enrichment.apply(&mut venue).await;
        if !misses.is_empty() {
            debug!(id = %record.id, misses = misses.len(), "venue enriched partially");
        }
        Ok(venue)
    }

    async fn gather(
        &self,
        area: &SearchArea,
    ) -> Result<BTreeMap<CandidateId, CandidateRecord>, RouletteError> {
        let mut merged = BTreeMap::new();

        for category in &self.config.categories {
            let records = self
                .geo
                .fetch(area, category)
                .await
                .map_err(RouletteError::SearchFailure)?;
            debug!(backend = self.geo.name(), category = category.as_str(), found = records.len(), "fetched candidates");

            for record in records {
                merged.insert(record.id, record);
            }
        }

        Ok(merged)
    }

    // A failing store read disables filtering for the rest of the pass.
    async fn without_excluded(
        &self,
        merged: BTreeMap<CandidateId, CandidateRecord>,
    ) -> Vec<CandidateRecord> {
        let mut remaining = Vec::with_capacity(merged.len());
        let mut filtering = true;

        for (id, record) in merged {
            if filtering {
                match self.exclusions.is_excluded(id).await {
                    Ok(true) => {
                        debug!(%id, "skipping excluded candidate");
                        continue;
                    }
                    Ok(false) => {}
                    Err(err) => {
                        warn!(error = %err, "exclusion store unavailable, selecting without filtering");
                        filtering = false;
                    }
                }
            }
            remaining.push(record);
        }

        remaining
    }

    async fn exclude_best_effort(&self, id: CandidateId) {
        if let Err(err) = self.exclusions.exclude(id).await {
            warn!(%id, error = %err, "failed to record exclusion, continuing");
        }
    }
}

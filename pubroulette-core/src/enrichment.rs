//! Ordered chain of enrichment sources applied to built venues.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::Venue;
use crate::ports::EnrichmentSource;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A source that contributed nothing for a venue.
pub struct SourceMiss {
    /// Name of the source.
    pub source: String,
    /// Why the source missed.
    pub reason: String,
}

/// Enrichment sources in the order their results are merged.
#[derive(Clone, Default)]
pub struct EnrichmentChain {
    sources: Vec<Arc<dyn EnrichmentSource>>,
}

impl EnrichmentChain {
    /// Build a chain from the provided sources.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn EnrichmentSource>>) -> Self {
        Self { sources }
    }

    /// Names of the configured sources, in merge order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|source| source.name())
    }

    /// Number of configured sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True when no source is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Query every source in order and merge each hit into `venue`.
    ///
    /// Later sources override fields set by earlier ones. Misses are logged
    /// and returned; they never fail the call.
    pub async fn apply(&self, venue: &mut Venue) -> Vec<SourceMiss> {
        let mut misses = Vec::new();

        for source in &self.sources {
            match source.enrich(&venue.name).await {
                Ok(partial) => {
                    debug!(source = source.name(), venue = %venue.name, "merging enrichment");
                    venue.merge(partial);
                }
                Err(err) => {
                    warn!(source = source.name(), venue = %venue.name, error = %err, "enrichment source missed");
                    misses.push(SourceMiss {
                        source: source.name().to_owned(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        misses
    }
}

//! Multi-venue crawls: a random subset of buildable venues in travel order.

use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::model::{Coordinates, CrawlLength, SearchArea, Venue};
use crate::ports::RouteOrderer;
use crate::service::{RouletteError, RouletteService};

/// Plans crawls on top of a [`RouletteService`].
pub struct CrawlService {
    roulette: Arc<RouletteService>,
    orderer: Arc<dyn RouteOrderer>,
}

impl CrawlService {
    /// Create a crawl planner sharing the roulette service's collaborators.
    #[must_use]
    pub fn new(roulette: Arc<RouletteService>, orderer: Arc<dyn RouteOrderer>) -> Self {
        Self { roulette, orderer }
    }

    /// Pick up to `length` distinct buildable venues inside `area`, ordered for travel.
    ///
    /// Candidates are tried in a uniformly shuffled order until `length`
    /// venues are built, so the result is a uniform random subset of the
    /// buildable candidates. A shorter crawl is returned when fewer are
    /// available. Candidates that fail to build are skipped.
    ///
    /// # Errors
    ///
    /// Returns the gathering errors of [`RouletteService::candidate_pool`] and
    /// [`RouletteError::ParsingFailure`] when no candidate builds.
    pub async fn crawl(
        &self,
        area: &SearchArea,
        length: CrawlLength,
    ) -> Result<Vec<Venue>, RouletteError> {
        let mut pool = self.roulette.candidate_pool(area).await?;
        pool.shuffle(&mut rand::rng());

        let wanted = length.get().min(pool.len());
        let mut venues = Vec::with_capacity(wanted);
        let mut attempts = 0;

        for record in &pool {
            if venues.len() == wanted {
                break;
            }
            attempts += 1;
            match self.roulette.resolve(record).await {
                Ok(venue) => venues.push(venue),
                Err(err) => debug!(id = %record.id, error = %err, "skipping candidate in crawl"),
            }
        }

        if venues.is_empty() {
            return Err(RouletteError::ParsingFailure { attempts });
        }

        info!(requested = length.get(), built = venues.len(), "crawl assembled");
        Ok(self.order(venues).await)
    }

    async fn order(&self, venues: Vec<Venue>) -> Vec<Venue> {
        if venues.len() < 2 {
            return venues;
        }

        let stops: Vec<Coordinates> = venues.iter().map(|venue| venue.location).collect();
        match self.orderer.order(&stops).await {
            Ok(permutation) if is_permutation(&permutation, venues.len()) => {
                apply_permutation(venues, &permutation)
            }
            Ok(permutation) => {
                warn!(?permutation, "route orderer returned an invalid order, keeping random order");
                venues
            }
            Err(err) => {
                warn!(error = %err, "route ordering failed, keeping random order");
                venues
            }
        }
    }
}

fn is_permutation(indices: &[usize], len: usize) -> bool {
    if indices.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    indices.iter().all(|&index| {
        seen.get_mut(index)
            .is_some_and(|slot| !std::mem::replace(slot, true))
    })
}

fn apply_permutation(venues: Vec<Venue>, permutation: &[usize]) -> Vec<Venue> {
    let mut slots: Vec<Option<Venue>> = venues.into_iter().map(Some).collect();
    permutation
        .iter()
        .filter_map(|&index| slots.get_mut(index).and_then(Option::take))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::builder::EntityBuilder;
    use crate::config::RouletteConfig;
    use crate::enrichment::EnrichmentChain;
    use crate::mocks::{
        FlakyStore, MockGeocoder, MockOrderer, StaticGeoSource, area, id_at, record,
    };
    use crate::model::CandidateRecord;

    fn crawl_service(
        candidates: Vec<CandidateRecord>,
        geocoder: MockGeocoder,
        orderer: MockOrderer,
    ) -> CrawlService {
        let roulette = RouletteService::new(
            RouletteConfig::default(),
            Arc::new(StaticGeoSource::default().with("pub", candidates)),
            Arc::new(FlakyStore::default()),
            EntityBuilder::new(Arc::new(geocoder)),
            EnrichmentChain::default(),
        );
        CrawlService::new(Arc::new(roulette), Arc::new(orderer))
    }

    fn named(ids: impl IntoIterator<Item = i64>) -> Vec<CandidateRecord> {
        ids.into_iter()
            .map(|id| record(id, Some(format!("Pub {id}").as_str())))
            .collect()
    }

    fn length(n: i64) -> CrawlLength {
        CrawlLength::new(n).expect("valid length")
    }

    #[tokio::test]
    async fn length_is_clamped_to_buildable_candidates() {
        let service = crawl_service(
            named(1..=3),
            MockGeocoder::resolving("anywhere"),
            MockOrderer::Reverse,
        );

        let venues = service.crawl(&area(), length(5)).await.expect("crawl");

        assert_eq!(venues.len(), 3);
        let distinct: HashSet<_> = venues.iter().map(|venue| venue.name.clone()).collect();
        assert_eq!(distinct.len(), 3);
    }

    #[tokio::test]
    async fn unbuildable_candidates_are_skipped() {
        let mut candidates = named(1..=3);
        candidates.push(record(4, None));
        let service = crawl_service(
            candidates,
            MockGeocoder::resolving("anywhere").except([2]),
            MockOrderer::Reverse,
        );

        let venues = service.crawl(&area(), length(5)).await.expect("crawl");

        let mut ids: Vec<i64> = venues.iter().map(|venue| id_at(venue.location)).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn subset_has_requested_size() {
        let service = crawl_service(
            named(1..=10),
            MockGeocoder::resolving("anywhere"),
            MockOrderer::Reverse,
        );

        let venues = service.crawl(&area(), length(4)).await.expect("crawl");

        assert_eq!(venues.len(), 4);
    }

    #[tokio::test]
    async fn venues_follow_the_route_order() {
        let service = crawl_service(
            named(1..=3),
            MockGeocoder::resolving("anywhere"),
            MockOrderer::Fixed(vec![2, 0, 1]),
        );

        let venues = service.crawl(&area(), length(3)).await.expect("crawl");
        let reordered = service.order(venues.clone()).await;

        assert_eq!(reordered[0], venues[2]);
        assert_eq!(reordered[1], venues[0]);
        assert_eq!(reordered[2], venues[1]);
    }

    #[tokio::test]
    async fn routing_failure_keeps_venues() {
        let service = crawl_service(
            named(1..=3),
            MockGeocoder::resolving("anywhere"),
            MockOrderer::Failing,
        );

        let venues = service.crawl(&area(), length(3)).await.expect("crawl");

        assert_eq!(venues.len(), 3);
    }

    #[tokio::test]
    async fn no_buildable_candidate_is_a_parsing_failure() {
        let service = crawl_service(
            vec![record(1, None), record(2, None)],
            MockGeocoder::resolving("anywhere"),
            MockOrderer::Reverse,
        );

        let result = service.crawl(&area(), length(2)).await;

        assert!(matches!(result, Err(RouletteError::ParsingFailure { attempts: 2 })));
    }

    #[test]
    fn permutation_check_rejects_duplicates_and_gaps() {
        assert!(is_permutation(&[1, 0, 2], 3));
        assert!(!is_permutation(&[0, 0, 2], 3));
        assert!(!is_permutation(&[0, 1, 3], 3));
        assert!(!is_permutation(&[0, 1], 3));
    }
}

//! Test doubles for the capability traits.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::exclusion::MemoryExclusionStore;
use crate::model::{
    CandidateId, CandidateRecord, Coordinates, PartialVenue, RecordKind, SearchArea,
};
use crate::ports::{
    EnrichmentSource, ExclusionStore, GeoSource, PortError, ReverseGeocoder, RouteOrderer,
};

/// Candidate whose coordinates encode its id, optionally named.
pub(crate) fn record(id: i64, name: Option<&str>) -> CandidateRecord {
    let mut tags = BTreeMap::from([(String::from("amenity"), String::from("pub"))]);
    if let Some(name) = name {
        tags.insert(String::from("name"), name.to_owned());
    }
    CandidateRecord {
        id: CandidateId(id),
        location: location_of(id),
        tags,
        kind: RecordKind::Node,
    }
}

pub(crate) fn location_of(id: i64) -> Coordinates {
    Coordinates {
        latitude: 50.0 + id as f64 / 1000.0,
        longitude: -1.0,
    }
}

pub(crate) fn id_at(at: Coordinates) -> i64 {
    ((at.latitude - 50.0) * 1000.0).round() as i64
}

pub(crate) fn area() -> SearchArea {
    SearchArea::new(51.5074, -0.1278, 500).expect("valid area")
}

/// Geodata backend serving fixed records per category.
#[derive(Default)]
pub(crate) struct StaticGeoSource {
    by_category: HashMap<String, Vec<CandidateRecord>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl StaticGeoSource {
    pub(crate) fn with(mut self, category: &str, records: Vec<CandidateRecord>) -> Self {
        self.by_category.insert(category.to_owned(), records);
        self
    }

    pub(crate) fn failing_on(mut self, category: &str) -> Self {
        self.failing.insert(category.to_owned());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl GeoSource for StaticGeoSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(
        &self,
        _area: &SearchArea,
        category: &str,
    ) -> Result<Vec<CandidateRecord>, PortError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(category.to_owned());
        if self.failing.contains(category) {
            return Err(PortError::BackendUnavailable(format!("{category} is down")));
        }
        Ok(self.by_category.get(category).cloned().unwrap_or_default())
    }
}

/// Geocoder that resolves every position except those of listed ids.
pub(crate) struct MockGeocoder {
    address: Option<String>,
    unresolvable: HashSet<i64>,
    lookups: Mutex<Vec<i64>>,
}

impl MockGeocoder {
    pub(crate) fn resolving(address: &str) -> Self {
        Self {
            address: Some(address.to_owned()),
            unresolvable: HashSet::new(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            address: None,
            unresolvable: HashSet::new(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn except(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.unresolvable.extend(ids);
        self
    }

    /// Ids whose positions were looked up, in call order.
    pub(crate) fn lookups(&self) -> Vec<i64> {
        self.lookups.lock().expect("lookups lock").clone()
    }
}

#[async_trait]
impl ReverseGeocoder for MockGeocoder {
    async fn lookup(&self, at: Coordinates) -> Result<Option<String>, PortError> {
        let id = id_at(at);
        self.lookups.lock().expect("lookups lock").push(id);
        if self.unresolvable.contains(&id) {
            return Ok(None);
        }
        Ok(self.address.clone())
    }
}

/// Exclusion store whose reads and writes can be switched to fail.
#[derive(Default)]
pub(crate) struct FlakyStore {
    inner: MemoryExclusionStore,
    pub(crate) fail_reads: bool,
    pub(crate) fail_writes: bool,
    pub(crate) reads: AtomicUsize,
    pub(crate) writes: AtomicUsize,
}

impl FlakyStore {
    pub(crate) fn with_excluded(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            inner: MemoryExclusionStore::from_ids(ids.into_iter().map(CandidateId)),
            ..Self::default()
        }
    }

    pub(crate) fn contains(&self, id: i64) -> bool {
        self.inner.snapshot().contains(&CandidateId(id))
    }
}

#[async_trait]
impl ExclusionStore for FlakyStore {
    async fn is_excluded(&self, id: CandidateId) -> Result<bool, PortError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(PortError::StoreUnavailable("read refused".into()));
        }
        self.inner.is_excluded(id).await
    }

    async fn exclude(&self, id: CandidateId) -> Result<(), PortError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(PortError::StoreUnavailable("write refused".into()));
        }
        self.inner.exclude(id).await
    }
}

/// Enrichment source returning a fixed result.
pub(crate) struct MockSource {
    name: String,
    result: Result<PartialVenue, String>,
    pub(crate) calls: AtomicUsize,
}

impl MockSource {
    pub(crate) fn hit(name: &str, partial: PartialVenue) -> Self {
        Self {
            name: name.to_owned(),
            result: Ok(partial),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn miss(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_owned(),
            result: Err(reason.to_owned()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EnrichmentSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enrich(&self, _venue_name: &str) -> Result<PartialVenue, PortError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(PortError::SourceMiss)
    }
}

/// Route orderer that reverses, fails, or returns a fixed permutation.
pub(crate) enum MockOrderer {
    Reverse,
    Fixed(Vec<usize>),
    Failing,
}

#[async_trait]
impl RouteOrderer for MockOrderer {
    async fn order(&self, stops: &[Coordinates]) -> Result<Vec<usize>, PortError> {
        match self {
            MockOrderer::Reverse => Ok((0..stops.len()).rev().collect()),
            MockOrderer::Fixed(permutation) => Ok(permutation.clone()),
            MockOrderer::Failing => Err(PortError::BackendUnavailable("no route".into())),
        }
    }
}

//! Process-local exclusion store.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::model::CandidateId;
use crate::ports::{ExclusionStore, PortError};

/// Exclusion set held in memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryExclusionStore {
    ids: Mutex<HashSet<CandidateId>>,
}

impl MemoryExclusionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `ids`.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = CandidateId>) -> Self {
        Self {
            ids: Mutex::new(ids.into_iter().collect()),
        }
    }

    /// Copy of the excluded identifiers. Empty when the lock is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> HashSet<CandidateId> {
        self.lock().map(|ids| ids.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashSet<CandidateId>>, PortError> {
        self.ids
            .lock()
            .map_err(|err| PortError::StoreUnavailable(err.to_string()))
    }
}

#[async_trait]
impl ExclusionStore for MemoryExclusionStore {
    async fn is_excluded(&self, id: CandidateId) -> Result<bool, PortError> {
        Ok(self.lock()?.contains(&id))
    }

    async fn exclude(&self, id: CandidateId) -> Result<(), PortError> {
        self.lock()?.insert(id);
        Ok(())
    }
}

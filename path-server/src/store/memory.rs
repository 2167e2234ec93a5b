//! In-memory request store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::{
    Coordinate, FailureCause, FailureRecord, PathingRecord, RequestToken, Solution, StoredRequest,
};

use super::{RequestStore, StoreError};

#[derive(Debug, Default)]
struct Collections {
    requests: HashMap<RequestToken, PathingRecord>,
    failures: HashMap<RequestToken, FailureRecord>,
}

/// A thread-safe in-memory request store.
///
/// Both collections sit behind one lock, so a lookup sees a consistent pair
/// of documents for a token. Nothing survives a restart.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRequestStore {
    inner: Arc<RwLock<Collections>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pathing record as-is, replacing any existing one.
    pub async fn insert_pathing_record(&self, record: PathingRecord) {
        let mut inner = self.inner.write().await;
        inner.requests.insert(record.token.clone(), record);
    }

    /// Total number of stored documents across both collections.
    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.requests.len() + inner.failures.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn create_provisional(
        &self,
        token: &RequestToken,
        path: &[Coordinate],
    ) -> Result<PathingRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.requests.contains_key(token) || inner.failures.contains_key(token) {
            return Err(StoreError::DuplicateToken(token.clone()));
        }

        let record = PathingRecord::provisional(token.clone(), path.to_vec(), Utc::now());
        inner.requests.insert(token.clone(), record.clone());
        Ok(record)
    }

    async fn finalize(
        &self,
        token: &RequestToken,
        solution: Solution,
    ) -> Result<PathingRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .requests
            .get_mut(token)
            .filter(|r| r.is_in_progress())
            .ok_or_else(|| StoreError::MissingProvisional(token.clone()))?;

        record.conclude_with(solution, Utc::now());
        Ok(record.clone())
    }

    async fn record_failure(
        &self,
        token: &RequestToken,
        cause: &FailureCause,
    ) -> Result<FailureRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.failures.contains_key(token) {
            return Err(StoreError::DuplicateToken(token.clone()));
        }

        let record = FailureRecord::new(token.clone(), cause, Utc::now());
        inner.failures.insert(token.clone(), record.clone());
        Ok(record)
    }

    async fn discard_provisional(&self, token: &RequestToken) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.requests.remove(token);
        Ok(())
    }

    async fn lookup(&self, token: &RequestToken) -> Result<Option<StoredRequest>, StoreError> {
        let mut inner = self.inner.write().await;

        if let Some(failure) = inner.failures.get(token).cloned() {
            if inner.requests.remove(token).is_some() {
                warn!(
                    %token,
                    "found both pathing and failure records; removed stale pathing record"
                );
            }
            return Ok(Some(StoredRequest::Failed(failure)));
        }

        Ok(inner
            .requests
            .get(token)
            .cloned()
            .map(StoredRequest::from_pathing))
    }
}

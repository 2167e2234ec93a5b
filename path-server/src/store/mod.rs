//! Persistence for pathing and failure records.
//!
//! The [`RequestStore`] trait is the only thing the orchestrator and the web
//! layer know about storage. Two backends are provided: an in-memory store
//! and a JSON-document store on disk.

mod file;
mod memory;

use async_trait::async_trait;

use crate::domain::{
    Coordinate, FailureCause, FailureRecord, PathingRecord, RequestToken, Solution, StoredRequest,
};

pub use file::FileRequestStore;
pub use memory::InMemoryRequestStore;

/// Errors from a request store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record already exists for a freshly issued token.
    #[error("a record already exists for token {0}")]
    DuplicateToken(RequestToken),

    /// Finalize was called without an in-progress record.
    #[error("no in-progress record for token {0}")]
    MissingProvisional(RequestToken),

    /// The backing storage could not be read or written.
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    /// Whether this error points at a bug or corrupted data rather than an
    /// operational problem.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateToken(_) | StoreError::MissingProvisional(_)
        )
    }
}

/// Durable storage for request records, keyed by token.
///
/// Pathing records (provisional or final) and failure records are kept as
/// separate documents. `lookup` reconciles them: when both exist for a token
/// the failure wins and the stale pathing record is removed.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Create an in-progress record for a new token.
    async fn create_provisional(
        &self,
        token: &RequestToken,
        path: &[Coordinate],
    ) -> Result<PathingRecord, StoreError>;

    /// Move the in-progress record for `token` to success.
    async fn finalize(
        &self,
        token: &RequestToken,
        solution: Solution,
    ) -> Result<PathingRecord, StoreError>;

    /// Record why the request for `token` failed.
    async fn record_failure(
        &self,
        token: &RequestToken,
        cause: &FailureCause,
    ) -> Result<FailureRecord, StoreError>;

    /// Remove the pathing record for `token`, if there is one.
    async fn discard_provisional(&self, token: &RequestToken) -> Result<(), StoreError>;

    /// Find whatever is recorded for `token`.
    async fn lookup(&self, token: &RequestToken) -> Result<Option<StoredRequest>, StoreError>;
}

#[cfg(test)]
mod conformance;

//! Errors raised after a token has been issued.

use crate::domain::FailureCause;
use crate::solver::SolveError;
use crate::store::StoreError;

/// Message stored when the routing oracle could not produce a route.
pub const ROUTING_FAILURE_MESSAGE: &str = "Something went wrong when querying the routing service";

/// Message stored when persistence failed.
pub const STORAGE_FAILURE_MESSAGE: &str = "Something went wrong when saving request";

/// A failure in the background part of a request.
///
/// Every variant is turned into a failure record for the token. Details are
/// logged; only a generic message is stored for the client.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("persistence failed: {0}")]
    Store(#[from] StoreError),

    #[error("route solving failed: {0}")]
    Solve(#[from] SolveError),

    /// A request reached the background stage without any points.
    #[error("no points to route")]
    EmptyPath,

    /// The pipeline task panicked or was cancelled.
    #[error("request task aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    /// Whether this error indicates a bug or corrupted data.
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            PipelineError::Store(e) => e.is_invariant_violation(),
            PipelineError::Solve(_) => false,
            PipelineError::EmptyPath | PipelineError::Aborted(_) => true,
        }
    }

    /// The client-safe cause recorded for this error.
    pub fn failure_cause(&self) -> FailureCause {
        match self {
            PipelineError::Store(_) => FailureCause::from(STORAGE_FAILURE_MESSAGE),
            PipelineError::Solve(_) => FailureCause::from(ROUTING_FAILURE_MESSAGE),
            PipelineError::EmptyPath | PipelineError::Aborted(_) => FailureCause::Empty,
        }
    }
}

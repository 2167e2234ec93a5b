//! Request orchestration.
//!
//! A submission moves through these stages:
//!
//! ```text
//! validate ──rejected──▶ reply with error, nothing stored
//!    │
//!  issue token ──▶ reply with token
//!    │
//!  (create provisional ‖ solve) ──▶ finalize ──▶ success
//!    │                               │
//!    └──────────── any error ────────┴──▶ record failure, discard provisional
//! ```
//!
//! Everything after token issuance runs in a spawned task; the client polls
//! with the token.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span};

use crate::domain::{
    Coordinate, DEFAULT_MAX_POINTS, PathValidation, Rejection, RequestToken, StoredRequest,
    TokenError, TokenIssuer, validate_path,
};
use crate::solver::RouteSolver;
use crate::store::{RequestStore, StoreError};

use super::error::PipelineError;

/// How a background request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The request was solved and its record finalized.
    Finalized,

    /// The request failed and a failure record was written.
    Failed,

    /// The request failed and the failure record could not be written
    /// either. The token resolves to nothing.
    Unrecorded,
}

/// Result of a submission.
#[derive(Debug)]
pub enum Submission {
    /// Accepted; work continues in `task`.
    Accepted {
        token: RequestToken,
        task: JoinHandle<RequestOutcome>,
    },

    /// Rejected before a token was issued.
    Rejected(Rejection),
}

/// Accepts pathing requests and drives them to a terminal state.
#[derive(Clone)]
pub struct PathingService {
    store: Arc<dyn RequestStore>,
    solver: RouteSolver,
    issuer: TokenIssuer,
    max_points: usize,
}

impl PathingService {
    pub fn new(store: Arc<dyn RequestStore>, solver: RouteSolver, issuer: TokenIssuer) -> Self {
        Self {
            store,
            solver,
            issuer,
            max_points: DEFAULT_MAX_POINTS,
        }
    }

    /// Set the maximum number of points per request.
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Validate a submitted path and, if valid, start processing it.
    ///
    /// Returns as soon as the token is issued. The only error is a token
    /// issuance failure, which happens before anything is stored.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, body: &Value) -> Result<Submission, TokenError> {
        let path = match validate_path(body, self.max_points) {
            PathValidation::Valid(path) => path,
            PathValidation::Rejected(rejection) => {
                debug!(%rejection, "rejecting submission");
                return Ok(Submission::Rejected(rejection));
            }
        };

        let token = self.issuer.issue()?;
        debug!(%token, points = path.len(), "issued token");

        let service = self.clone();
        let span = info_span!("pathing_request", %token);
        let task = tokio::spawn(
            {
                let token = token.clone();
                async move { service.process(token, path).await }
            }
            .instrument(span),
        );

        Ok(Submission::Accepted { token, task })
    }

    /// Find whatever is recorded for `token`.
    pub async fn lookup(&self, token: &RequestToken) -> Result<Option<StoredRequest>, StoreError> {
        self.store.lookup(token).await
    }

    /// Run a request to completion, compensating on failure.
    ///
    /// The pipeline runs in its own task so a panic in it is still
    /// compensated instead of leaving the token in progress.
    pub async fn process(&self, token: RequestToken, path: Vec<Coordinate>) -> RequestOutcome {
        let pipeline = {
            let service = self.clone();
            let token = token.clone();
            tokio::spawn(async move { service.run(&token, &path).await }.in_current_span())
        };

        let result = match pipeline.await {
            Ok(result) => result,
            Err(e) => Err(PipelineError::Aborted(e.to_string())),
        };

        match result {
            Ok(()) => {
                info!(%token, "request finalized");
                RequestOutcome::Finalized
            }
            Err(err) => self.compensate(&token, err).await,
        }
    }

    async fn run(&self, token: &RequestToken, path: &[Coordinate]) -> Result<(), PipelineError> {
        let (&origin, points) = path.split_first().ok_or(PipelineError::EmptyPath)?;

        let (created, solved) = tokio::join!(
            self.store.create_provisional(token, path),
            self.solver.solve(origin, points),
        );

        match (created, solved) {
            (Ok(_), Ok(solution)) => {
                self.store.finalize(token, solution).await?;
                Ok(())
            }
            (Err(store_err), Err(solve_err)) => {
                error!(%token, error = %solve_err, "solving failed alongside persistence");
                Err(store_err.into())
            }
            (Err(store_err), Ok(_)) => Err(store_err.into()),
            (Ok(_), Err(solve_err)) => Err(solve_err.into()),
        }
    }

    /// Record a durable failure for `token` and remove its provisional record.
    ///
    /// The failure record is written first so a poll never lands between the
    /// two writes and finds nothing.
    async fn compensate(&self, token: &RequestToken, err: PipelineError) -> RequestOutcome {
        if err.is_invariant_violation() {
            error!(%token, error = %err, invariant_violation = true, "request failed");
        } else {
            error!(%token, error = %err, "request failed");
        }

        let outcome = match self.store.record_failure(token, &err.failure_cause()).await {
            Ok(_) => {
                debug!(%token, "recorded failure");
                RequestOutcome::Failed
            }
            Err(e) => {
                error!(%token, error = %e, "recording failure failed too");
                RequestOutcome::Unrecorded
            }
        };

        if let Err(e) = self.store.discard_provisional(token).await {
            error!(%token, error = %e, "failed to discard provisional record");
        }

        outcome
    }
}

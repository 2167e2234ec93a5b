//! Orchestration of pathing requests from submission to terminal state.

mod error;
mod pathing;

pub use error::{PipelineError, ROUTING_FAILURE_MESSAGE, STORAGE_FAILURE_MESSAGE};
pub use pathing::{PathingService, RequestOutcome, Submission};

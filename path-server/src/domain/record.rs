//! Persisted request records.
//!
//! A token resolves to at most one of three shapes: an in-progress pathing
//! record, a successful pathing record, or a failure record. Storage keeps
//! pathing and failure documents apart; [`StoredRequest`] is the single view
//! a lookup hands back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::coordinate::Coordinate;
use super::token::RequestToken;

/// Placeholder stored when a failure carries no usable message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error encountered";

/// Lifecycle state of a pathing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    InProgress,
    Success,
}

/// The winning route for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Origin, reordered waypoints, then destination.
    pub path: Vec<Coordinate>,

    /// Total driving distance in meters.
    pub total_distance: u64,

    /// Total driving time in seconds.
    pub total_time: u64,
}

impl Solution {
    /// The solution for a path with nowhere to go.
    pub fn trivial(origin: Coordinate) -> Self {
        Self {
            path: vec![origin],
            total_distance: 0,
            total_time: 0,
        }
    }
}

/// A pathing request, provisional until finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathingRecord {
    pub token: RequestToken,

    /// The submitted path while in progress; the optimized path on success.
    pub path: Vec<Coordinate>,

    pub status: RequestStatus,

    pub total_distance: Option<u64>,

    pub total_time: Option<u64>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl PathingRecord {
    /// A fresh in-progress record stamped with `now`.
    pub fn provisional(token: RequestToken, path: Vec<Coordinate>, now: DateTime<Utc>) -> Self {
        Self {
            token,
            path,
            status: RequestStatus::InProgress,
            total_distance: None,
            total_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to success. `created_at` is kept.
    pub fn conclude_with(&mut self, solution: Solution, now: DateTime<Utc>) {
        self.path = solution.path;
        self.total_distance = Some(solution.total_distance);
        self.total_time = Some(solution.total_time);
        self.status = RequestStatus::Success;
        self.updated_at = now;
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == RequestStatus::InProgress
    }
}

/// A durable explanation for a request that failed after its token was issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub token: RequestToken,

    /// Human-readable, never empty.
    pub message: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl FailureRecord {
    /// Create a failure record, normalizing `cause` into its stored message.
    pub fn new(token: RequestToken, cause: &FailureCause, now: DateTime<Utc>) -> Self {
        Self {
            token,
            message: cause.to_display_message(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// What a lookup found for a token.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredRequest {
    InProgress(PathingRecord),
    Succeeded(PathingRecord),
    Failed(FailureRecord),
}

impl StoredRequest {
    pub fn from_pathing(record: PathingRecord) -> Self {
        match record.status {
            RequestStatus::InProgress => StoredRequest::InProgress(record),
            RequestStatus::Success => StoredRequest::Succeeded(record),
        }
    }
}

/// The reason a request failed, before it is flattened for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// No explanation available.
    Empty,

    /// A plain message.
    Text(String),

    /// Several messages.
    List(Vec<String>),

    /// Named fields, e.g. per-attribute validation errors.
    Fields(Vec<(String, String)>),
}

impl FailureCause {
    /// Flatten into a single non-empty message.
    ///
    /// Lists are joined with `", "`; fields become `"key: value"` pairs
    /// joined the same way. Anything that flattens to blank becomes
    /// [`UNKNOWN_ERROR_MESSAGE`].
    pub fn to_display_message(&self) -> String {
        let message = match self {
            FailureCause::Empty => String::new(),
            FailureCause::Text(text) => text.clone(),
            FailureCause::List(items) => items.join(", "),
            FailureCause::Fields(fields) => fields
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join(", "),
        };

        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

impl From<&str> for FailureCause {
    fn from(s: &str) -> Self {
        FailureCause::Text(s.to_string())
    }
}

impl From<String> for FailureCause {
    fn from(s: String) -> Self {
        FailureCause::Text(s)
    }
}

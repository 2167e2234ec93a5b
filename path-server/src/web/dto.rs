//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Coordinate, RequestToken, StoredRequest};

/// Response to a route submission.
///
/// Rejections are reported in the body with a 200 status; clients tell the
/// two apart by which field is present.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SubmitResponse {
    Accepted { token: RequestToken },
    Rejected { error: String },
}

/// Status of a route request, as seen by a polling client.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status")]
pub enum RequestView {
    #[serde(rename = "in progress")]
    InProgress,

    #[serde(rename = "success")]
    Success {
        /// Points in visiting order
        path: Vec<Coordinate>,

        /// Total distance in meters
        total_distance: u64,

        /// Total driving time in seconds
        total_time: u64,
    },

    #[serde(rename = "failure")]
    Failure { error: String },
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

impl RequestView {
    /// Create from whatever the store holds for a token.
    pub fn from_stored(stored: StoredRequest) -> Self {
        match stored {
            StoredRequest::InProgress(_) => RequestView::InProgress,
            StoredRequest::Succeeded(record) => RequestView::Success {
                path: record.path,
                total_distance: record.total_distance.unwrap_or_default(),
                total_time: record.total_time.unwrap_or_default(),
            },
            StoredRequest::Failed(failure) => RequestView::Failure {
                error: failure.message,
            },
        }
    }
}

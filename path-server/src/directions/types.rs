//! Directions API response DTOs.
//!
//! These map directly onto the Google Directions JSON response. Only the
//! fields the solver needs are required; the rest are optional because the
//! API omits them in many cases.

use serde::{Deserialize, Serialize};

/// Top-level directions response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionsResponse {
    /// `"OK"` on success, otherwise an error code such as `"ZERO_RESULTS"`.
    pub status: String,

    /// Candidate routes. One when no alternatives are requested.
    #[serde(default)]
    pub routes: Vec<Route>,

    /// Detail accompanying a non-OK status.
    pub error_message: Option<String>,
}

impl DirectionsResponse {
    /// An OK response with one route made of `(distance, duration)` legs.
    pub fn single_route(legs: &[(u64, u64)], waypoint_order: Option<Vec<usize>>) -> Self {
        Self {
            status: "OK".to_string(),
            routes: vec![Route {
                legs: legs
                    .iter()
                    .map(|&(distance, duration)| Leg {
                        distance: TextValue::new(distance),
                        duration: TextValue::new(duration),
                    })
                    .collect(),
                waypoint_order,
            }],
            error_message: None,
        }
    }
}

/// One route from origin to destination through all waypoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// One leg per hop: origin to first waypoint, ..., last waypoint to destination.
    #[serde(default)]
    pub legs: Vec<Leg>,

    /// Order in which the submitted waypoints are visited, when optimized.
    pub waypoint_order: Option<Vec<usize>>,
}

/// A single hop of a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    /// Distance in meters.
    pub distance: TextValue,

    /// Duration in seconds.
    pub duration: TextValue,
}

/// A numeric value. The accompanying `text` rendering is not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextValue {
    pub value: u64,
}

impl TextValue {
    pub fn new(value: u64) -> Self {
        Self { value }
    }
}

//! Directions queries and the oracle abstraction.

use async_trait::async_trait;

use crate::domain::Coordinate;

use super::error::DirectionsError;
use super::types::DirectionsResponse;

/// Routes are always driving routes.
const TRAVEL_MODE: &str = "driving";

/// Distances come back in meters either way; this only affects the text.
const UNIT_SYSTEM: &str = "metric";

/// One request to the routing oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsQuery {
    pub origin: Coordinate,
    pub destination: Coordinate,

    /// Intermediate stops, in submission order.
    pub waypoints: Vec<Coordinate>,

    /// Let the oracle reorder `waypoints` to minimize distance.
    pub optimize_waypoints: bool,
}

impl DirectionsQuery {
    /// A driving, metric query with optimizable waypoints.
    pub fn optimized(
        origin: Coordinate,
        destination: Coordinate,
        waypoints: Vec<Coordinate>,
    ) -> Self {
        Self {
            origin,
            destination,
            waypoints,
            optimize_waypoints: true,
        }
    }

    /// The `waypoints` query parameter, or `None` when there are no waypoints.
    pub fn waypoints_param(&self) -> Option<String> {
        if self.waypoints.is_empty() {
            return None;
        }
        let mut parts: Vec<String> = Vec::with_capacity(self.waypoints.len() + 1);
        if self.optimize_waypoints {
            parts.push("optimize:true".to_string());
        }
        parts.extend(self.waypoints.iter().map(Coordinate::to_string));
        Some(parts.join("|"))
    }

    /// All query parameters except credentials, in a fixed order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("origin", self.origin.to_string()),
            ("destination", self.destination.to_string()),
        ];
        if let Some(waypoints) = self.waypoints_param() {
            params.push(("waypoints", waypoints));
        }
        params.push(("mode", TRAVEL_MODE.to_string()));
        params.push(("units", UNIT_SYSTEM.to_string()));
        params
    }

    /// A canonical string identifying this query, used as a cache key.
    pub fn cache_key(&self) -> String {
        self.params()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Something that can answer directions queries.
///
/// This abstraction lets the solver run against the real API, a cache, or
/// a mock.
#[async_trait]
pub trait RoutingOracle: Send + Sync {
    async fn directions(
        &self,
        query: &DirectionsQuery,
    ) -> Result<DirectionsResponse, DirectionsError>;
}

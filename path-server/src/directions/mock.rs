//! Mock routing oracle for testing and running without API access.
//!
//! Answers queries from a caller-supplied function instead of the network.
//! [`MockDirections::straight_line`] gives plausible answers for local
//! development: great-circle distances visited in submission order.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::Coordinate;

use super::error::DirectionsError;
use super::query::{DirectionsQuery, RoutingOracle};
use super::types::DirectionsResponse;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Assumed driving speed for straight-line durations, in meters per second.
const MOCK_SPEED_MPS: f64 = 15.0;

type Responder =
    dyn Fn(&DirectionsQuery) -> Result<DirectionsResponse, DirectionsError> + Send + Sync;

/// Mock oracle that answers from a function.
#[derive(Clone)]
pub struct MockDirections {
    responder: Arc<Responder>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockDirections {
    /// Create a mock that answers every query with `responder`.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&DirectionsQuery) -> Result<DirectionsResponse, DirectionsError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A mock that routes in straight lines, keeping waypoint order.
    pub fn straight_line() -> Self {
        Self::new(|query| Ok(straight_line_response(query)))
    }

    /// A mock whose every call fails with an `Unavailable` error.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(DirectionsError::Unavailable(message.clone())))
    }

    /// Sleep for `delay` before answering each query.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of queries received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for MockDirections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDirections")
            .field("delay", &self.delay)
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RoutingOracle for MockDirections {
    async fn directions(
        &self,
        query: &DirectionsQuery,
    ) -> Result<DirectionsResponse, DirectionsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(query)
    }
}

/// Great-circle distance between two coordinates, in meters.
pub fn haversine_meters(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lat2) = (a.lat().to_radians(), b.lat().to_radians());
    let dlat = lat2 - lat1;
    let dlng = (b.lng() - a.lng()).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

fn straight_line_response(query: &DirectionsQuery) -> DirectionsResponse {
    let stops: Vec<Coordinate> = std::iter::once(query.origin)
        .chain(query.waypoints.iter().copied())
        .chain(std::iter::once(query.destination))
        .collect();

    let legs: Vec<(u64, u64)> = stops
        .windows(2)
        .map(|pair| {
            let meters = haversine_meters(pair[0], pair[1]);
            (meters.round() as u64, (meters / MOCK_SPEED_MPS).round() as u64)
        })
        .collect();

    let order = query
        .optimize_waypoints
        .then(|| (0..query.waypoints.len()).collect());

    DirectionsResponse::single_route(&legs, order)
}

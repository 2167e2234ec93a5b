//! Routing oracle client.
//!
//! The solver asks the oracle for a driving route from an origin to a
//! destination through a set of waypoints, letting it choose the waypoint
//! order. This module provides the [`RoutingOracle`] abstraction, the Google
//! Directions implementation, and a mock.

mod client;
mod error;
mod mock;
mod query;
mod types;

pub use client::{DirectionsConfig, GoogleDirectionsClient};
pub use error::DirectionsError;
pub use mock::{MockDirections, haversine_meters};
pub use query::{DirectionsQuery, RoutingOracle};
pub use types::{DirectionsResponse, Leg, Route, TextValue};

//! Shortest visiting order via the routing oracle.
//!
//! For a path `[origin, p1, ..., pn]` the solver tries every `pi` as the
//! final destination, letting the oracle optimize the order of the remaining
//! points, and keeps the candidate with the smallest total distance.

mod config;
mod solve;

pub use config::SolverConfig;
pub use solve::{RouteSolver, SolveError, candidate_queries};

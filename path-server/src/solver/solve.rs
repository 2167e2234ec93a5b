//! Candidate fan-out and selection.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, error, info};

use crate::directions::{DirectionsQuery, DirectionsResponse, RoutingOracle};
use crate::domain::{Coordinate, Solution};

use super::config::SolverConfig;

/// Error from solving a path.
///
/// Deliberately opaque: it names the failing candidate but carries none of
/// the oracle's error details. Those are logged where they occur.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    /// The oracle returned an error for a candidate.
    #[error("routing query for candidate {candidate} failed")]
    Oracle { candidate: usize },

    /// A candidate query exceeded the per-call timeout.
    #[error("routing query for candidate {candidate} timed out")]
    Timeout { candidate: usize },

    /// The oracle answered with something the solver cannot use.
    #[error("routing response for candidate {candidate} was malformed")]
    MalformedResponse { candidate: usize },
}

/// A scored candidate route.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    distance: u64,
    time: u64,
    path: Vec<Coordinate>,
}

/// Build one query per point, each trying that point as the destination.
///
/// Query `i` has `points[i]` as destination and every other point, in
/// submission order, as an optimizable waypoint.
pub fn candidate_queries(origin: Coordinate, points: &[Coordinate]) -> Vec<DirectionsQuery> {
    points
        .iter()
        .enumerate()
        .map(|(i, &destination)| {
            let waypoints = points
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &p)| p)
                .collect();
            DirectionsQuery::optimized(origin, destination, waypoints)
        })
        .collect()
}

/// Score a response against the query that produced it.
fn score(
    query: &DirectionsQuery,
    response: &DirectionsResponse,
) -> Result<Candidate, &'static str> {
    let route = response.routes.first().ok_or("response has no routes")?;

    if route.legs.len() != query.waypoints.len() + 1 {
        return Err("leg count does not match waypoint count");
    }

    let order: Vec<usize> = match &route.waypoint_order {
        Some(order) => order.clone(),
        None if query.waypoints.is_empty() => Vec::new(),
        None => return Err("missing waypoint order"),
    };

    if !is_permutation(&order, query.waypoints.len()) {
        return Err("waypoint order is not a permutation of the waypoints");
    }

    let distance = checked_total(route.legs.iter().map(|l| l.distance.value))
        .ok_or("total distance overflows")?;
    let time = checked_total(route.legs.iter().map(|l| l.duration.value))
        .ok_or("total duration overflows")?;

    let path = std::iter::once(query.origin)
        .chain(order.iter().map(|&j| query.waypoints[j]))
        .chain(std::iter::once(query.destination))
        .collect();

    Ok(Candidate {
        distance,
        time,
        path,
    })
}

/// Sum of leg values, or `None` if it does not fit in a `u64`.
fn checked_total(mut values: impl Iterator<Item = u64>) -> Option<u64> {
    values.try_fold(0u64, u64::checked_add)
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in order {
        match seen.get_mut(i) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

/// Index of the shortest candidate. Ties go to the lowest index.
fn select_best(candidates: &[Candidate]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, u64)>, (i, c)| match best {
            Some((_, d)) if d <= c.distance => best,
            _ => Some((i, c.distance)),
        })
        .map(|(i, _)| i)
}

/// Finds the shortest visiting order for a path.
#[derive(Clone)]
pub struct RouteSolver {
    oracle: Arc<dyn RoutingOracle>,
    config: SolverConfig,
}

impl RouteSolver {
    pub fn new(oracle: Arc<dyn RoutingOracle>, config: SolverConfig) -> Self {
        Self { oracle, config }
    }

    /// Solve for the best route from `origin` visiting every point in `points`.
    ///
    /// All candidate queries run concurrently. If any of them fails, times
    /// out, or returns an unusable answer, the whole solve fails: a missing
    /// candidate could have been the shortest.
    ///
    /// With no points there is nothing to route, and the result is the
    /// origin alone at zero distance and time.
    pub async fn solve(
        &self,
        origin: Coordinate,
        points: &[Coordinate],
    ) -> Result<Solution, SolveError> {
        if points.is_empty() {
            debug!("no destinations; returning trivial solution");
            return Ok(Solution::trivial(origin));
        }

        let queries = candidate_queries(origin, points);
        info!(candidates = queries.len(), "dispatching directions queries");

        let candidates = try_join_all(
            queries
                .iter()
                .enumerate()
                .map(|(i, q)| self.run_candidate(i, q)),
        )
        .await?;

        debug!("directions queries all returned");

        let best =
            select_best(&candidates).ok_or(SolveError::MalformedResponse { candidate: 0 })?;
        let Candidate {
            distance,
            time,
            path,
        } = candidates
            .into_iter()
            .nth(best)
            .ok_or(SolveError::MalformedResponse { candidate: best })?;

        debug!(best, distance, time, "selected shortest candidate");

        Ok(Solution {
            path,
            total_distance: distance,
            total_time: time,
        })
    }

    async fn run_candidate(
        &self,
        candidate: usize,
        query: &DirectionsQuery,
    ) -> Result<Candidate, SolveError> {
        let response =
            match tokio::time::timeout(self.config.oracle_timeout, self.oracle.directions(query))
                .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    error!(candidate, error = %e, "directions query failed");
                    return Err(SolveError::Oracle { candidate });
                }
                Err(_) => {
                    error!(
                        candidate,
                        timeout_ms = self.config.oracle_timeout.as_millis() as u64,
                        "directions query timed out"
                    );
                    return Err(SolveError::Timeout { candidate });
                }
            };

        score(query, &response).map_err(|reason| {
            error!(candidate, reason, "unusable directions response");
            SolveError::MalformedResponse { candidate }
        })
    }
}

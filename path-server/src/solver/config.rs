//! Solver configuration.

use std::time::Duration;

/// Default bound on a single routing oracle call.
const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the route solver.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Upper bound on each candidate query. A candidate that takes longer
    /// fails the whole solve.
    pub oracle_timeout: Duration,
}

impl SolverConfig {
    pub fn new(oracle_timeout: Duration) -> Self {
        Self { oracle_timeout }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        assert_eq!(SolverConfig::default().oracle_timeout, Duration::from_secs(10));
    }

    #[test]
    fn custom_config() {
        let config = SolverConfig::new(Duration::from_millis(250));
        assert_eq!(config.oracle_timeout, Duration::from_millis(250));
    }
}

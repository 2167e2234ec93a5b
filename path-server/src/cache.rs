//! Caching layer for routing oracle responses.
//!
//! Identical candidate queries recur whenever the same set of points is
//! submitted again. Successful responses are cached by the full query so
//! repeats cost no API calls. Errors are never cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::directions::{DirectionsError, DirectionsQuery, DirectionsResponse, RoutingOracle};

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            max_capacity: 1000,
        }
    }
}

/// Routing oracle with a response cache in front.
pub struct CachedOracle {
    inner: Arc<dyn RoutingOracle>,
    responses: MokaCache<String, Arc<DirectionsResponse>>,
}

impl CachedOracle {
    /// Wrap `inner` with a cache built from `config`.
    pub fn new(inner: Arc<dyn RoutingOracle>, config: &CacheConfig) -> Self {
        let responses = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, responses }
    }
}

#[async_trait]
impl RoutingOracle for CachedOracle {
    async fn directions(
        &self,
        query: &DirectionsQuery,
    ) -> Result<DirectionsResponse, DirectionsError> {
        let key = query.cache_key();

        if let Some(cached) = self.responses.get(&key).await {
            trace!(%key, "directions cache hit");
            return Ok((*cached).clone());
        }

        let response = self.inner.directions(query).await?;
        self.responses
            .insert(key, Arc::new(response.clone()))
            .await;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directions::MockDirections;
    use crate::domain::Coordinate;

    fn query(dest_lat: f64) -> DirectionsQuery {
        DirectionsQuery::optimized(
            Coordinate::new(0.0, 0.0).unwrap(),
            Coordinate::new(dest_lat, 0.0).unwrap(),
            vec![],
        )
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.max_capacity, 1000);
    }

    #[tokio::test]
    async fn repeated_query_hits_cache() {
        let mock = MockDirections::straight_line();
        let cached = CachedOracle::new(Arc::new(mock.clone()), &CacheConfig::default());

        let first = cached.directions(&query(1.0)).await.unwrap();
        let second = cached.directions(&query(1.0)).await.unwrap();

        assert_eq!(mock.calls(), 1);
        assert_eq!(
            first.routes[0].legs[0].distance,
            second.routes[0].legs[0].distance
        );
    }

    #[tokio::test]
    async fn different_queries_miss() {
        let mock = MockDirections::straight_line();
        let cached = CachedOracle::new(Arc::new(mock.clone()), &CacheConfig::default());

        cached.directions(&query(1.0)).await.unwrap();
        cached.directions(&query(2.0)).await.unwrap();

        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let mock = MockDirections::failing("down");
        let cached = CachedOracle::new(Arc::new(mock.clone()), &CacheConfig::default());

        assert!(cached.directions(&query(1.0)).await.is_err());
        assert!(cached.directions(&query(1.0)).await.is_err());
        assert_eq!(mock.calls(), 2);
    }
}

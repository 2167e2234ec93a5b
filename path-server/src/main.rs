use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use path_server::cache::{CacheConfig, CachedOracle};
use path_server::config::ServerConfig;
use path_server::directions::{
    DirectionsConfig, GoogleDirectionsClient, MockDirections, RoutingOracle,
};
use path_server::domain::TokenIssuer;
use path_server::service::PathingService;
use path_server::solver::{RouteSolver, SolverConfig};
use path_server::store::{FileRequestStore, InMemoryRequestStore, RequestStore};
use path_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .init();

    let config = ServerConfig::from_env().expect("Invalid configuration");

    // Routing oracle, falling back to straight lines without a key
    let oracle: Arc<dyn RoutingOracle> = match &config.api_key {
        Some(key) => {
            let directions_config = DirectionsConfig::new(key)
                .with_max_concurrent(config.oracle_max_concurrent)
                .with_timeout(config.oracle_timeout.as_secs());
            Arc::new(
                GoogleDirectionsClient::new(directions_config)
                    .expect("Failed to create directions client"),
            )
        }
        None => {
            warn!("G_API_KEY not set; routing in straight lines");
            Arc::new(MockDirections::straight_line())
        }
    };
    let oracle = Arc::new(CachedOracle::new(oracle, &CacheConfig::default()));

    let store: Arc<dyn RequestStore> = match &config.store_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "using file store");
            Arc::new(
                FileRequestStore::open(dir)
                    .await
                    .expect("Failed to open request store"),
            )
        }
        None => {
            info!("using in-memory store; requests are lost on restart");
            Arc::new(InMemoryRequestStore::new())
        }
    };

    let solver = RouteSolver::new(oracle, SolverConfig::new(config.oracle_timeout));
    let service =
        PathingService::new(store, solver, TokenIssuer::new()).with_max_points(config.max_points);

    let app = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    info!(addr = %config.bind_addr, "path server listening");
    info!("  GET  /health         - Health check");
    info!("  POST /route          - Submit a path");
    info!("  GET  /route/:token   - Poll a submitted path");

    axum::serve(listener, app).await.expect("Server error");
}

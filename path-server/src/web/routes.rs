//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::domain::{Rejection, RequestToken};
use crate::service::Submission;
use crate::store::StoreError;

use super::dto::*;
use super::state::AppState;

/// Message returned when a token cannot be generated.
pub const TOKEN_FAILURE_MESSAGE: &str = "Error generating request token";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/route", post(submit_route))
        .route("/route/:token", get(route_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Submit a path for routing.
///
/// The body is parsed by hand so that non-JSON input gets the same
/// response as a JSON body of the wrong shape.
async fn submit_route(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubmitResponse>, AppError> {
    let Ok(body) = serde_json::from_slice::<Value>(&body) else {
        return Ok(Json(SubmitResponse::Rejected {
            error: Rejection::Malformed.to_string(),
        }));
    };

    let submission = state.pathing.submit(&body).map_err(|e| {
        error!(error = %e, "token issuance failed");
        AppError::Internal {
            message: TOKEN_FAILURE_MESSAGE.to_string(),
        }
    })?;

    let response = match submission {
        // The task runs on; the client polls for the outcome.
        Submission::Accepted { token, task: _ } => SubmitResponse::Accepted { token },
        Submission::Rejected(rejection) => SubmitResponse::Rejected {
            error: rejection.to_string(),
        },
    };

    Ok(Json(response))
}

/// Report the status of a submitted path.
async fn route_status(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<RequestView>, AppError> {
    let not_found = || AppError::NotFound {
        message: format!("No request found for token {token}"),
    };

    let token = RequestToken::parse(&token).map_err(|_| not_found())?;
    let stored = state
        .pathing
        .lookup(&token)
        .await
        .map_err(AppError::from)?
        .ok_or_else(not_found)?;

    Ok(Json(RequestView::from_stored(stored)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    Internal { message: String },
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        error!(error = %e, "store lookup failed");
        AppError::Internal {
            message: "Something went wrong when reading request".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request failed");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, header};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::directions::{DirectionsResponse, MockDirections};
    use crate::domain::{EntropySource, TokenIssuer};
    use crate::service::PathingService;
    use crate::solver::{RouteSolver, SolverConfig};
    use crate::store::InMemoryRequestStore;

    fn app_with(oracle: MockDirections, issuer: TokenIssuer) -> Router {
        let solver = RouteSolver::new(Arc::new(oracle), SolverConfig::default());
        let service = PathingService::new(Arc::new(InMemoryRequestStore::new()), solver, issuer);
        create_router(AppState::new(service))
    }

    fn app(oracle: MockDirections) -> Router {
        app_with(oracle, TokenIssuer::new())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_route(body: impl Into<Body>) -> Request<Body> {
        Request::post("/route")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    fn get_route(token: &str) -> Request<Body> {
        Request::get(format!("/route/{token}"))
            .body(Body::empty())
            .unwrap()
    }

    /// Poll until the request leaves the in-progress state.
    async fn settled(app: &Router, token: &str) -> (StatusCode, Value) {
        loop {
            let (status, body) = send(app, get_route(token)).await;
            if body["status"] != "in progress" {
                return (status, body);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = app(MockDirections::straight_line());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn submit_then_poll_success() {
        let oracle = MockDirections::new(|_| {
            Ok(DirectionsResponse::single_route(&[(500, 600)], Some(vec![])))
        });
        let app = app(oracle);

        let (status, body) = send(&app, post_route(r#"[[1,2],[7,8]]"#)).await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();
        assert_eq!(token.len(), 36);

        let (status, body) = settled(&app, &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "path": [[1.0, 2.0], [7.0, 8.0]],
                "total_distance": 500,
                "total_time": 600
            })
        );
    }

    #[tokio::test]
    async fn submit_then_poll_failure() {
        let app = app(MockDirections::failing("quota exceeded"));

        let (_, body) = send(&app, post_route(r#"[[1,2],[7,8]]"#)).await;
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = settled(&app, &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "failure");
        assert_eq!(
            body["error"],
            "Something went wrong when querying the routing service"
        );
    }

    #[tokio::test]
    async fn too_many_points() {
        let app = app(MockDirections::straight_line());
        let points: Vec<Value> = (0..30).map(|_| json!([1, 2])).collect();

        let (status, body) = send(&app, post_route(Value::Array(points).to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"error": "Too many points; maximum point count is 23"})
        );
    }

    #[tokio::test]
    async fn malformed_bodies() {
        let app = app(MockDirections::straight_line());

        for raw in [r#"[[1,2],[2,3,3]]"#, r#"{"a":1}"#, "not json", ""] {
            let (status, body) = send(&app, post_route(raw)).await;
            assert_eq!(status, StatusCode::OK, "{raw}");
            assert_eq!(body, json!({"error": "Invalid body input format"}), "{raw}");
        }
    }

    #[tokio::test]
    async fn token_failure_is_server_error() {
        struct Exhausted;

        impl EntropySource for Exhausted {
            fn fill(&self, _buf: &mut [u8]) -> Result<(), rand::Error> {
                Err(rand::Error::new("entropy exhausted"))
            }
        }

        let app = app_with(
            MockDirections::straight_line(),
            TokenIssuer::with_source(Exhausted),
        );

        let (status, body) = send(&app, post_route(r#"[[1,2],[7,8]]"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Error generating request token"}));
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let app = app(MockDirections::straight_line());

        let (status, body) = send(&app, get_route("nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn unsafe_token_is_not_found() {
        let app = app(MockDirections::straight_line());

        let (status, _) = send(&app, get_route("a%20b")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

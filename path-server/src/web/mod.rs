//! Web layer for the path server.
//!
//! Provides HTTP endpoints for submitting paths and polling their status.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::create_router;
pub use state::AppState;

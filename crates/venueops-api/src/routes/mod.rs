//! HTTP route handlers.

pub mod health;
pub mod tasks;

use axum::Router;

use crate::server::AppState;

/// Routes behind the bearer token gate.
pub fn authenticated_routes() -> Router<AppState> {
    tasks::routes()
}

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    health::routes()
}

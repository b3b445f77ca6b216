// Store Probe API Library
// Decision: Shared library for the server binary and router tests

pub mod config;
pub mod error;
pub mod home;
pub mod views;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the application router
pub fn app(home_state: home::AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(home::routes(home_state))
        .layer(TraceLayer::new_for_http())
}

// src/handlers/mod.rs
pub mod process;
pub mod ui;

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::middleware;
use crate::AppState;

/// All routes with logging, panic-to-500, CORS and shared state applied.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(ui::ui_routes(&state.config.static_dir))
        .merge(process::process_routes())
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CatchPanicLayer::custom(middleware::logging::panic_response))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

pub mod routes;
pub mod ws;

use crate::state::AppState;
use axum::routing::{get, post};
use std::sync::Arc;

/// JSON API, reload socket and the static dashboard shell.
pub fn router(state: Arc<AppState>) -> axum::Router {
    let static_dir = &state.config.static_dir;
    let index = static_dir.join("index.html");

    axum::Router::new()
        .route("/api/dashboard", get(routes::get_dashboard))
        .route("/api/statistics", get(routes::get_statistics))
        .route("/api/monthly", get(routes::get_monthly))
        .route("/api/years", get(routes::get_years))
        .route("/api/dataset", get(routes::get_dataset))
        .route("/api/reload", post(routes::post_reload))
        .route("/api/counters", get(routes::get_counters))
        .route("/ws", get(ws::ws_handler))
        .fallback_service(
            tower_http::services::ServeDir::new(static_dir)
                .fallback(tower_http::services::ServeFile::new(index)),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

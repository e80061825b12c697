use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

use db::MatchStore;

/// Full HTTP application over the given store.
pub fn app(store: Arc<dyn MatchStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::router(store)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

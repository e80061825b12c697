use std::sync::Arc;

use axum::{routing::get, Router};

use crate::db::MatchStore;

pub mod health;
pub mod matches;

/// Shared by every handler. The store client is built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MatchStore>,
}

pub fn router(store: Arc<dyn MatchStore>) -> Router {
    Router::new()
        // Root and health
        .route("/", get(|| async { "Tennis Matches API - v1.0" }))
        .route("/health", get(health::health_check))

        // Match endpoints
        .route(
            "/partidos",
            get(matches::list_matches).post(matches::create_match),
        )
        .route(
            "/partidos/{id}",
            get(matches::get_match).delete(matches::delete_match),
        )

        .with_state(AppState { store })
}

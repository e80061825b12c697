use axum::{http::StatusCode, response::Json};
use chrono::{Local, SecondsFormat};

use crate::models::HealthResponse;

// GET /health - Liveness probe, never touches the store
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    tracing::info!("Health check requested");

    let response = HealthResponse {
        status: "ok".to_string(),
        message: "API de Tenis funcionando correctamente".to_string(),
        timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
    };

    (StatusCode::OK, Json(response))
}

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Local;

use crate::error::ApiError;
use crate::models::{ListMatchesQuery, Match, MessageResponse, NewMatch};
use crate::routes::AppState;

// POST /partidos - Record a new match
pub async fn create_match(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Match>), ApiError> {
    tracing::info!("Creating new tennis match");

    // Content type is not enforced, the raw body must be a JSON object.
    let payload = NewMatch::from_json(&body).map_err(|_| ApiError::InvalidBody)?;
    let record = Match::new(payload.validate()?, Local::now());

    let created = state.store.create(&record).await?;
    tracing::info!("Match created with ID: {}", created.id);

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /partidos?jugador=Nadal - List matches, newest first
pub async fn list_matches(
    State(state): State<AppState>,
    Query(params): Query<ListMatchesQuery>,
) -> Result<Json<Vec<Match>>, ApiError> {
    let filter = params.player_filter();
    match filter {
        Some(player) => tracing::info!("Listing matches for player filter '{}'", player),
        None => tracing::info!("Listing all matches"),
    }

    let matches = state.store.list(filter).await?;
    tracing::info!("Found {} matches", matches.len());

    Ok(Json(matches))
}

// GET /partidos/{id} - Get a single match
pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Match>, ApiError> {
    tracing::info!("Fetching match with ID: {}", id);

    let record = state.store.get(&id).await?;

    Ok(Json(record))
}

// DELETE /partidos/{id} - Remove a match
pub async fn delete_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    tracing::info!("Deleting match with ID: {}", id);

    state.store.delete(&id).await?;

    Ok(Json(MessageResponse {
        message: format!("Partido con ID '{}' eliminado correctamente", id),
    }))
}

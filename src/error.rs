use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::db::StoreError;
use crate::models::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Body JSON inválido")]
    InvalidBody,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Partido con ID '{0}' no encontrado")]
    NotFound(String),

    #[error("Error en la base de datos: {0}")]
    Store(StoreError),

    #[error("Error interno del servidor")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Store(err) => tracing::error!("Document store error: {}", err),
            ApiError::Internal(detail) => tracing::error!("Unexpected error: {}", detail),
            _ => {}
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (self.status(), body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(id),
            StoreError::Decode(detail) => ApiError::Internal(detail),
            other => ApiError::Store(other),
        }
    }
}

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use sched_core::{Conflict, ValidationError};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    NotReady(String),
    Failed(String),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<Conflict> for ApiError {
    fn from(e: Conflict) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::NotReady(m) => (StatusCode::CONFLICT, m),
            ApiError::Failed(m) => (StatusCode::UNPROCESSABLE_ENTITY, m),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

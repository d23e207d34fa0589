//! API route handlers.

pub mod auth;
pub mod welcome;

use crate::auth::middleware::AppState;
use crate::error::AppError;
use axum::extract::rejection::JsonRejection;
use axum::{routing::get, routing::post, Json, Router};

/// Unwrap a JSON body, reporting any rejection as 400 Bad Request.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))
}

/// Build the API router with all endpoints.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Auth endpoints
        .route("/register", post(auth::register))
        .route("/users/{address}/nonce", get(auth::user_nonce))
        .route("/signin", post(auth::signin))
        // Protected endpoints
        .route("/welcome", get(welcome::welcome))
}

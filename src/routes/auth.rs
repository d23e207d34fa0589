//! Auth API endpoints.

use crate::auth::middleware::AppState;
use crate::auth::protocol;
use crate::error::AppError;
use crate::models::{NonceResponse, RegisterRequest, SigninRequest, SigninResponse};
use crate::routes::json_body;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// POST /register — Register an address
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = json_body(body)?;
    protocol::register(&state, &req.address)?;
    Ok(StatusCode::CREATED)
}

/// GET /users/{address}/nonce — Fetch the nonce to sign
pub async fn user_nonce(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let nonce = protocol::get_nonce(&state, &address)?;
    Ok(Json(NonceResponse { nonce }))
}

/// POST /signin — Exchange a signed nonce for an access token
pub async fn signin(
    State(state): State<AppState>,
    body: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = json_body(body)?;

    // Signature recovery is CPU-bound; keep it off the async workers.
    let access_token = tokio::task::spawn_blocking(move || protocol::sign_in(&state, &req))
        .await
        .map_err(|e| AppError::Internal(format!("Sign-in task failed: {}", e)))??;

    Ok(Json(SigninResponse { access_token }))
}

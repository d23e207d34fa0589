//! Protected greeting endpoint.

use crate::auth::middleware::AuthenticatedUser;
use crate::models::WelcomeResponse;
use axum::Json;

/// GET /welcome — Requires a valid bearer token
pub async fn welcome(AuthenticatedUser(user): AuthenticatedUser) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        msg: format!("Congrats {} you made it", user.address),
    })
}

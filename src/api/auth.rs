use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use super::extract::{CurrentUser, JsonBody};
use crate::infrastructure::AppState;
use crate::services::user_service;

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> impl IntoResponse {
    tracing::info!("Login attempt for: {}", payload.email);

    match user_service::login(state.db(), &payload.email, &payload.password).await {
        Ok(token) => (StatusCode::OK, Json(json!({ "auth_token": token }))).into_response(),
        Err(e) => e.into_response(),
    }
}

// Tokens are stateless, there is nothing to revoke server-side
pub async fn logout(user: CurrentUser) -> impl IntoResponse {
    tracing::info!("User {} logged out", user.id());
    StatusCode::NO_CONTENT
}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use super::extract::{CurrentUser, JsonBody};
use super::pagination::{ListQuery, Page};
use crate::infrastructure::AppState;
use crate::services::subscription_service;
use crate::services::user_service::{self, RegisterInput, UserDto};

#[derive(Deserialize)]
pub struct SetPasswordRequest {
    current_password: String,
    new_password: String,
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Paginated users")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    query: ListQuery,
) -> impl IntoResponse {
    let request = query.page_request(state.page_size);
    let viewer = viewer.map(|u| u.id());

    match user_service::list_users(state.db(), viewer, request).await {
        Ok(users) => Json(Page::new(&query, request, users)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterInput>,
) -> impl IntoResponse {
    match user_service::register(state.db(), payload).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let viewer = viewer.map(|u| u.id());
    match user_service::get_user(state.db(), viewer, id).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(UserDto::from_model(user, false))
}

pub async fn set_password(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(payload): JsonBody<SetPasswordRequest>,
) -> impl IntoResponse {
    match user_service::set_password(
        state.db(),
        user.id(),
        &payload.current_password,
        &payload.new_password,
    )
    .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn subscriptions(
    State(state): State<AppState>,
    user: CurrentUser,
    query: ListQuery,
) -> impl IntoResponse {
    let request = query.page_request(state.page_size);
    let recipes_limit = query.number::<usize>("recipes_limit");

    match subscription_service::list_subscriptions(
        state.db(),
        &state.media,
        user.id(),
        request,
        recipes_limit,
    )
    .await
    {
        Ok(authors) => Json(Page::new(&query, request, authors)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn subscribe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(author_id): Path<i32>,
    query: ListQuery,
) -> impl IntoResponse {
    let recipes_limit = query.number::<usize>("recipes_limit");

    match subscription_service::subscribe(
        state.db(),
        &state.media,
        user.id(),
        author_id,
        recipes_limit,
    )
    .await
    {
        Ok(author) => (StatusCode::CREATED, Json(author)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(author_id): Path<i32>,
) -> impl IntoResponse {
    match subscription_service::unsubscribe(state.db(), user.id(), author_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

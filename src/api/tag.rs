use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::DatabaseConnection;

use super::extract::{AdminUser, JsonBody};
use crate::services::tag_service::{self, TagInput, TagPatch};

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "All tags ordered by name")
    )
)]
pub async fn list_tags(State(db): State<DatabaseConnection>) -> impl IntoResponse {
    match tag_service::list_tags(&db).await {
        Ok(tags) => Json(tags).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    params(("id" = i32, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Tag"),
        (status = 404, description = "Tag not found")
    )
)]
pub async fn get_tag(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match tag_service::get_tag(&db, id).await {
        Ok(tag) => Json(tag).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_tag(
    State(db): State<DatabaseConnection>,
    _admin: AdminUser,
    JsonBody(payload): JsonBody<TagInput>,
) -> impl IntoResponse {
    match tag_service::create_tag(&db, payload).await {
        Ok(tag) => (StatusCode::CREATED, Json(tag)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_tag(
    State(db): State<DatabaseConnection>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<TagPatch>,
) -> impl IntoResponse {
    match tag_service::update_tag(&db, id, payload).await {
        Ok(tag) => Json(tag).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_tag(
    State(db): State<DatabaseConnection>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match tag_service::delete_tag(&db, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

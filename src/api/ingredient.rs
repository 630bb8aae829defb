use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::DatabaseConnection;

use super::extract::{AdminUser, JsonBody};
use super::pagination::ListQuery;
use crate::services::ingredient_service::{self, IngredientInput, IngredientPatch};

#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(("name" = Option<String>, Query, description = "Case-insensitive name prefix")),
    responses(
        (status = 200, description = "Ingredients ordered by name")
    )
)]
pub async fn list_ingredients(
    State(db): State<DatabaseConnection>,
    query: ListQuery,
) -> impl IntoResponse {
    match ingredient_service::list_ingredients(&db, query.get("name")).await {
        Ok(ingredients) => Json(ingredients).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    params(("id" = i32, Path, description = "Ingredient id")),
    responses(
        (status = 200, description = "Ingredient"),
        (status = 404, description = "Ingredient not found")
    )
)]
pub async fn get_ingredient(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match ingredient_service::get_ingredient(&db, id).await {
        Ok(ingredient) => Json(ingredient).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_ingredient(
    State(db): State<DatabaseConnection>,
    _admin: AdminUser,
    JsonBody(payload): JsonBody<IngredientInput>,
) -> impl IntoResponse {
    match ingredient_service::create_ingredient(&db, payload).await {
        Ok(ingredient) => (StatusCode::CREATED, Json(ingredient)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_ingredient(
    State(db): State<DatabaseConnection>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<IngredientPatch>,
) -> impl IntoResponse {
    match ingredient_service::update_ingredient(&db, id, payload).await {
        Ok(ingredient) => Json(ingredient).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_ingredient(
    State(db): State<DatabaseConnection>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match ingredient_service::delete_ingredient(&db, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

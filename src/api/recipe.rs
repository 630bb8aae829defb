use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use super::extract::{CurrentUser, JsonBody};
use super::pagination::{ListQuery, Page};
use crate::infrastructure::AppState;
use crate::services::membership_service::{self, RecipeList};
use crate::services::recipe_service::{self, RecipeFilter, RecipeInput, RecipePatch};
use crate::services::shopping_list_service::{self, PDF_FILENAME, TEXT_FILENAME};

#[utoipa::path(
    get,
    path = "/api/recipes",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size"),
        ("author" = Option<i32>, Query, description = "Author id"),
        ("tags" = Option<Vec<String>>, Query, description = "Tag slugs, any of them matches"),
        ("is_favorited" = Option<String>, Query, description = "1 to show only favorites"),
        ("is_in_shopping_cart" = Option<String>, Query, description = "1 to show only cart recipes")
    ),
    responses(
        (status = 200, description = "Paginated recipes, newest first")
    )
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    query: ListQuery,
) -> impl IntoResponse {
    let request = query.page_request(state.page_size);
    let filter = RecipeFilter {
        author: query.number("author"),
        tags: query.all("tags"),
        is_favorited: query.flag("is_favorited"),
        is_in_shopping_cart: query.flag("is_in_shopping_cart"),
    };
    let viewer = viewer.map(|u| u.id());

    match recipe_service::list_recipes(state.db(), &state.media, viewer, filter, request).await {
        Ok(recipes) => Json(Page::new(&query, request, recipes)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(("id" = i32, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Full recipe"),
        (status = 404, description = "Recipe not found")
    )
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let viewer = viewer.map(|u| u.id());
    match recipe_service::get_recipe(state.db(), &state.media, viewer, id).await {
        Ok(recipe) => Json(recipe).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(payload): JsonBody<RecipeInput>,
) -> impl IntoResponse {
    match recipe_service::create_recipe(state.db(), &state.media, user.id(), payload).await {
        Ok(recipe) => (StatusCode::CREATED, Json(recipe)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<RecipePatch>,
) -> impl IntoResponse {
    match recipe_service::update_recipe(state.db(), &state.media, user.actor(), id, payload).await
    {
        Ok(recipe) => Json(recipe).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match recipe_service::delete_recipe(state.db(), &state.media, user.actor(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn add_to(state: &AppState, user: &CurrentUser, id: i32, list: RecipeList) -> Response {
    match membership_service::add_recipe(state.db(), &state.media, user.id(), id, list).await {
        Ok(recipe) => (StatusCode::CREATED, Json(recipe)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn remove_from(
    state: &AppState,
    user: &CurrentUser,
    id: i32,
    list: RecipeList,
) -> Response {
    match membership_service::remove_recipe(state.db(), user.id(), id, list).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn add_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    add_to(&state, &user, id, RecipeList::Favorites).await
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    remove_from(&state, &user, id, RecipeList::Favorites).await
}

pub async fn add_to_shopping_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    add_to(&state, &user, id, RecipeList::ShoppingCart).await
}

pub async fn remove_from_shopping_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    remove_from(&state, &user, id, RecipeList::ShoppingCart).await
}

/// Aggregated cart ingredients as a PDF attachment, or plain text with `?format=txt`
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    user: CurrentUser,
    query: ListQuery,
) -> impl IntoResponse {
    let items = match shopping_list_service::shopping_list(state.db(), user.id()).await {
        Ok(items) => items,
        Err(e) => return e.into_response(),
    };

    if query.get("format") == Some("txt") {
        return (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", TEXT_FILENAME),
                ),
            ],
            shopping_list_service::render_text(&items),
        )
            .into_response();
    }

    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", PDF_FILENAME),
            ),
        ],
        shopping_list_service::render_pdf(&items, &state.pdf_font),
    )
        .into_response()
}

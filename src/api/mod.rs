pub mod auth;
pub mod error;
pub mod extract;
pub mod health;
pub mod ingredient;
pub mod pagination;
pub mod recipe;
pub mod tag;
pub mod user;

use axum::{
    Router,
    routing::{get, post},
};

use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/token/login", post(auth::login))
        .route("/auth/token/logout", post(auth::logout))
        // Users
        .route("/users", get(user::list_users).post(user::register))
        .route("/users/me", get(user::me))
        .route("/users/set_password", post(user::set_password))
        .route("/users/subscriptions", get(user::subscriptions))
        .route("/users/:id", get(user::get_user))
        .route(
            "/users/:id/subscribe",
            post(user::subscribe).delete(user::unsubscribe),
        )
        // Tags
        .route("/tags", get(tag::list_tags).post(tag::create_tag))
        .route(
            "/tags/:id",
            get(tag::get_tag)
                .patch(tag::update_tag)
                .delete(tag::delete_tag),
        )
        // Ingredients
        .route(
            "/ingredients",
            get(ingredient::list_ingredients).post(ingredient::create_ingredient),
        )
        .route(
            "/ingredients/:id",
            get(ingredient::get_ingredient)
                .patch(ingredient::update_ingredient)
                .delete(ingredient::delete_ingredient),
        )
        // Recipes
        .route(
            "/recipes",
            get(recipe::list_recipes).post(recipe::create_recipe),
        )
        .route(
            "/recipes/download_shopping_cart",
            get(recipe::download_shopping_cart),
        )
        .route(
            "/recipes/:id",
            get(recipe::get_recipe)
                .patch(recipe::update_recipe)
                .delete(recipe::delete_recipe),
        )
        .route(
            "/recipes/:id/favorite",
            post(recipe::add_favorite).delete(recipe::remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart",
            post(recipe::add_to_shopping_cart).delete(recipe::remove_from_shopping_cart),
        )
        .with_state(state)
}

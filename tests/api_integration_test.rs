use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use foodgram::auth::{create_jwt, hash_password};
use foodgram::config::Config;
use foodgram::db;
use foodgram::infrastructure::AppState;
use foodgram::models::{favorite, ingredient, shopping_cart, tag, user};
use foodgram::server::build_app;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::{Value, json};
use std::path::PathBuf;
use tower::util::ServiceExt; // for `oneshot`
use tower_http::normalize_path::NormalizePath;

const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

struct TestApp {
    app: NormalizePath<Router>,
    state: AppState,
    media_root: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_root);
    }
}

// Helper to create the full application over an in-memory database
async fn setup_test_app() -> TestApp {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");

    let media_root = std::env::temp_dir().join(format!("foodgram-test-{}", uuid::Uuid::new_v4()));
    let mut config = Config::from_lookup(|_| None);
    config.media_root = media_root.clone();

    let state = AppState::new(db, &config);
    TestApp {
        app: build_app(state.clone(), &config),
        state,
        media_root,
    }
}

// Helper to create a user directly, returns (id, token)
async fn create_test_user(app: &TestApp, username: &str, role: &str) -> (i32, String) {
    let now = chrono::Utc::now().to_rfc3339();
    let email = format!("{}@example.com", username);
    let model = user::ActiveModel {
        email: Set(email.clone()),
        username: Set(username.to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        password_hash: Set(hash_password("password").unwrap()),
        role: Set(role.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(app.state.db())
    .await
    .expect("Failed to create user");

    let token = create_jwt(model.id, &email, role).expect("Failed to create token");
    (model.id, token)
}

async fn create_test_tag(app: &TestApp, name: &str, color: &str, slug: &str) -> i32 {
    tag::ActiveModel {
        name: Set(name.to_string()),
        color: Set(color.to_string()),
        slug: Set(slug.to_string()),
        ..Default::default()
    }
    .insert(app.state.db())
    .await
    .expect("Failed to create tag")
    .id
}

async fn create_test_ingredient(app: &TestApp, name: &str, unit: &str) -> i32 {
    ingredient::ActiveModel {
        name: Set(name.to_string()),
        measurement_unit: Set(unit.to_string()),
        ..Default::default()
    }
    .insert(app.state.db())
    .await
    .expect("Failed to create ingredient")
    .id
}

async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn recipe_payload(name: &str, ingredients: &[(i32, i32)], tags: &[i32]) -> Value {
    json!({
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({ "id": id, "amount": amount }))
            .collect::<Vec<_>>(),
        "tags": tags,
        "image": PIXEL,
        "name": name,
        "text": "Mix everything",
        "cooking_time": 15
    })
}

async fn create_recipe(app: &TestApp, token: &str, payload: Value) -> i32 {
    let (status, body) = send(app, "POST", "/api/recipes", Some(token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
    body["id"].as_i64().unwrap() as i32
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_test_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = setup_test_app().await;

    let payload = json!({
        "email": "cook@example.com",
        "username": "cook",
        "first_name": "Ivan",
        "last_name": "Ivanov",
        "password": "Qwerty123!"
    });
    let (status, body) = send(&app, "POST", "/api/users/", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "cook");
    assert!(body.get("password").is_none());

    // Same email again
    let (status, _) = send(&app, "POST", "/api/users", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/token/login/",
        None,
        Some(json!({ "email": "cook@example.com", "password": "Qwerty123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["auth_token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/users/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "cook@example.com");
    assert_eq!(body["is_subscribed"], false);

    let (status, _) = send(&app, "POST", "/api/auth/token/logout/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_set_password() {
    let app = setup_test_app().await;
    let (_, token) = create_test_user(&app, "chef", "user").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/users/set_password",
        Some(&token),
        Some(json!({ "current_password": "wrong", "new_password": "next" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/users/set_password",
        Some(&token),
        Some(json!({ "current_password": "password", "new_password": "next" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/token/login",
        None,
        Some(json!({ "email": "chef@example.com", "password": "next" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_users_are_paginated() {
    let app = setup_test_app().await;
    for i in 0..8 {
        create_test_user(&app, &format!("user{}", i), "user").await;
    }

    let (status, body) = send(&app, "GET", "/api/users?limit=3&page=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 8);
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
    assert_eq!(body["next"], "/api/users?limit=3&page=3");
    assert_eq!(body["previous"], "/api/users?limit=3");

    // Default page size
    let (_, body) = send(&app, "GET", "/api/users", None, None).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 6);

    // Oversized page size is capped
    let (_, body) = send(&app, "GET", "/api/users?limit=100000", None, None).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 8);

    // Out-of-range page numbers give an empty page, not a failure
    for (i, uri) in [
        "/api/users?page=18446744073709551615&limit=6",
        "/api/recipes?page=18446744073709551615&limit=18446744073709551615",
        "/api/users/subscriptions?page=18446744073709551615",
    ]
    .into_iter()
    .enumerate()
    {
        let (_, token) = create_test_user(&app, &format!("reader{}", i), "user").await;
        let (status, body) = send(&app, "GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert!(body["results"].as_array().unwrap().is_empty());
        assert!(body["next"].is_null());
    }
}

#[tokio::test]
async fn test_recipe_lifecycle() {
    let app = setup_test_app().await;
    let (author_id, token) = create_test_user(&app, "author", "user").await;
    let breakfast = create_test_tag(&app, "Завтрак", "#E26C2D", "breakfast").await;
    let eggs = create_test_ingredient(&app, "яйца", "шт").await;
    let milk = create_test_ingredient(&app, "молоко", "мл").await;

    let recipe_id = create_recipe(
        &app,
        &token,
        recipe_payload("Омлет", &[(eggs, 3), (milk, 100)], &[breakfast]),
    )
    .await;

    let (status, body) = send(&app, "GET", &format!("/api/recipes/{}", recipe_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Омлет");
    assert_eq!(body["author"]["id"], author_id);
    assert_eq!(body["tags"][0]["slug"], "breakfast");
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 2);
    assert_eq!(body["is_favorited"], false);
    let image = body["image"].as_str().unwrap().to_string();
    assert!(image.starts_with("/media/"));

    // Stored image is served
    let response = app
        .app
        .clone()
        .oneshot(Request::builder().uri(&image).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Partial update keeps untouched fields
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/recipes/{}/", recipe_id),
        Some(&token),
        Some(json!({ "cooking_time": 5, "ingredients": [{ "id": eggs, "amount": 2 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cooking_time"], 5);
    assert_eq!(body["name"], "Омлет");
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 1);
    assert_eq!(body["ingredients"][0]["amount"], 2);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/recipes/{}", recipe_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/recipes/{}", recipe_id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recipe_filters() {
    let app = setup_test_app().await;
    let (author_id, author_token) = create_test_user(&app, "author", "user").await;
    let (_, reader_token) = create_test_user(&app, "reader", "user").await;
    let breakfast = create_test_tag(&app, "Завтрак", "#E26C2D", "breakfast").await;
    let dinner = create_test_tag(&app, "Ужин", "#8775D2", "dinner").await;
    let salt = create_test_ingredient(&app, "соль", "г").await;

    let morning = create_recipe(&app, &author_token, recipe_payload("Каша", &[(salt, 1)], &[breakfast])).await;
    let evening = create_recipe(&app, &author_token, recipe_payload("Суп", &[(salt, 2)], &[dinner])).await;

    // Newest first
    let (_, body) = send(&app, "GET", "/api/recipes", None, None).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["id"], evening);

    let (_, body) = send(&app, "GET", "/api/recipes?tags=breakfast", None, None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], morning);

    let (_, body) = send(&app, "GET", "/api/recipes?tags=breakfast&tags=dinner", None, None).await;
    assert_eq!(body["count"], 2);

    let (_, body) = send(&app, "GET", &format!("/api/recipes?author={}", author_id), None, None).await;
    assert_eq!(body["count"], 2);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/recipes/{}/favorite", morning),
        Some(&reader_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, "GET", "/api/recipes?is_favorited=1", Some(&reader_token), None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["is_favorited"], true);

    // Anonymous visitors get the unfiltered list
    let (_, body) = send(&app, "GET", "/api/recipes?is_favorited=1", None, None).await;
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_favorite_twice_and_remove_absent() {
    let app = setup_test_app().await;
    let (_, token) = create_test_user(&app, "author", "user").await;
    let tag_id = create_test_tag(&app, "Обед", "#49B64E", "lunch").await;
    let salt = create_test_ingredient(&app, "соль", "г").await;
    let recipe_id = create_recipe(&app, &token, recipe_payload("Плов", &[(salt, 5)], &[tag_id])).await;
    let uri = format!("/api/recipes/{}/favorite/", recipe_id);

    let (status, body) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], recipe_id);
    assert_eq!(body["name"], "Плов");
    assert_eq!(body["cooking_time"], 15);

    let (status, body) = send(&app, "POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "Этот рецепт уже добавлен");

    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "Что мертво умереть не может");

    let (status, _) = send(&app, "POST", "/api/recipes/999/favorite", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_shopping_cart_totals_and_download() {
    let app = setup_test_app().await;
    let (shopper_id, token) = create_test_user(&app, "shopper", "user").await;
    let tag_id = create_test_tag(&app, "Обед", "#49B64E", "lunch").await;
    let flour = create_test_ingredient(&app, "мука", "г").await;
    let milk = create_test_ingredient(&app, "молоко", "мл").await;

    let pancakes = create_recipe(&app, &token, recipe_payload("Блины", &[(flour, 200), (milk, 300)], &[tag_id])).await;
    let pie = create_recipe(&app, &token, recipe_payload("Пирог", &[(flour, 350)], &[tag_id])).await;

    // Empty cart cannot be downloaded
    let (status, body) = send(&app, "GET", "/api/recipes/download_shopping_cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "Список покупок пуст");

    for id in [pancakes, pie] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/recipes/{}/shopping_cart", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let pie_uri = format!("/api/recipes/{}/shopping_cart/", pie);
    let (status, body) = send(&app, "POST", &pie_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "Этот рецепт уже добавлен");

    let items = foodgram::services::shopping_list_service::aggregate(app.state.db(), shopper_id)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "молоко");
    assert_eq!(items[0].amount, 300);
    assert_eq!(items[1].name, "мука");
    assert_eq!(items[1].amount, 550);

    let req = Request::builder()
        .uri("/api/recipes/download_shopping_cart/")
        .header(header::AUTHORIZATION, format!("Token {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("Shopping-list.pdf")
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));
    assert!(bytes.ends_with(b"%%EOF\n"));
    // Russian names are drawn with the bundled font and map back to text
    let has = |needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);
    assert!(has(b"/Subtype /Type0 /BaseFont /DejaVuSans /Encoding /Identity-H"));
    assert!(has(b"<03D1> <043C>"));
    assert!(has(b"<03C5> <0430>"));

    let req = Request::builder()
        .uri("/api/recipes/download_shopping_cart?format=txt")
        .header(header::AUTHORIZATION, format!("Token {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("- мука (г): 550"));
    assert!(text.contains("- молоко (мл): 300"));

    let (status, _) = send(&app, "DELETE", &pie_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, "DELETE", &pie_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "Что мертво умереть не может");

    let items = foodgram::services::shopping_list_service::aggregate(app.state.db(), shopper_id)
        .await
        .unwrap();
    assert_eq!(items[1].name, "мука");
    assert_eq!(items[1].amount, 200);
}

#[tokio::test]
async fn test_recipe_delete_cascades_memberships() {
    let app = setup_test_app().await;
    let (user_id, token) = create_test_user(&app, "author", "user").await;
    let tag_id = create_test_tag(&app, "Обед", "#49B64E", "lunch").await;
    let salt = create_test_ingredient(&app, "соль", "г").await;
    let recipe_id = create_recipe(&app, &token, recipe_payload("Рагу", &[(salt, 5)], &[tag_id])).await;

    send(&app, "POST", &format!("/api/recipes/{}/favorite", recipe_id), Some(&token), None).await;
    send(&app, "POST", &format!("/api/recipes/{}/shopping_cart", recipe_id), Some(&token), None).await;

    let db = app.state.db();
    let favorites = favorite::Entity::find()
        .filter(favorite::Column::UserId.eq(user_id))
        .count(db)
        .await
        .unwrap();
    assert_eq!(favorites, 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/recipes/{}", recipe_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let favorites = favorite::Entity::find().count(db).await.unwrap();
    let carts = shopping_cart::Entity::find().count(db).await.unwrap();
    assert_eq!(favorites, 0);
    assert_eq!(carts, 0);

    // Ingredients survive their recipes
    let ingredients = ingredient::Entity::find().count(db).await.unwrap();
    assert_eq!(ingredients, 1);
}

#[tokio::test]
async fn test_subscriptions() {
    let app = setup_test_app().await;
    let (author_id, author_token) = create_test_user(&app, "author", "user").await;
    let (reader_id, reader_token) = create_test_user(&app, "reader", "user").await;
    let tag_id = create_test_tag(&app, "Обед", "#49B64E", "lunch").await;
    let salt = create_test_ingredient(&app, "соль", "г").await;
    for name in ["Первое", "Второе", "Третье"] {
        create_recipe(&app, &author_token, recipe_payload(name, &[(salt, 1)], &[tag_id])).await;
    }

    let uri = format!("/api/users/{}/subscribe?recipes_limit=2", author_id);
    let (status, body) = send(&app, "POST", &uri, Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], author_id);
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 3);
    assert_eq!(body["recipes"].as_array().unwrap().len(), 2);
    assert_eq!(body["recipes"][0]["name"], "Третье");

    let (status, body) = send(&app, "POST", &uri, Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "Вы уже подписаны на этого автора");

    let self_uri = format!("/api/users/{}/subscribe", reader_id);
    let (status, body) = send(&app, "POST", &self_uri, Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "Нельзя подписаться на самого себя");

    let (_, body) = send(&app, "GET", "/api/users/subscriptions", Some(&reader_token), None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "author");
    assert_eq!(body["results"][0]["recipes"].as_array().unwrap().len(), 3);

    let (_, body) = send(&app, "GET", &format!("/api/users/{}", author_id), Some(&reader_token), None).await;
    assert_eq!(body["is_subscribed"], true);

    let (status, _) = send(&app, "DELETE", &uri, Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "DELETE", &uri, Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], "Вы не были подписаны на этого автора");

    let (status, _) = send(&app, "POST", "/api/users/999/subscribe", Some(&reader_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tags_and_ingredients_catalogue() {
    let app = setup_test_app().await;
    let (_, admin_token) = create_test_user(&app, "admin", "admin").await;
    let (_, user_token) = create_test_user(&app, "cook", "user").await;

    let tag = json!({ "name": "Завтрак", "color": "#E26C2D", "slug": "breakfast" });
    let (status, _) = send(&app, "POST", "/api/tags", Some(&user_token), Some(tag.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", "/api/tags", Some(&admin_token), Some(tag.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let tag_id = body["id"].as_i64().unwrap();

    let (status, _) = send(&app, "POST", "/api/tags", Some(&admin_token), Some(tag)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/tags/{}", tag_id),
        Some(&admin_token),
        Some(json!({ "name": "Утро" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Утро");
    assert_eq!(body["slug"], "breakfast");

    let (_, body) = send(&app, "GET", "/api/tags/", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    for (name, unit) in [("Сахар", "г"), ("сахарная пудра", "г"), ("соль", "г"), ("apple", "шт")] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/ingredients",
            Some(&admin_token),
            Some(json!({ "name": name, "measurement_unit": unit })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&app, "GET", "/api/ingredients?name=%D1%81%D0%B0%D1%85", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/api/ingredients?name=APP", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/api/ingredients", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_data_loaders() {
    let app = setup_test_app().await;
    let data_root = app.media_root.join("data");
    std::fs::create_dir_all(&data_root).unwrap();
    std::fs::write(
        data_root.join("tags.json"),
        r##"[{"name": "Завтрак", "color": "#E26C2D", "slug": "breakfast"},
             {"name": "Обед", "color": "#49B64E", "slug": "lunch"}]"##,
    )
    .unwrap();
    std::fs::write(
        data_root.join("ingredients.json"),
        r#"[{"name": "абрикосовое варенье", "measurement_unit": "г"},
            {"name": "абрикосы", "measurement_unit": "г"}]"#,
    )
    .unwrap();

    let db = app.state.db();
    let report = foodgram::seed::load_tags(db, &data_root).await.unwrap();
    assert_eq!(report.read, 2);
    assert_eq!(report.inserted, 2);

    // Loading again skips existing rows
    let report = foodgram::seed::load_tags(db, &data_root).await.unwrap();
    assert_eq!(report.inserted, 0);

    let report = foodgram::seed::load_ingredients(db, &data_root).await.unwrap();
    assert_eq!(report.inserted, 2);
    assert_eq!(tag::Entity::find().count(db).await.unwrap(), 2);
}

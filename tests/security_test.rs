use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use foodgram::api;
use foodgram::auth::{create_jwt, decode_jwt, hash_password, verify_password};
use foodgram::config::Config;
use foodgram::db;
use foodgram::infrastructure::AppState;
use foodgram::models::user;
use foodgram::services::user_service;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tower::util::ServiceExt; // for `oneshot`

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

#[tokio::test]
async fn test_password_hashing() {
    let password = "super_secret_password";
    let hash = hash_password(password).expect("Failed to hash password");

    assert_ne!(password, hash);
    assert!(verify_password(password, &hash).unwrap());
    assert!(!verify_password("wrong_password", &hash).unwrap());
}

#[tokio::test]
async fn test_jwt_creation_and_verification() {
    let token = create_jwt(7, "cook@example.com", user::ROLE_ADMIN).expect("Failed to create JWT");
    assert!(!token.is_empty());

    let claims = decode_jwt(&token).expect("Failed to verify JWT");
    assert_eq!(claims.sub, "cook@example.com");
    assert_eq!(claims.user_id, 7);
    assert_eq!(claims.role, user::ROLE_ADMIN);
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let token = create_jwt(7, "cook@example.com", user::ROLE_USER).unwrap();
    let mut tampered = token.clone();
    tampered.push('x');
    assert!(decode_jwt(&tampered).is_err());
}

#[tokio::test]
async fn test_registered_password_is_hashed() {
    let db = setup_test_db().await;

    let registered = user_service::register(
        &db,
        user_service::RegisterInput {
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Ivan".to_string(),
            last_name: "Ivanov".to_string(),
            password: "Qwerty123!".to_string(),
        },
    )
    .await
    .expect("Failed to register");

    let stored = user::Entity::find_by_id(registered.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password_hash, "Qwerty123!");
    assert!(verify_password("Qwerty123!", &stored.password_hash).unwrap());
    assert_eq!(stored.role, user::ROLE_USER);

    // Hash never leaves the server
    let json = serde_json::to_value(&stored).unwrap();
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn test_create_admin_promotes_existing_account() {
    let db = setup_test_db().await;

    let now = chrono::Utc::now().to_rfc3339();
    user::ActiveModel {
        email: Set("boss@example.com".to_string()),
        username: Set("boss".to_string()),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        password_hash: Set(hash_password("old").unwrap()),
        role: Set(user::ROLE_USER.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let admin = user_service::ensure_admin(&db, "boss@example.com", "boss", "new")
        .await
        .unwrap();
    assert!(admin.is_admin());
    assert!(verify_password("new", &admin.password_hash).unwrap());

    let fresh = user_service::ensure_admin(&db, "root@example.com", "root", "pw")
        .await
        .unwrap();
    assert!(fresh.is_admin());
    assert_ne!(fresh.id, admin.id);
}

#[tokio::test]
async fn test_admin_only_catalogue_writes() {
    let db = setup_test_db().await;
    let config = Config::from_lookup(|_| None);

    let now = chrono::Utc::now().to_rfc3339();
    let cook = user::ActiveModel {
        email: Set("cook@example.com".to_string()),
        username: Set("cook".to_string()),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        password_hash: Set("hash".to_string()),
        role: Set(user::ROLE_USER.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    // A forged admin claim does not help, the role is read from the database
    let forged = create_jwt(cook.id, &cook.email, user::ROLE_ADMIN).unwrap();

    let app = api::api_router(AppState::new(db, &config));

    let payload = serde_json::json!({ "name": "соль", "measurement_unit": "г" });
    let req = Request::builder()
        .uri("/ingredients")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", forged))
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let req = Request::builder()
        .uri("/ingredients")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

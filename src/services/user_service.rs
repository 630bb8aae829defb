//! User Service - registration, lookup and credentials
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{PageRequest, Paginated};
use crate::domain::DomainError;
use crate::infrastructure::auth::{create_jwt, hash_password, verify_password};
use crate::models::subscription::{self, Entity as Subscription};
use crate::models::user::{self, Entity as User, ROLE_ADMIN, ROLE_USER};

const EMAIL_MAX_LEN: usize = 254;
const NAME_MAX_LEN: usize = 150;
const RESERVED_USERNAME: &str = "me";

/// Public view of a user, relative to whoever is asking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDto {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserDto {
    pub fn from_model(model: user::Model, is_subscribed: bool) -> Self {
        Self {
            email: model.email,
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            is_subscribed,
        }
    }
}

/// Returned by registration, no viewer-relative fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

pub async fn register(
    db: &DatabaseConnection,
    input: RegisterInput,
) -> Result<RegisteredUser, DomainError> {
    validate_registration(&input)?;

    if User::find()
        .filter(user::Column::Email.eq(input.email.as_str()))
        .one(db)
        .await?
        .is_some()
    {
        return Err(DomainError::validation(
            "Пользователь с таким email уже существует",
        ));
    }
    if User::find()
        .filter(user::Column::Username.eq(input.username.as_str()))
        .one(db)
        .await?
        .is_some()
    {
        return Err(DomainError::validation(
            "Пользователь с таким username уже существует",
        ));
    }

    let password_hash = hash_password(&input.password).map_err(DomainError::Internal)?;
    let now = chrono::Utc::now().to_rfc3339();

    let model = user::ActiveModel {
        email: Set(input.email),
        username: Set(input.username),
        first_name: Set(input.first_name),
        last_name: Set(input.last_name),
        password_hash: Set(password_hash),
        role: Set(ROLE_USER.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| DomainError::unique_violation_as(e, "Пользователь уже существует"))?;

    tracing::info!("Registered user {} ({})", model.username, model.id);

    Ok(RegisteredUser {
        email: model.email,
        id: model.id,
        username: model.username,
        first_name: model.first_name,
        last_name: model.last_name,
    })
}

fn validate_registration(input: &RegisterInput) -> Result<(), DomainError> {
    let required = [
        ("email", &input.email),
        ("username", &input.username),
        ("first_name", &input.first_name),
        ("last_name", &input.last_name),
        ("password", &input.password),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "Поле {} обязательно",
                field
            )));
        }
    }

    if !input.email.contains('@') || input.email.chars().count() > EMAIL_MAX_LEN {
        return Err(DomainError::validation("Введите правильный email"));
    }

    if input.username.chars().count() > NAME_MAX_LEN
        || !input
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || "_.@+-".contains(c))
    {
        return Err(DomainError::validation("Недопустимое имя пользователя"));
    }
    if input.username.eq_ignore_ascii_case(RESERVED_USERNAME) {
        return Err(DomainError::validation(format!(
            "Имя пользователя {} запрещено",
            RESERVED_USERNAME
        )));
    }

    if input.first_name.chars().count() > NAME_MAX_LEN
        || input.last_name.chars().count() > NAME_MAX_LEN
    {
        return Err(DomainError::validation(format!(
            "Имя и фамилия не длиннее {} символов",
            NAME_MAX_LEN
        )));
    }

    Ok(())
}

/// Ids among `author_ids` that `viewer` follows
pub async fn followed_among<C: ConnectionTrait>(
    db: &C,
    viewer: Option<i32>,
    author_ids: &[i32],
) -> Result<HashSet<i32>, DomainError> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let rows = Subscription::find()
        .filter(subscription::Column::UserId.eq(viewer))
        .filter(subscription::Column::AuthorId.is_in(author_ids.iter().copied()))
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|s| s.author_id).collect())
}

pub async fn list_users(
    db: &DatabaseConnection,
    viewer: Option<i32>,
    page: PageRequest,
) -> Result<Paginated<UserDto>, DomainError> {
    let paginator = User::find()
        .order_by_asc(user::Column::Id)
        .paginate(db, page.limit);
    let total = paginator.num_items().await?;
    let users = paginator.fetch_page(page.index()).await?;

    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let followed = followed_among(db, viewer, &ids).await?;

    let items = users
        .into_iter()
        .map(|u| {
            let is_subscribed = followed.contains(&u.id);
            UserDto::from_model(u, is_subscribed)
        })
        .collect();

    Ok(Paginated { items, total })
}

pub async fn get_user(
    db: &DatabaseConnection,
    viewer: Option<i32>,
    id: i32,
) -> Result<UserDto, DomainError> {
    let model = User::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;

    let followed = followed_among(db, viewer, &[model.id]).await?;
    let is_subscribed = followed.contains(&model.id);
    Ok(UserDto::from_model(model, is_subscribed))
}

/// Resolves the account behind a token, a deleted account counts as
/// unauthenticated.
pub async fn current_user(db: &DatabaseConnection, user_id: i32) -> Result<user::Model, DomainError> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(DomainError::Unauthorized)
}

pub async fn set_password(
    db: &DatabaseConnection,
    user_id: i32,
    current_password: &str,
    new_password: &str,
) -> Result<(), DomainError> {
    let model = current_user(db, user_id).await?;

    let matches =
        verify_password(current_password, &model.password_hash).map_err(DomainError::Internal)?;
    if !matches {
        return Err(DomainError::validation("Неверный текущий пароль"));
    }
    if new_password.trim().is_empty() {
        return Err(DomainError::validation("Поле new_password обязательно"));
    }

    let password_hash = hash_password(new_password).map_err(DomainError::Internal)?;
    let mut active: user::ActiveModel = model.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    active.update(db).await?;

    tracing::info!("Password changed for user {}", user_id);
    Ok(())
}

/// Exchanges credentials for a bearer token
pub async fn login(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<String, DomainError> {
    let invalid = || DomainError::validation("Невозможно войти с предоставленными учетными данными");

    let Some(model) = User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?
    else {
        tracing::warn!("Login attempt for unknown email: {}", email);
        return Err(invalid());
    };

    match verify_password(password, &model.password_hash) {
        Ok(true) => create_jwt(model.id, &model.email, &model.role).map_err(DomainError::Internal),
        _ => {
            tracing::warn!("Password verification failed for user: {}", model.username);
            Err(invalid())
        }
    }
}

/// Creates an admin account, or promotes the existing account with this email.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    email: &str,
    username: &str,
    password: &str,
) -> Result<user::Model, DomainError> {
    let password_hash = hash_password(password).map_err(DomainError::Internal)?;
    let now = chrono::Utc::now().to_rfc3339();

    let existing = User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;

    let model = match existing {
        Some(model) => {
            let mut active: user::ActiveModel = model.into();
            active.role = Set(ROLE_ADMIN.to_string());
            active.password_hash = Set(password_hash);
            active.updated_at = Set(now);
            active.update(db).await?
        }
        None => {
            user::ActiveModel {
                email: Set(email.to_string()),
                username: Set(username.to_string()),
                first_name: Set(String::new()),
                last_name: Set(String::new()),
                password_hash: Set(password_hash),
                role: Set(ROLE_ADMIN.to_string()),
                created_at: Set(now.clone()),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await
            .map_err(|e| DomainError::unique_violation_as(e, "Пользователь уже существует"))?
        }
    };

    tracing::info!("Admin account ready: {}", model.email);
    Ok(model)
}

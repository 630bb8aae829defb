//! Request extractors shared by the handlers

use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::models::user;
use crate::services::Actor;
use crate::services::user_service;

/// The authenticated account, loaded from the database.
///
/// Tokens for accounts that no longer exist are rejected with 401.
/// Wrap in `Option` for endpoints that also serve anonymous visitors.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

impl CurrentUser {
    pub fn id(&self) -> i32 {
        self.0.id
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.0.id,
            is_admin: self.0.is_admin(),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = Claims::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let user = user_service::current_user(state.db(), claims.user_id)
            .await
            .map_err(|e| {
                tracing::warn!("Token for unknown user {} rejected", claims.user_id);
                e.into_response()
            })?;

        Ok(CurrentUser(user))
    }
}

/// An authenticated administrator, anyone else gets 403
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!("User {} denied admin access", user.id);
            return Err(DomainError::Forbidden.into_response());
        }
        Ok(AdminUser(user))
    }
}

/// `Json` whose rejections are reported like any other validation error
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(DomainError::validation(rejection.body_text()).into_response()),
        }
    }
}

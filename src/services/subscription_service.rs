//! Subscription Service - users following recipe authors
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use super::recipe_service::{ShortRecipe, recipes_by_authors};
use super::user_service::UserDto;
use super::{PageRequest, Paginated};
use crate::domain::DomainError;
use crate::domain::messages::{ALREADY_SUBSCRIBED, NOT_SUBSCRIBED, SELF_SUBSCRIPTION};
use crate::infrastructure::media::MediaStore;
use crate::models::subscription::{self, Entity as Subscription};
use crate::models::user::{self, Entity as User};

/// An author as seen from the subscriptions page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionDto {
    #[serde(flatten)]
    pub author: UserDto,
    pub recipes: Vec<ShortRecipe>,
    pub recipes_count: u64,
}

async fn find_author(db: &DatabaseConnection, author_id: i32) -> Result<user::Model, DomainError> {
    User::find_by_id(author_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))
}

pub async fn subscribe(
    db: &DatabaseConnection,
    media: &MediaStore,
    user_id: i32,
    author_id: i32,
    recipes_limit: Option<usize>,
) -> Result<SubscriptionDto, DomainError> {
    let author = find_author(db, author_id).await?;

    if user_id == author_id {
        return Err(DomainError::validation(SELF_SUBSCRIPTION));
    }

    let existing = Subscription::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::AuthorId.eq(author_id))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(DomainError::validation(ALREADY_SUBSCRIBED));
    }

    subscription::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| DomainError::unique_violation_as(e, ALREADY_SUBSCRIBED))?;

    tracing::info!("User {} subscribed to {}", user_id, author_id);

    let mut recipes = recipes_by_authors(db, media, &[author.id], recipes_limit).await?;
    let (recipes, recipes_count) = recipes.remove(&author.id).unwrap_or_default();

    Ok(SubscriptionDto {
        author: UserDto::from_model(author, true),
        recipes,
        recipes_count,
    })
}

pub async fn unsubscribe(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<(), DomainError> {
    find_author(db, author_id).await?;

    let result = Subscription::delete_many()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::validation(NOT_SUBSCRIBED));
    }

    tracing::info!("User {} unsubscribed from {}", user_id, author_id);
    Ok(())
}

/// Authors `user_id` follows, with their newest recipes
pub async fn list_subscriptions(
    db: &DatabaseConnection,
    media: &MediaStore,
    user_id: i32,
    page: PageRequest,
    recipes_limit: Option<usize>,
) -> Result<Paginated<SubscriptionDto>, DomainError> {
    let paginator = User::find()
        .filter(
            user::Column::Id.in_subquery(
                Query::select()
                    .column(subscription::Column::AuthorId)
                    .from(Subscription)
                    .and_where(subscription::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
        .order_by_asc(user::Column::Username)
        .paginate(db, page.limit);
    let total = paginator.num_items().await?;
    let authors = paginator.fetch_page(page.index()).await?;

    let author_ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
    let mut recipes = recipes_by_authors(db, media, &author_ids, recipes_limit).await?;

    let page = Paginated {
        items: authors,
        total,
    }
    .map(|author| {
        let (recipes, recipes_count) = recipes.remove(&author.id).unwrap_or_default();
        SubscriptionDto {
            author: UserDto::from_model(author, true),
            recipes,
            recipes_count,
        }
    });

    Ok(page)
}

//! Membership Service - per-user favorites and shopping cart
//!
//! Both lists share the same rules: adding a recipe twice or removing one that
//! is not there is rejected with a client error.
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};

use super::recipe_service::{ShortRecipe, find_recipe};
use crate::domain::DomainError;
use crate::domain::messages::{RECIPE_ALREADY_ADDED, RECIPE_NOT_IN_LIST};
use crate::infrastructure::media::MediaStore;
use crate::models::favorite::{self, Entity as Favorite};
use crate::models::shopping_cart::{self, Entity as ShoppingCart};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    pub fn label(&self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "shopping cart",
        }
    }
}

pub async fn add_recipe(
    db: &DatabaseConnection,
    media: &MediaStore,
    user_id: i32,
    recipe_id: i32,
    list: RecipeList,
) -> Result<ShortRecipe, DomainError> {
    let recipe = find_recipe(db, recipe_id).await?;

    if contains(db, user_id, recipe_id, list).await? {
        tracing::warn!(
            "Recipe {} already in {} of user {}",
            recipe_id,
            list.label(),
            user_id
        );
        return Err(DomainError::validation(RECIPE_ALREADY_ADDED));
    }

    insert_new(db, user_id, recipe_id, list).await?;

    tracing::info!("Recipe {} added to {} of user {}", recipe_id, list.label(), user_id);
    Ok(ShortRecipe::from_model(media, &recipe))
}

pub async fn remove_recipe(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
    list: RecipeList,
) -> Result<(), DomainError> {
    find_recipe(db, recipe_id).await?;

    let removed = match list {
        RecipeList::Favorites => {
            Favorite::delete_many()
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.eq(recipe_id))
                .exec(db)
                .await?
                .rows_affected
        }
        RecipeList::ShoppingCart => {
            ShoppingCart::delete_many()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                .exec(db)
                .await?
                .rows_affected
        }
    };

    if removed == 0 {
        return Err(DomainError::validation(RECIPE_NOT_IN_LIST));
    }

    tracing::info!(
        "Recipe {} removed from {} of user {}",
        recipe_id,
        list.label(),
        user_id
    );
    Ok(())
}

pub async fn contains(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
    list: RecipeList,
) -> Result<bool, DomainError> {
    let count = match list {
        RecipeList::Favorites => {
            Favorite::find()
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.eq(recipe_id))
                .count(db)
                .await?
        }
        RecipeList::ShoppingCart => {
            ShoppingCart::find()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                .count(db)
                .await?
        }
    };
    Ok(count > 0)
}

/// Inserts the row, a concurrent duplicate reports as already added
async fn insert_new(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
    list: RecipeList,
) -> Result<(), DomainError> {
    insert(db, user_id, recipe_id, list)
        .await
        .map_err(|e| DomainError::unique_violation_as(e, RECIPE_ALREADY_ADDED))
}

async fn insert(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
    list: RecipeList,
) -> Result<(), DbErr> {
    match list {
        RecipeList::Favorites => {
            favorite::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
        RecipeList::ShoppingCart => {
            shopping_cart::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}

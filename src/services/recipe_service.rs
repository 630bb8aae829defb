//! Recipe Service - recipes with their ingredient amounts and tags
//!
//! Responses are assembled in batches: one page of recipes costs a fixed
//! number of queries regardless of its size.
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::user_service::{UserDto, followed_among};
use super::{Actor, PageRequest, Paginated};
use crate::domain::DomainError;
use crate::infrastructure::media::MediaStore;
use crate::models::favorite::{self, Entity as Favorite};
use crate::models::ingredient::{self, Entity as Ingredient};
use crate::models::recipe::{self, Entity as Recipe};
use crate::models::recipe_ingredient::{self, Entity as RecipeIngredient};
use crate::models::recipe_tag::{self, Entity as RecipeTag};
use crate::models::shopping_cart::{self, Entity as ShoppingCart};
use crate::models::tag::{self, Entity as Tag};
use crate::models::user::{self, Entity as User};

const RECIPE_NAME_MAX_LEN: usize = 200;
const MIN_AMOUNT: i32 = 1;
const MIN_COOKING_TIME: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeIngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe as shown to a viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDto {
    pub id: i32,
    pub tags: Vec<tag::Model>,
    pub author: UserDto,
    pub ingredients: Vec<RecipeIngredientDto>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Compact form used by favorites, cart and subscription listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShortRecipe {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl ShortRecipe {
    pub fn from_model(media: &MediaStore, model: &recipe::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            image: media.url(&model.image),
            cooking_time: model.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeInput {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
    /// base64 data URL
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Partial update, provided ingredient and tag lists replace the old ones
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePatch {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<i32>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

/// Listing filters
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    /// Matches recipes carrying any of these tag slugs
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

pub async fn find_recipe<C: ConnectionTrait>(db: &C, id: i32) -> Result<recipe::Model, DomainError> {
    Recipe::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Recipe"))
}

pub async fn list_recipes(
    db: &DatabaseConnection,
    media: &MediaStore,
    viewer: Option<i32>,
    filter: RecipeFilter,
    page: PageRequest,
) -> Result<Paginated<RecipeDto>, DomainError> {
    tracing::debug!(
        "List recipes - author={:?}, tags={:?}, favorited={}, in_cart={}",
        filter.author,
        filter.tags,
        filter.is_favorited,
        filter.is_in_shopping_cart
    );

    let mut query = Recipe::find();

    if let Some(author) = filter.author {
        query = query.filter(recipe::Column::AuthorId.eq(author));
    }

    if !filter.tags.is_empty() {
        query = query.filter(
            recipe::Column::Id.in_subquery(
                Query::select()
                    .column((RecipeTag, recipe_tag::Column::RecipeId))
                    .from(RecipeTag)
                    .inner_join(
                        Tag,
                        Expr::col((Tag, tag::Column::Id))
                            .equals((RecipeTag, recipe_tag::Column::TagId)),
                    )
                    .and_where(Expr::col((Tag, tag::Column::Slug)).is_in(filter.tags.clone()))
                    .to_owned(),
            ),
        );
    }

    // Membership filters only make sense for a known viewer
    if let Some(viewer) = viewer {
        if filter.is_favorited {
            query = query.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(favorite::Column::RecipeId)
                        .from(Favorite)
                        .and_where(favorite::Column::UserId.eq(viewer))
                        .to_owned(),
                ),
            );
        }
        if filter.is_in_shopping_cart {
            query = query.filter(
                recipe::Column::Id.in_subquery(
                    Query::select()
                        .column(shopping_cart::Column::RecipeId)
                        .from(ShoppingCart)
                        .and_where(shopping_cart::Column::UserId.eq(viewer))
                        .to_owned(),
                ),
            );
        }
    }

    let paginator = query
        .order_by_desc(recipe::Column::Id)
        .paginate(db, page.limit);
    let total = paginator.num_items().await?;
    let recipes = paginator.fetch_page(page.index()).await?;

    let items = build_recipes(db, media, viewer, recipes).await?;
    Ok(Paginated { items, total })
}

pub async fn get_recipe(
    db: &DatabaseConnection,
    media: &MediaStore,
    viewer: Option<i32>,
    id: i32,
) -> Result<RecipeDto, DomainError> {
    let model = find_recipe(db, id).await?;
    build_recipes(db, media, viewer, vec![model])
        .await?
        .pop()
        .ok_or_else(|| DomainError::Internal(format!("recipe {} vanished while loading", id)))
}

pub async fn create_recipe(
    db: &DatabaseConnection,
    media: &MediaStore,
    author_id: i32,
    input: RecipeInput,
) -> Result<RecipeDto, DomainError> {
    validate_name(&input.name)?;
    validate_text(&input.text)?;
    validate_cooking_time(input.cooking_time)?;
    validate_ingredients(db, &input.ingredients).await?;
    validate_tags(db, &input.tags).await?;

    let image = media.save_image(&input.image).await?;

    let saved = async {
        let txn = db.begin().await?;

        let model = recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set(input.name),
            image: Set(image.clone()),
            text: Set(input.text),
            cooking_time: Set(input.cooking_time),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_ingredients(&txn, model.id, &input.ingredients).await?;
        insert_tags(&txn, model.id, &input.tags).await?;

        txn.commit().await?;
        Ok::<_, DomainError>(model)
    }
    .await;

    let model = match saved {
        Ok(model) => model,
        Err(e) => {
            media.remove(&image).await;
            return Err(e);
        }
    };

    tracing::info!("Recipe {} created by user {}", model.id, author_id);
    get_recipe(db, media, Some(author_id), model.id).await
}

pub async fn update_recipe(
    db: &DatabaseConnection,
    media: &MediaStore,
    actor: Actor,
    id: i32,
    patch: RecipePatch,
) -> Result<RecipeDto, DomainError> {
    let model = find_recipe(db, id).await?;
    if !actor.can_manage(model.author_id) {
        tracing::warn!("User {} may not edit recipe {}", actor.user_id, id);
        return Err(DomainError::Forbidden);
    }

    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    if let Some(text) = &patch.text {
        validate_text(text)?;
    }
    if let Some(cooking_time) = patch.cooking_time {
        validate_cooking_time(cooking_time)?;
    }
    if let Some(ingredients) = &patch.ingredients {
        validate_ingredients(db, ingredients).await?;
    }
    if let Some(tags) = &patch.tags {
        validate_tags(db, tags).await?;
    }

    let new_image = match &patch.image {
        Some(data_url) => Some(media.save_image(data_url).await?),
        None => None,
    };
    let old_image = model.image.clone();

    let saved = async {
        let txn = db.begin().await?;

        let mut active: recipe::ActiveModel = model.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(text) = patch.text {
            active.text = Set(text);
        }
        if let Some(cooking_time) = patch.cooking_time {
            active.cooking_time = Set(cooking_time);
        }
        if let Some(image) = &new_image {
            active.image = Set(image.clone());
        }
        active.update(&txn).await?;

        if let Some(ingredients) = &patch.ingredients {
            RecipeIngredient::delete_many()
                .filter(recipe_ingredient::Column::RecipeId.eq(id))
                .exec(&txn)
                .await?;
            insert_ingredients(&txn, id, ingredients).await?;
        }
        if let Some(tags) = &patch.tags {
            RecipeTag::delete_many()
                .filter(recipe_tag::Column::RecipeId.eq(id))
                .exec(&txn)
                .await?;
            insert_tags(&txn, id, tags).await?;
        }

        txn.commit().await?;
        Ok::<_, DomainError>(())
    }
    .await;

    match (saved, new_image) {
        (Ok(()), Some(_)) => media.remove(&old_image).await,
        (Ok(()), None) => {}
        (Err(e), new_image) => {
            if let Some(image) = new_image {
                media.remove(&image).await;
            }
            return Err(e);
        }
    }

    tracing::info!("Recipe {} updated by user {}", id, actor.user_id);
    get_recipe(db, media, Some(actor.user_id), id).await
}

pub async fn delete_recipe(
    db: &DatabaseConnection,
    media: &MediaStore,
    actor: Actor,
    id: i32,
) -> Result<(), DomainError> {
    let model = find_recipe(db, id).await?;
    if !actor.can_manage(model.author_id) {
        tracing::warn!("User {} may not delete recipe {}", actor.user_id, id);
        return Err(DomainError::Forbidden);
    }

    let image = model.image.clone();
    model.delete(db).await?;
    media.remove(&image).await;

    tracing::info!("Recipe {} deleted by user {}", id, actor.user_id);
    Ok(())
}

/// Newest recipes of each author, at most `limit` per author when given,
/// plus each author's total recipe count.
pub async fn recipes_by_authors<C: ConnectionTrait>(
    db: &C,
    media: &MediaStore,
    author_ids: &[i32],
    limit: Option<usize>,
) -> Result<HashMap<i32, (Vec<ShortRecipe>, u64)>, DomainError> {
    let mut by_author: HashMap<i32, (Vec<ShortRecipe>, u64)> = author_ids
        .iter()
        .map(|&id| (id, (Vec::new(), 0)))
        .collect();
    if author_ids.is_empty() {
        return Ok(by_author);
    }

    let recipes = Recipe::find()
        .filter(recipe::Column::AuthorId.is_in(author_ids.iter().copied()))
        .order_by_desc(recipe::Column::Id)
        .all(db)
        .await?;

    for model in &recipes {
        let entry = by_author.entry(model.author_id).or_default();
        entry.1 += 1;
        if limit.is_none_or(|limit| entry.0.len() < limit) {
            entry.0.push(ShortRecipe::from_model(media, model));
        }
    }

    Ok(by_author)
}

async fn build_recipes<C: ConnectionTrait>(
    db: &C,
    media: &MediaStore,
    viewer: Option<i32>,
    recipes: Vec<recipe::Model>,
) -> Result<Vec<RecipeDto>, DomainError> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

    // Tags
    let links = RecipeTag::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .all(db)
        .await?;
    let tag_ids: HashSet<i32> = links.iter().map(|l| l.tag_id).collect();
    let tags_by_id: HashMap<i32, tag::Model> = Tag::find()
        .filter(tag::Column::Id.is_in(tag_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
    let mut tags_by_recipe: HashMap<i32, Vec<tag::Model>> = HashMap::new();
    for link in links {
        if let Some(tag) = tags_by_id.get(&link.tag_id) {
            tags_by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(tag.clone());
        }
    }
    for tags in tags_by_recipe.values_mut() {
        tags.sort_by_key(|t| t.id);
    }

    // Ingredients with amounts
    let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredientDto>> = HashMap::new();
    for (link, product) in RecipeIngredient::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(recipe_ingredient::Column::Id)
        .find_also_related(Ingredient)
        .all(db)
        .await?
    {
        if let Some(product) = product {
            ingredients_by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(RecipeIngredientDto {
                    id: product.id,
                    name: product.name,
                    measurement_unit: product.measurement_unit,
                    amount: link.amount,
                });
        }
    }

    // Authors
    let author_ids: Vec<i32> = recipes
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let authors: HashMap<i32, user::Model> = User::find()
        .filter(user::Column::Id.is_in(author_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let followed = followed_among(db, viewer, &author_ids).await?;

    // Viewer memberships
    let (favorited, in_cart) = match viewer {
        Some(viewer) => {
            let favorited: HashSet<i32> = Favorite::find()
                .filter(favorite::Column::UserId.eq(viewer))
                .filter(favorite::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .all(db)
                .await?
                .into_iter()
                .map(|f| f.recipe_id)
                .collect();
            let in_cart: HashSet<i32> = ShoppingCart::find()
                .filter(shopping_cart::Column::UserId.eq(viewer))
                .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .all(db)
                .await?
                .into_iter()
                .map(|c| c.recipe_id)
                .collect();
            (favorited, in_cart)
        }
        None => (HashSet::new(), HashSet::new()),
    };

    recipes
        .into_iter()
        .map(|model| {
            let author = authors
                .get(&model.author_id)
                .cloned()
                .ok_or_else(|| DomainError::not_found("Author"))?;
            let is_subscribed = followed.contains(&author.id);

            Ok(RecipeDto {
                id: model.id,
                tags: tags_by_recipe.remove(&model.id).unwrap_or_default(),
                author: UserDto::from_model(author, is_subscribed),
                ingredients: ingredients_by_recipe.remove(&model.id).unwrap_or_default(),
                is_favorited: favorited.contains(&model.id),
                is_in_shopping_cart: in_cart.contains(&model.id),
                image: media.url(&model.image),
                name: model.name,
                text: model.text,
                cooking_time: model.cooking_time,
            })
        })
        .collect()
}

async fn insert_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    ingredients: &[IngredientAmount],
) -> Result<(), DomainError> {
    let rows = ingredients.iter().map(|item| recipe_ingredient::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(item.id),
        amount: Set(item.amount),
        ..Default::default()
    });
    RecipeIngredient::insert_many(rows).exec_without_returning(db).await?;
    Ok(())
}

async fn insert_tags<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    tags: &[i32],
) -> Result<(), DomainError> {
    let rows = tags.iter().map(|&tag_id| recipe_tag::ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(tag_id),
    });
    RecipeTag::insert_many(rows).exec_without_returning(db).await?;
    Ok(())
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() || name.chars().count() > RECIPE_NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "Название рецепта: от 1 до {} символов",
            RECIPE_NAME_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_text(text: &str) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::validation("Описание рецепта обязательно"));
    }
    Ok(())
}

fn validate_cooking_time(cooking_time: i32) -> Result<(), DomainError> {
    if cooking_time < MIN_COOKING_TIME {
        return Err(DomainError::validation(format!(
            "Минимальное значение = {}",
            MIN_COOKING_TIME
        )));
    }
    Ok(())
}

/// Shape checks that need no database
fn check_ingredient_list(ingredients: &[IngredientAmount]) -> Result<HashSet<i32>, DomainError> {
    if ingredients.is_empty() {
        return Err(DomainError::validation("Нужен хотя бы один ингредиент"));
    }

    let mut seen = HashSet::new();
    for item in ingredients {
        if item.amount < MIN_AMOUNT {
            return Err(DomainError::validation(format!(
                "Минимальное значение = {}",
                MIN_AMOUNT
            )));
        }
        if !seen.insert(item.id) {
            return Err(DomainError::validation("Ингредиенты не должны повторяться"));
        }
    }
    Ok(seen)
}

fn check_tag_list(tags: &[i32]) -> Result<HashSet<i32>, DomainError> {
    if tags.is_empty() {
        return Err(DomainError::validation("Нужен хотя бы один тег"));
    }

    let mut seen = HashSet::new();
    for &id in tags {
        if !seen.insert(id) {
            return Err(DomainError::validation("Теги не должны повторяться"));
        }
    }
    Ok(seen)
}

async fn validate_ingredients<C: ConnectionTrait>(
    db: &C,
    ingredients: &[IngredientAmount],
) -> Result<(), DomainError> {
    let ids = check_ingredient_list(ingredients)?;
    let expected = ids.len() as u64;

    let found = Ingredient::find()
        .filter(ingredient::Column::Id.is_in(ids))
        .count(db)
        .await?;
    if found != expected {
        return Err(DomainError::validation("Указан несуществующий ингредиент"));
    }
    Ok(())
}

async fn validate_tags<C: ConnectionTrait>(db: &C, tags: &[i32]) -> Result<(), DomainError> {
    let ids = check_tag_list(tags)?;
    let expected = ids.len() as u64;

    let found = Tag::find()
        .filter(tag::Column::Id.is_in(ids))
        .count(db)
        .await?;
    if found != expected {
        return Err(DomainError::validation("Указан несуществующий тег"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i32, amount: i32) -> IngredientAmount {
        IngredientAmount { id, amount }
    }

    #[test]
    fn ingredient_list_rules() {
        assert!(check_ingredient_list(&[]).is_err());
        assert!(check_ingredient_list(&[item(1, 0)]).is_err());
        assert!(check_ingredient_list(&[item(1, 2), item(1, 3)]).is_err());
        assert_eq!(
            check_ingredient_list(&[item(1, 2), item(2, 1)]).unwrap().len(),
            2
        );
    }

    #[test]
    fn tag_list_rules() {
        assert!(check_tag_list(&[]).is_err());
        assert!(check_tag_list(&[4, 4]).is_err());
        assert!(check_tag_list(&[4, 5]).is_ok());
    }

    #[test]
    fn scalar_field_rules() {
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(1).is_ok());
        assert!(validate_name("  ").is_err());
        assert!(validate_name(&"щ".repeat(200)).is_ok());
        assert!(validate_name(&"щ".repeat(201)).is_err());
        assert!(validate_text("").is_err());
    }
}

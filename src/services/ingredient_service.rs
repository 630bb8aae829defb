//! Ingredient Service - the product catalogue recipes draw from

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

use crate::domain::DomainError;
use crate::models::ingredient::{self, Entity as Ingredient};

const INGREDIENT_FIELD_MAX_LEN: usize = 200;
const INGREDIENT_TAKEN: &str = "Такой продукт с этой единицей измерения уже существует";

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientInput {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientPatch {
    pub name: Option<String>,
    pub measurement_unit: Option<String>,
}

/// Ordered by name, optionally restricted to names starting with `name_prefix`
/// (case-insensitive).
pub async fn list_ingredients(
    db: &DatabaseConnection,
    name_prefix: Option<&str>,
) -> Result<Vec<ingredient::Model>, DomainError> {
    let prefix = name_prefix.map(str::trim).filter(|p| !p.is_empty());
    let mut query = Ingredient::find();

    // SQLite LIKE folds ASCII case only and treats `%` and `_` as wildcards,
    // anything else is matched in memory
    let in_sql = |p: &&str| p.is_ascii() && !p.contains(['%', '_']);
    if let Some(prefix) = prefix.filter(in_sql) {
        query = query.filter(ingredient::Column::Name.starts_with(prefix));
    }

    let mut ingredients = query
        .order_by_asc(ingredient::Column::Name)
        .all(db)
        .await?;

    if let Some(prefix) = prefix.filter(|p| !in_sql(p)) {
        let prefix = prefix.to_lowercase();
        ingredients.retain(|i| i.name.to_lowercase().starts_with(&prefix));
    }

    Ok(ingredients)
}

pub async fn get_ingredient(
    db: &DatabaseConnection,
    id: i32,
) -> Result<ingredient::Model, DomainError> {
    Ingredient::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Ingredient"))
}

pub async fn create_ingredient(
    db: &DatabaseConnection,
    input: IngredientInput,
) -> Result<ingredient::Model, DomainError> {
    validate_field("name", &input.name)?;
    validate_field("measurement_unit", &input.measurement_unit)?;

    let model = ingredient::ActiveModel {
        name: Set(input.name),
        measurement_unit: Set(input.measurement_unit),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| DomainError::unique_violation_as(e, INGREDIENT_TAKEN))?;

    tracing::info!("Created ingredient {} ({})", model.name, model.id);
    Ok(model)
}

pub async fn update_ingredient(
    db: &DatabaseConnection,
    id: i32,
    patch: IngredientPatch,
) -> Result<ingredient::Model, DomainError> {
    let model = get_ingredient(db, id).await?;
    let mut active: ingredient::ActiveModel = model.into();

    if let Some(name) = patch.name {
        validate_field("name", &name)?;
        active.name = Set(name);
    }
    if let Some(unit) = patch.measurement_unit {
        validate_field("measurement_unit", &unit)?;
        active.measurement_unit = Set(unit);
    }

    active
        .update(db)
        .await
        .map_err(|e| DomainError::unique_violation_as(e, INGREDIENT_TAKEN))
}

pub async fn delete_ingredient(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let model = get_ingredient(db, id).await?;
    model.delete(db).await?;
    tracing::info!("Deleted ingredient {}", id);
    Ok(())
}

fn validate_field(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() || value.chars().count() > INGREDIENT_FIELD_MAX_LEN {
        return Err(DomainError::validation(format!(
            "Поле {}: от 1 до {} символов",
            field, INGREDIENT_FIELD_MAX_LEN
        )));
    }
    Ok(())
}

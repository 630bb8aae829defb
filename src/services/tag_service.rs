//! Tag Service - colored labels attached to recipes

use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set,
};
use serde::Deserialize;

use crate::domain::DomainError;
use crate::models::tag::{self, Entity as Tag};

const TAG_FIELD_MAX_LEN: usize = 200;
const TAG_TAKEN: &str = "Тег с таким названием, цветом или slug уже существует";

#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub slug: Option<String>,
}

pub async fn list_tags(db: &DatabaseConnection) -> Result<Vec<tag::Model>, DomainError> {
    Ok(Tag::find().order_by_asc(tag::Column::Name).all(db).await?)
}

pub async fn get_tag(db: &DatabaseConnection, id: i32) -> Result<tag::Model, DomainError> {
    Tag::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Tag"))
}

pub async fn create_tag(db: &DatabaseConnection, input: TagInput) -> Result<tag::Model, DomainError> {
    validate_name(&input.name)?;
    validate_color(&input.color)?;
    validate_slug(&input.slug)?;

    let model = tag::ActiveModel {
        name: Set(input.name),
        color: Set(input.color),
        slug: Set(input.slug),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| DomainError::unique_violation_as(e, TAG_TAKEN))?;

    tracing::info!("Created tag {} ({})", model.slug, model.id);
    Ok(model)
}

pub async fn update_tag(
    db: &DatabaseConnection,
    id: i32,
    patch: TagPatch,
) -> Result<tag::Model, DomainError> {
    let model = get_tag(db, id).await?;
    let mut active: tag::ActiveModel = model.into();

    if let Some(name) = patch.name {
        validate_name(&name)?;
        active.name = Set(name);
    }
    if let Some(color) = patch.color {
        validate_color(&color)?;
        active.color = Set(color);
    }
    if let Some(slug) = patch.slug {
        validate_slug(&slug)?;
        active.slug = Set(slug);
    }

    active
        .update(db)
        .await
        .map_err(|e| DomainError::unique_violation_as(e, TAG_TAKEN))
}

pub async fn delete_tag(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let model = get_tag(db, id).await?;
    model.delete(db).await?;
    tracing::info!("Deleted tag {}", id);
    Ok(())
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() || name.chars().count() > TAG_FIELD_MAX_LEN {
        return Err(DomainError::validation(format!(
            "Название тега: от 1 до {} символов",
            TAG_FIELD_MAX_LEN
        )));
    }
    Ok(())
}

/// `#RRGGBB`
pub fn validate_color(color: &str) -> Result<(), DomainError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(DomainError::validation(
            "Цвет должен быть в формате HEX, например #49B64E",
        ));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), DomainError> {
    let valid = !slug.is_empty()
        && slug.len() <= TAG_FIELD_MAX_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(DomainError::validation(
            "Slug может содержать только латинские буквы, цифры, дефис и подчеркивание",
        ));
    }
    Ok(())
}

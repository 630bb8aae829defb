//! One-shot reference data loaders for tags and ingredients.
//!
//! Each loader reads a JSON array from the data directory and bulk inserts it,
//! skipping rows that collide with existing unique values.

use std::path::Path;

use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::Deserialize;

use crate::domain::DomainError;
use crate::domain::messages::DATA_FILE_NOT_FOUND;
use crate::models::{ingredient, tag};

pub const TAGS_FILE: &str = "tags.json";
pub const INGREDIENTS_FILE: &str = "ingredients.json";

const CHUNK_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
struct TagRecord {
    name: String,
    color: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

/// Rows found in the file and rows actually inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub read: usize,
    pub inserted: u64,
}

pub async fn load_tags(db: &DatabaseConnection, data_root: &Path) -> Result<LoadReport, DomainError> {
    let records: Vec<TagRecord> = read_records(data_root, TAGS_FILE).await?;
    let models: Vec<tag::ActiveModel> = records
        .iter()
        .map(|r| tag::ActiveModel {
            name: Set(r.name.clone()),
            color: Set(r.color.clone()),
            slug: Set(r.slug.clone()),
            ..Default::default()
        })
        .collect();

    let txn = db.begin().await?;
    let mut inserted = 0;
    for chunk in models.chunks(CHUNK_SIZE) {
        inserted += tag::Entity::insert_many(chunk.to_vec())
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec_without_returning(&txn)
            .await?;
    }
    txn.commit().await?;

    tracing::info!("Loaded {} of {} tags", inserted, records.len());
    Ok(LoadReport {
        read: records.len(),
        inserted,
    })
}

pub async fn load_ingredients(
    db: &DatabaseConnection,
    data_root: &Path,
) -> Result<LoadReport, DomainError> {
    let records: Vec<IngredientRecord> = read_records(data_root, INGREDIENTS_FILE).await?;
    let models: Vec<ingredient::ActiveModel> = records
        .iter()
        .map(|r| ingredient::ActiveModel {
            name: Set(r.name.clone()),
            measurement_unit: Set(r.measurement_unit.clone()),
            ..Default::default()
        })
        .collect();

    let txn = db.begin().await?;
    let mut inserted = 0;
    for chunk in models.chunks(CHUNK_SIZE) {
        inserted += ingredient::Entity::insert_many(chunk.to_vec())
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec_without_returning(&txn)
            .await?;
    }
    txn.commit().await?;

    tracing::info!("Loaded {} of {} ingredients", inserted, records.len());
    Ok(LoadReport {
        read: records.len(),
        inserted,
    })
}

async fn read_records<T>(data_root: &Path, name: &str) -> Result<Vec<T>, DomainError>
where
    T: for<'de> Deserialize<'de>,
{
    let path = data_root.join(name);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tracing::error!("Data file {:?} is missing", path);
        return Err(DomainError::NotFound(format!(
            "{} {}",
            DATA_FILE_NOT_FOUND,
            path.display()
        )));
    }

    let raw = tokio::fs::read(&path).await?;
    serde_json::from_slice(&raw).map_err(|e| {
        DomainError::validation(format!("Invalid JSON in {}: {}", path.display(), e))
    })
}

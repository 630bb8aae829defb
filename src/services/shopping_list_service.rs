//! Shopping list built from every recipe in a user's cart.
//!
//! Ingredients are grouped by (name, measurement unit) and their amounts summed.

use sea_orm::{DatabaseConnection, DbBackend, FromQueryResult, Statement};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::domain::DomainError;
use crate::domain::messages::SHOPPING_LIST_EMPTY;
use crate::modules::pdf::{Font, PAGE_HEIGHT, TextDocument, TrueTypeFont};

pub const PDF_FILENAME: &str = "Shopping-list.pdf";
pub const TEXT_FILENAME: &str = "Shopping-list.txt";
const TITLE: &str = "Список покупок";

const TITLE_SIZE: f32 = 18.0;
const ROW_SIZE: f32 = 12.0;
const COLUMN_0: f32 = 50.0;
const COLUMN_1: f32 = 350.0;
const TITLE_Y: f32 = 790.0;
const FIRST_ROW_Y: f32 = 750.0;
const NEXT_LINE: f32 = 20.0;
const BOTTOM_MARGIN: f32 = 50.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

const AGGREGATE_SQL: &str = r#"
    SELECT i.name AS name,
           i.measurement_unit AS measurement_unit,
           SUM(ri.amount) AS amount
    FROM recipe_ingredients ri
    JOIN ingredients i ON i.id = ri.ingredient_id
    JOIN shopping_carts sc ON sc.recipe_id = ri.recipe_id
    WHERE sc.user_id = ?
    GROUP BY i.name, i.measurement_unit
    ORDER BY i.name, i.measurement_unit
"#;

pub async fn aggregate(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<ShoppingListItem>, DomainError> {
    let items = ShoppingListItem::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        AGGREGATE_SQL,
        [user_id.into()],
    ))
    .all(db)
    .await?;
    Ok(items)
}

/// Aggregated list for download, rejecting an empty cart
pub async fn shopping_list(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<ShoppingListItem>, DomainError> {
    let items = aggregate(db, user_id).await?;
    if items.is_empty() {
        tracing::warn!("User {} requested an empty shopping list", user_id);
        return Err(DomainError::validation(SHOPPING_LIST_EMPTY));
    }
    tracing::info!("Shopping list for user {}: {} items", user_id, items.len());
    Ok(items)
}

/// Loads the TrueType font the PDF list is drawn with. Without it the
/// document falls back to Helvetica, which cannot draw Cyrillic.
pub fn load_font(path: &Path) -> Font {
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();

    let parsed = std::fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|data| TrueTypeFont::parse(name, data));

    match parsed {
        Ok(font) => {
            tracing::debug!("Loaded shopping list font {:?}", path);
            Font::TrueType(Arc::new(font))
        }
        Err(e) => {
            tracing::warn!(
                "Shopping list font {:?} unavailable ({}), non-Latin text will not render",
                path,
                e
            );
            Font::Helvetica
        }
    }
}

pub fn render_text(items: &[ShoppingListItem]) -> String {
    let mut out = format!("{}\n\n", TITLE);
    for item in items {
        out.push_str(&format!(
            "- {} ({}): {}\n",
            item.name, item.measurement_unit, item.amount
        ));
    }
    out
}

pub fn render_pdf(items: &[ShoppingListItem], font: &Font) -> Vec<u8> {
    let mut doc = TextDocument::with_font(font.clone());
    doc.text(COLUMN_0, TITLE_Y, TITLE_SIZE, TITLE);

    let mut y = FIRST_ROW_Y;
    for item in items {
        if y < BOTTOM_MARGIN {
            doc.new_page();
            y = PAGE_HEIGHT - BOTTOM_MARGIN;
        }
        doc.text(COLUMN_0, y, ROW_SIZE, format!("- {}", item.name));
        doc.text(
            COLUMN_1,
            y,
            ROW_SIZE,
            format!("{} {}", item.amount, item.measurement_unit),
        );
        y -= NEXT_LINE;
    }

    doc.render()
}

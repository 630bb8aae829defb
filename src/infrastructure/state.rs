//! Application state shared by every handler

use sea_orm::DatabaseConnection;

use crate::infrastructure::config::Config;
use crate::infrastructure::media::MediaStore;
use crate::modules::pdf::Font;
use crate::services::shopping_list_service;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    /// Recipe image storage
    pub media: MediaStore,
    /// Default page size for paginated listings
    pub page_size: u64,
    /// Font for the PDF shopping list
    pub pdf_font: Font,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &Config) -> Self {
        Self {
            db,
            media: MediaStore::new(config.media_root.clone()),
            page_size: config.page_size,
            pdf_font: shopping_list_service::load_font(&config.pdf_font),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Handlers that only touch the database extract the connection directly
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

//! Storage for uploaded recipe images.
//!
//! Clients send images as `data:image/<type>;base64,<payload>` URLs. The
//! decoded bytes are written under `<media_root>/recipes/images/` with a
//! random file name and served back under `/media`.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::path::{Path, PathBuf};

use crate::domain::DomainError;

pub const MEDIA_URL: &str = "/media";
const IMAGE_DIR: &str = "recipes/images";

#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decodes a base64 data URL and stores it, returning the path relative
    /// to the media root.
    pub async fn save_image(&self, data_url: &str) -> Result<String, DomainError> {
        let (extension, bytes) = decode_data_url(data_url)?;

        let relative = format!("{}/{}.{}", IMAGE_DIR, uuid::Uuid::new_v4(), extension);
        let target = self.root.join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        tracing::debug!("Stored image {:?}", target);
        Ok(relative)
    }

    /// Best-effort removal, a missing file is not an error.
    pub async fn remove(&self, relative: &str) {
        if relative.is_empty() {
            return;
        }
        let target = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&target).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove image {:?}: {}", target, e);
            }
        }
    }

    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", MEDIA_URL, relative)
    }
}

fn decode_data_url(data_url: &str) -> Result<(&'static str, Vec<u8>), DomainError> {
    let invalid = || DomainError::validation("Изображение должно быть передано в формате base64");

    let rest = data_url.strip_prefix("data:").ok_or_else(invalid)?;
    let (mime, payload) = rest.split_once(";base64,").ok_or_else(invalid)?;

    let extension = match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => return Err(DomainError::validation("Неподдерживаемый формат изображения")),
    };

    let bytes = STANDARD.decode(payload.trim()).map_err(|_| invalid())?;
    if bytes.is_empty() {
        return Err(invalid());
    }
    Ok((extension, bytes))
}

use std::env;
use std::path::PathBuf;

pub const DEFAULT_PAGE_SIZE: u64 = 6;
pub const DEFAULT_PDF_FONT: &str = "assets/fonts/DejaVuSans.ttf";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub profile: String,
    /// Uploaded recipe images live here, served under `/media`
    pub media_root: PathBuf,
    /// Directory holding `tags.json` / `ingredients.json` for the load commands
    pub data_root: PathBuf,
    /// TrueType font the PDF shopping list is drawn with
    pub pdf_font: PathBuf,
    pub page_size: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = lookup("PROFILE").unwrap_or_else(|| "default".to_string());

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            if profile == "default" {
                "sqlite://foodgram.db?mode=rwc".to_string()
            } else {
                format!("sqlite://foodgram_{}.db?mode=rwc", profile)
            }
        });

        Self {
            database_url,
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            media_root: lookup("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("media")),
            data_root: lookup("DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            pdf_font: lookup("PDF_FONT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PDF_FONT)),
            page_size: lookup("PAGE_SIZE")
                .and_then(|p| p.parse().ok())
                .filter(|&p| p > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            profile,
        }
    }

    pub fn with_profile(mut self, profile: &str) -> Self {
        if self.profile == profile {
            return self;
        }
        if self.database_url == "sqlite://foodgram.db?mode=rwc"
            || self.database_url == format!("sqlite://foodgram_{}.db?mode=rwc", self.profile)
        {
            self.database_url = format!("sqlite://foodgram_{}.db?mode=rwc", profile);
        }
        self.profile = profile.to_string();
        self
    }
}

//! Server configuration loaded from environment variables.

use std::path::PathBuf;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

const DB_PATH_VAR: &str = "GUIDEBOOK_DB_PATH";
const CORS_ORIGINS_VAR: &str = "GUIDEBOOK_CORS_ORIGINS";

#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Database file (from GUIDEBOOK_DB_PATH). `None` uses the platform data
    /// directory.
    pub db_path: Option<PathBuf>,
    /// Allowed CORS origins (from GUIDEBOOK_CORS_ORIGINS, comma-separated).
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup(DB_PATH_VAR)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let cors_origins = lookup(CORS_ORIGINS_VAR).map(|s| {
            s.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect()
        });

        Self {
            db_path,
            cors_origins,
        }
    }

    pub fn with_cors_origins(origins: Vec<String>) -> Self {
        Self {
            db_path: None,
            cors_origins: Some(origins),
        }
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let Some(origins) = &self.cors_origins else {
            return CorsLayer::permissive();
        };

        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

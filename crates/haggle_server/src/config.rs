//! Server configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use haggle_core::EngineConfig;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::{ServerError, ServerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (e.g., "127.0.0.1:8080")
    pub bind_address: String,

    /// Database URL; `mem://` keeps everything in process
    pub database_url: String,

    /// Shared secret used to verify bearer tokens
    pub jwt_secret: String,

    /// TOML file of products and users loaded at startup
    pub catalog_path: Option<PathBuf>,

    pub engine: EngineConfig,

    /// CORS configuration
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub max_age: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            database_url: "mem://".to_string(),
            jwt_secret: "change-me-in-production".to_string(),
            catalog_path: None,
            engine: EngineConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age: 3600,
        }
    }
}

impl ServerConfig {
    /// Read a TOML config file; missing keys fall back to defaults
    pub async fn load(path: &Path) -> ServerResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServerError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&raw).map_err(|e| ServerError::Config(format!("{}: {}", path.display(), e)))
    }
}

impl CorsConfig {
    pub fn layer(&self) -> ServerResult<CorsLayer> {
        let origins = if self.allowed_origins.iter().any(|o| o == "*") {
            AllowOrigin::any()
        } else {
            let parsed = self
                .allowed_origins
                .iter()
                .map(|origin| {
                    HeaderValue::from_str(origin)
                        .map_err(|e| ServerError::Config(format!("CORS origin {origin}: {e}")))
                })
                .collect::<ServerResult<Vec<_>>>()?;
            AllowOrigin::list(parsed)
        };

        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(Duration::from_secs(self.max_age)))
    }
}

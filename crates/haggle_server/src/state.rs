//! Application state

use std::sync::Arc;
use std::time::{Duration, Instant};

use haggle_core::{Catalog, NegotiationManager, ScriptedPolicy, SurrealStore, load_catalog};

use crate::{config::ServerConfig, error::ServerResult};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub manager: Arc<NegotiationManager>,
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,
    started_at: Instant,
}

impl AppState {
    /// Connect storage, seed the catalog if configured, and build the manager
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = Arc::new(SurrealStore::connect(&config.database_url).await?);

        if let Some(path) = &config.catalog_path {
            let seed = load_catalog(path).await?;
            tracing::info!(
                products = seed.products.len(),
                users = seed.users.len(),
                "seeding catalog from {}",
                path.display()
            );
            for product in seed.products {
                store.put_product(product).await?;
            }
            for user in seed.users {
                store.put_user(user).await?;
            }
        }

        let manager = NegotiationManager::new(
            store.clone(),
            store,
            Arc::new(ScriptedPolicy),
            config.engine.clone(),
        );

        Ok(Self::with_manager(config, manager))
    }

    /// Build state around an existing manager
    pub fn with_manager(config: ServerConfig, manager: NegotiationManager) -> Self {
        let jwt_decoding_key = jsonwebtoken::DecodingKey::from_secret(config.jwt_secret.as_bytes());

        Self {
            config: Arc::new(config),
            manager: Arc::new(manager),
            jwt_decoding_key,
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

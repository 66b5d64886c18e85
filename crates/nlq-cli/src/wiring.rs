//! Process wiring: turns [`NlqConfig`] into live connections and clients.
//!
//! Mirrors the teacher's `create_database_connection` pattern (config in,
//! `Arc<dyn Trait>` out) generalized across the catalog pool, the target
//! database pool, and the two HTTP worker clients.

use anyhow::{Context, Result};
use nlq_catalog::{CatalogStore, PgCatalogStore};
use nlq_core::config::NlqConfig;
use nlq_eval::{ExplainClient, PgExplainClient};
use nlq_exec::{Executor, PgExecutor};
use nlq_llm::{EmbeddingClient, GeneratorClient, HttpEmbeddingClient, HttpGeneratorClient};
use std::sync::Arc;

/// Every live dependency the orchestrator needs for one process lifetime.
/// Cheap to clone: every field is `Arc`-backed or itself pool-backed.
#[derive(Clone)]
pub struct Wiring {
    pub config: NlqConfig,
    pub catalog: Arc<dyn CatalogStore>,
    pub generator: Arc<dyn GeneratorClient>,
    pub embedding: Arc<dyn EmbeddingClient>,
    pub explain: Arc<dyn ExplainClient>,
    pub executor: Arc<dyn Executor>,
}

impl Wiring {
    pub async fn build(config: NlqConfig) -> Result<Self> {
        let catalog_pool = PgCatalogStore::connect(&config.catalog.url, config.catalog.pool_size)
            .await
            .context("failed to connect to catalog database")?;

        let target_pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database.pool_size)
            .connect(&config.database.url)
            .await
            .context("failed to connect to target database")?;

        let generator = HttpGeneratorClient::new(config.generator.url.clone(), config.generator.timeout_ms);
        let embedding = HttpEmbeddingClient::new(config.embedding.url.clone(), config.embedding.timeout_ms);
        let explain = PgExplainClient::new(target_pool.clone());
        let executor = PgExecutor::new(target_pool);

        Ok(Self {
            config,
            catalog: Arc::new(catalog_pool),
            generator: Arc::new(generator),
            embedding: Arc::new(embedding),
            explain: Arc::new(explain),
            executor: Arc::new(executor),
        })
    }
}

use crate::error::{CatalogError, CatalogResult};
use crate::traits::{CatalogStore, SearchHit};
use async_trait::async_trait;
use nlq_core::types::{ColumnDescriptor, FkEdge, ForeignKeyRef, ModuleDescriptor, TableDescriptor};
use pgvector::Vector;
use sqlx::{PgPool, Row};

/// Postgres-backed [`CatalogStore`]. Holds a pool, not a connection: cheap to
/// clone, safe to share across the async pipeline.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub async fn connect(database_url: &str, pool_size: u32) -> CatalogResult<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled `migrations/` directory. Idempotent.
    pub async fn run_migrations(&self) -> CatalogResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn similarity_search(&self, embedding: &[f32], top_k: usize) -> CatalogResult<Vec<SearchHit>> {
        let vector = Vector::from(embedding.to_vec());
        let rows = sqlx::query(
            "SELECT name, 1 - (embedding <=> $1) AS score \
             FROM catalog_tables \
             WHERE embedding IS NOT NULL \
             ORDER BY embedding <=> $1 \
             LIMIT $2",
        )
        .bind(vector)
        .bind(top_k as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_connection_error)?;

        Ok(rows
            .into_iter()
            .map(|row| SearchHit {
                table_name: row.get("name"),
                score: row.get::<f32, _>("score"),
            })
            .collect())
    }

    async fn bm25_search(&self, query: &str, top_k: usize) -> CatalogResult<Vec<SearchHit>> {
        let rows = sqlx::query(
            "SELECT name, ts_rank_cd(search_vector, plainto_tsquery('english', $1)) AS score \
             FROM catalog_tables \
             WHERE search_vector @@ plainto_tsquery('english', $1) \
             ORDER BY score DESC \
             LIMIT $2",
        )
        .bind(query)
        .bind(top_k as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_connection_error)?;

        Ok(rows
            .into_iter()
            .map(|row| SearchHit {
                table_name: row.get("name"),
                score: row.get::<f32, _>("score"),
            })
            .collect())
    }

    async fn fk_edges(&self, table_names: &[String]) -> CatalogResult<Vec<FkEdge>> {
        let rows = sqlx::query(
            "SELECT constraint_name, from_table, from_column, to_table, to_column \
             FROM catalog_fk_edges \
             WHERE from_table = ANY($1) OR to_table = ANY($1)",
        )
        .bind(table_names)
        .fetch_all(&self.pool)
        .await
        .map_err(map_connection_error)?;

        Ok(rows
            .into_iter()
            .map(|row| FkEdge {
                constraint_name: row.get("constraint_name"),
                from_table: row.get("from_table"),
                from_column: row.get("from_column"),
                to_table: row.get("to_table"),
                to_column: row.get("to_column"),
            })
            .collect())
    }

    async fn descriptors(&self, table_names: &[String]) -> CatalogResult<Vec<TableDescriptor>> {
        let table_rows = sqlx::query(
            "SELECT name, module_name, summary, row_count_estimate \
             FROM catalog_tables WHERE name = ANY($1)",
        )
        .bind(table_names)
        .fetch_all(&self.pool)
        .await
        .map_err(map_connection_error)?;

        let column_rows = sqlx::query(
            "SELECT table_name, name, data_type, nullable, is_primary_key, \
                    references_table, references_column, description \
             FROM catalog_columns WHERE table_name = ANY($1) \
             ORDER BY table_name, name",
        )
        .bind(table_names)
        .fetch_all(&self.pool)
        .await
        .map_err(map_connection_error)?;

        let mut descriptors = Vec::with_capacity(table_rows.len());
        for row in table_rows {
            let name: String = row.get("name");
            let columns = column_rows
                .iter()
                .filter(|c| c.get::<String, _>("table_name") == name)
                .map(|c| {
                    let references_table: Option<String> = c.get("references_table");
                    let references_column: Option<String> = c.get("references_column");
                    ColumnDescriptor {
                        name: c.get("name"),
                        data_type: c.get("data_type"),
                        nullable: c.get("nullable"),
                        is_primary_key: c.get("is_primary_key"),
                        references: references_table.zip(references_column).map(|(table, column)| {
                            ForeignKeyRef { table, column }
                        }),
                        description: c.get("description"),
                    }
                })
                .collect();

            descriptors.push(TableDescriptor {
                name,
                module: row.get("module_name"),
                summary: row.get("summary"),
                columns,
                row_count_estimate: row.get("row_count_estimate"),
            });
        }

        if descriptors.len() != table_names.len() {
            let found: std::collections::HashSet<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
            if let Some(missing) = table_names.iter().find(|n| !found.contains(n.as_str())) {
                return Err(CatalogError::TableNotFound(missing.clone()));
            }
        }

        Ok(descriptors)
    }

    async fn module_descriptors(&self) -> CatalogResult<Vec<ModuleDescriptor>> {
        let module_rows = sqlx::query("SELECT name, description, keywords, embedding FROM catalog_modules")
            .fetch_all(&self.pool)
            .await
            .map_err(map_connection_error)?;

        let table_rows = sqlx::query("SELECT name, module_name FROM catalog_tables WHERE module_name IS NOT NULL")
            .fetch_all(&self.pool)
            .await
            .map_err(map_connection_error)?;

        Ok(module_rows
            .into_iter()
            .map(|row| {
                let name: String = row.get("name");
                let table_names = table_rows
                    .iter()
                    .filter(|t| t.get::<Option<String>, _>("module_name").as_deref() == Some(name.as_str()))
                    .map(|t| t.get::<String, _>("name"))
                    .collect();
                let embedding: Option<Vector> = row.get("embedding");
                ModuleDescriptor {
                    name,
                    description: row.get("description"),
                    table_names,
                    keywords: row.get("keywords"),
                    embedding: embedding.map(|v| v.to_vec()).unwrap_or_default(),
                }
            })
            .collect())
    }
}

fn map_connection_error(e: sqlx::Error) -> CatalogError {
    if matches!(e, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) {
        log::error!("catalog store connection error: {e}");
        CatalogError::Unavailable(e.to_string())
    } else {
        CatalogError::Database(e)
    }
}

//! Offline introspection ingest: rebuilds the catalog from a fresh set of
//! descriptors without ever leaving readers looking at a half-updated
//! catalog (spec §9 "atomic swap").

use crate::error::{CatalogError, CatalogResult};
use nlq_core::types::{FkEdge, ModuleDescriptor, TableDescriptor};
use pgvector::Vector;
use sqlx::PgPool;

/// One table's worth of ingest input: its descriptor plus the embedding
/// vector computed for its summary text.
pub struct TableIngestRow {
    pub descriptor: TableDescriptor,
    pub embedding: Vec<f32>,
    pub search_text: String,
}

pub struct RebuildInput {
    pub modules: Vec<ModuleDescriptor>,
    pub tables: Vec<TableIngestRow>,
    pub fk_edges: Vec<FkEdge>,
}

/// Rebuilds the live catalog tables from `input` inside a single
/// transaction: writes go into `_staging` tables, then the live tables are
/// dropped and the staging tables renamed into place. A reader never
/// observes a partially-populated catalog_tables/catalog_columns pair.
pub async fn rebuild_from(pool: &PgPool, input: RebuildInput) -> CatalogResult<()> {
    let mut tx = pool.begin().await?;

    for stmt in [
        "CREATE TABLE catalog_modules_staging (LIKE catalog_modules INCLUDING ALL)",
        "CREATE TABLE catalog_tables_staging (LIKE catalog_tables INCLUDING ALL)",
        "CREATE TABLE catalog_columns_staging (LIKE catalog_columns INCLUDING ALL)",
        "CREATE TABLE catalog_fk_edges_staging (LIKE catalog_fk_edges INCLUDING ALL)",
    ] {
        sqlx::query(stmt).execute(&mut *tx).await?;
    }

    for module in &input.modules {
        let embedding = Vector::from(module.embedding.clone());
        sqlx::query(
            "INSERT INTO catalog_modules_staging (name, description, keywords, embedding) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&module.name)
        .bind(&module.description)
        .bind(&module.keywords)
        .bind(embedding)
        .execute(&mut *tx)
        .await?;
    }

    for row in &input.tables {
        let vector = Vector::from(row.embedding.clone());
        sqlx::query(
            "INSERT INTO catalog_tables_staging \
             (name, module_name, summary, row_count_estimate, embedding, search_text) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&row.descriptor.name)
        .bind(&row.descriptor.module)
        .bind(&row.descriptor.summary)
        .bind(row.descriptor.row_count_estimate)
        .bind(vector)
        .bind(&row.search_text)
        .execute(&mut *tx)
        .await?;

        for column in &row.descriptor.columns {
            sqlx::query(
                "INSERT INTO catalog_columns_staging \
                 (table_name, name, data_type, nullable, is_primary_key, \
                  references_table, references_column, description) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(&row.descriptor.name)
            .bind(&column.name)
            .bind(&column.data_type)
            .bind(column.nullable)
            .bind(column.is_primary_key)
            .bind(column.references.as_ref().map(|r| r.table.clone()))
            .bind(column.references.as_ref().map(|r| r.column.clone()))
            .bind(&column.description)
            .execute(&mut *tx)
            .await?;
        }
    }

    for edge in &input.fk_edges {
        sqlx::query(
            "INSERT INTO catalog_fk_edges_staging \
             (constraint_name, from_table, from_column, to_table, to_column) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&edge.constraint_name)
        .bind(&edge.from_table)
        .bind(&edge.from_column)
        .bind(&edge.to_table)
        .bind(&edge.to_column)
        .execute(&mut *tx)
        .await?;
    }

    for stmt in [
        "DROP TABLE catalog_fk_edges CASCADE",
        "DROP TABLE catalog_columns CASCADE",
        "DROP TABLE catalog_tables CASCADE",
        "DROP TABLE catalog_modules CASCADE",
        "ALTER TABLE catalog_modules_staging RENAME TO catalog_modules",
        "ALTER TABLE catalog_tables_staging RENAME TO catalog_tables",
        "ALTER TABLE catalog_columns_staging RENAME TO catalog_columns",
        "ALTER TABLE catalog_fk_edges_staging RENAME TO catalog_fk_edges",
    ] {
        sqlx::query(stmt).execute(&mut *tx).await?;
    }

    tx.commit().await.map_err(|e| {
        log::error!("catalog rebuild commit failed: {e}");
        CatalogError::RebuildFailed(e.to_string())
    })?;

    log::info!(
        "catalog rebuilt: {} tables, {} fk edges, {} modules",
        input.tables.len(),
        input.fk_edges.len(),
        input.modules.len()
    );
    Ok(())
}

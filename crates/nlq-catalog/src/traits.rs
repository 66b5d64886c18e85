use crate::error::CatalogResult;
use async_trait::async_trait;
use nlq_core::types::{FkEdge, ModuleDescriptor, TableDescriptor};

/// One hit from a similarity or BM25 search, carrying the table it matched
/// and a score in the search's native scale (caller fuses via RRF, not
/// directly on these scores).
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub table_name: String,
    pub score: f32,
}

/// Read-mostly catalog query surface. Implementations hold their own
/// connection pool and are cheap to clone (`Arc`-backed), matching the
/// teacher's `Database` trait boundary: no business logic here, just
/// mechanical reads.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Cosine-similarity search over table embeddings, nearest first.
    async fn similarity_search(&self, embedding: &[f32], top_k: usize) -> CatalogResult<Vec<SearchHit>>;

    /// Full-text (`ts_rank_cd`) search over table/column text, best first.
    async fn bm25_search(&self, query: &str, top_k: usize) -> CatalogResult<Vec<SearchHit>>;

    /// All foreign-key edges for the named tables (both directions of travel
    /// are represented by separate rows; direction is `from_table -> to_table`).
    async fn fk_edges(&self, table_names: &[String]) -> CatalogResult<Vec<FkEdge>>;

    /// Full descriptors (columns, types, PK/FK annotations) for the named tables.
    async fn descriptors(&self, table_names: &[String]) -> CatalogResult<Vec<TableDescriptor>>;

    /// All module groupings, used by the module router's keyword pass.
    async fn module_descriptors(&self) -> CatalogResult<Vec<ModuleDescriptor>>;
}

//! An in-memory [`CatalogStore`] fake for unit and integration tests,
//! following the teacher's preference for hand-written fakes over mocking
//! frameworks.

use crate::error::CatalogResult;
use crate::traits::{CatalogStore, SearchHit};
use async_trait::async_trait;
use nlq_core::cosine_similarity;
use nlq_core::types::{FkEdge, ModuleDescriptor, TableDescriptor};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct FakeCatalogStore {
    pub tables: Vec<TableDescriptor>,
    pub fk_edges: Vec<FkEdge>,
    pub modules: Vec<ModuleDescriptor>,
    /// `table_name -> embedding`, used to compute similarity scores in-memory.
    pub embeddings: HashMap<String, Vec<f32>>,
}

impl FakeCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableDescriptor, embedding: Vec<f32>) -> Self {
        self.embeddings.insert(table.name.clone(), embedding);
        self.tables.push(table);
        self
    }

    pub fn with_fk_edge(mut self, edge: FkEdge) -> Self {
        self.fk_edges.push(edge);
        self
    }

    pub fn with_module(mut self, module: ModuleDescriptor) -> Self {
        self.modules.push(module);
        self
    }
}

#[async_trait]
impl CatalogStore for FakeCatalogStore {
    async fn similarity_search(&self, embedding: &[f32], top_k: usize) -> CatalogResult<Vec<SearchHit>> {
        let mut hits: Vec<SearchHit> = self
            .embeddings
            .iter()
            .map(|(table_name, vec)| SearchHit {
                table_name: table_name.clone(),
                score: cosine_similarity(embedding, vec),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn bm25_search(&self, query: &str, top_k: usize) -> CatalogResult<Vec<SearchHit>> {
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();
        let mut hits: Vec<SearchHit> = self
            .tables
            .iter()
            .map(|t| {
                let haystack = format!("{} {}", t.name, t.summary).to_lowercase();
                let score = terms.iter().filter(|term| haystack.contains(*term)).count() as f32;
                SearchHit {
                    table_name: t.name.clone(),
                    score,
                }
            })
            .filter(|h| h.score > 0.0)
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn fk_edges(&self, table_names: &[String]) -> CatalogResult<Vec<FkEdge>> {
        Ok(self
            .fk_edges
            .iter()
            .filter(|e| table_names.contains(&e.from_table) || table_names.contains(&e.to_table))
            .cloned()
            .collect())
    }

    async fn descriptors(&self, table_names: &[String]) -> CatalogResult<Vec<TableDescriptor>> {
        Ok(self
            .tables
            .iter()
            .filter(|t| table_names.contains(&t.name))
            .cloned()
            .collect())
    }

    async fn module_descriptors(&self) -> CatalogResult<Vec<ModuleDescriptor>> {
        Ok(self.modules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlq_core::types::ColumnDescriptor;

    fn table(name: &str) -> TableDescriptor {
        TableDescriptor {
            name: name.to_string(),
            module: None,
            summary: format!("{name} summary"),
            columns: vec![ColumnDescriptor {
                name: "id".to_string(),
                data_type: "integer".to_string(),
                nullable: false,
                is_primary_key: true,
                references: None,
                description: None,
            }],
            row_count_estimate: Some(100),
        }
    }

    #[tokio::test]
    async fn similarity_search_ranks_nearest_first() {
        let store = FakeCatalogStore::new()
            .with_table(table("orders"), vec![1.0, 0.0])
            .with_table(table("customers"), vec![0.0, 1.0]);
        let hits = store.similarity_search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].table_name, "orders");
    }

    #[tokio::test]
    async fn bm25_search_matches_on_table_name() {
        let store = FakeCatalogStore::new().with_table(table("orders"), vec![1.0, 0.0]);
        let hits = store.bm25_search("orders placed", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].table_name, "orders");
    }
}

//! Schema retriever: cosine + BM25 fused search over tables, FK expansion,
//! and optional pre-SQL recall (spec §4.3).

use crate::error::{RetrievalError, RetrievalResult};
use crate::rrf::reciprocal_rank_fusion;
use nlq_catalog::CatalogStore;
use nlq_core::config::RetrievalConfig;
use nlq_core::types::{ContextTable, FkEdge, SchemaContextPacket, TableSource};
use nlq_llm::{strip_code_fence, EmbeddingClient, GeneratorClient};
use nlq_sql::{extract_table_references, SqlParser};
use std::collections::{HashMap, HashSet};

/// Temperature used for the pre-SQL recall sketch query: low enough that the
/// generator sticks to obvious table choices rather than exploring.
const PRE_SQL_RECALL_TEMPERATURE: f32 = 0.0;

/// Runs the fused cosine+BM25 search, FK expansion, and (optionally)
/// pre-SQL recall, returning the assembled context packet.
///
/// The embedding call retries once on failure before the cosine channel is
/// considered unavailable and retrieval degrades to BM25-only.
pub async fn retrieve_schema_context(
    question: &str,
    embedding_client: Option<&dyn EmbeddingClient>,
    generator_client: Option<&dyn GeneratorClient>,
    pre_sql_recall_enabled: bool,
    catalog: &dyn CatalogStore,
    config: &RetrievalConfig,
) -> RetrievalResult<SchemaContextPacket> {
    let bm25_hits = catalog
        .bm25_search(question, config.bm25_top_k)
        .await
        .map_err(RetrievalError::Catalog)?;
    let bm25_ranked: Vec<String> = bm25_hits.into_iter().map(|h| h.table_name).collect();

    let cosine_ranked: Vec<String> = match embedding_client {
        Some(client) => match client.embed_with_retry(question).await {
            Ok(embedding) => {
                let hits = catalog
                    .similarity_search(&embedding, config.cosine_top_k)
                    .await
                    .map_err(RetrievalError::Catalog)?;
                hits.into_iter()
                    .filter(|h| h.score >= config.cosine_threshold)
                    .map(|h| h.table_name)
                    .collect()
            }
            Err(e) => {
                log::warn!("embedding unavailable after retry, degrading to BM25-only retrieval: {e}");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    if bm25_ranked.is_empty() && cosine_ranked.is_empty() {
        return Err(RetrievalError::RetrievalFailed);
    }

    let fused = reciprocal_rank_fusion(&[cosine_ranked, bm25_ranked], config.rrf_k);
    let retrieval_scores: HashMap<String, f32> = fused.iter().cloned().collect();
    let selected_names: Vec<String> = fused
        .into_iter()
        .take(config.fused_top_m)
        .map(|(name, _)| name)
        .collect();

    let mut modules_considered = HashSet::new();
    let mut tables: Vec<ContextTable> = Vec::new();
    let mut present: HashSet<String> = HashSet::new();

    let descriptors = catalog.descriptors(&selected_names).await.map_err(RetrievalError::Catalog)?;
    for descriptor in descriptors {
        if let Some(module) = &descriptor.module {
            modules_considered.insert(module.clone());
        }
        present.insert(descriptor.name.to_lowercase());
        tables.push(ContextTable {
            retrieval_score: retrieval_scores.get(&descriptor.name).copied(),
            source: TableSource::Retrieval,
            descriptor,
        });
    }

    let fk_edges = expand_via_foreign_keys(catalog, &mut tables, &mut present, config).await?;

    if pre_sql_recall_enabled {
        if let Some(generator) = generator_client {
            run_pre_sql_recall(question, generator, catalog, &mut tables, &mut present).await?;
        }
    }

    Ok(SchemaContextPacket {
        modules_considered: modules_considered.into_iter().collect(),
        tables,
        fk_edges,
    })
}

/// Asks the generator for a low-temperature "sketch" query against the
/// tables already in context, then pulls in any table it named that
/// retrieval and FK expansion missed. One pass only: the sketch is a hint,
/// not a second retrieval loop.
async fn run_pre_sql_recall(
    question: &str,
    generator: &dyn GeneratorClient,
    catalog: &dyn CatalogStore,
    tables: &mut Vec<ContextTable>,
    present: &mut HashSet<String>,
) -> RetrievalResult<()> {
    let prompt = build_sketch_prompt(question, tables);
    let completions = match generator.generate(&prompt, 1, PRE_SQL_RECALL_TEMPERATURE).await {
        Ok(completions) => completions,
        Err(e) => {
            log::warn!("pre-SQL recall generator call failed, skipping: {e}");
            return Ok(());
        }
    };
    let Some(sketch) = completions.into_iter().next() else {
        return Ok(());
    };
    let sketch = strip_code_fence(&sketch);

    let parser = SqlParser::postgres();
    let statement = match parser.parse_single(&sketch) {
        Ok(statement) => statement,
        Err(e) => {
            log::warn!("pre-SQL recall sketch did not parse, skipping: {e}");
            return Ok(());
        }
    };

    let referenced = extract_table_references(&statement);
    let missing: Vec<String> = referenced
        .into_iter()
        .filter(|name| !present.contains(name))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let recalled = catalog.descriptors(&missing).await.map_err(RetrievalError::Catalog)?;
    for descriptor in recalled {
        present.insert(descriptor.name.to_lowercase());
        tables.push(ContextTable {
            retrieval_score: None,
            source: TableSource::PreSqlRecall,
            descriptor,
        });
    }
    Ok(())
}

/// A cheap prompt for the sketch query: table names and one-line summaries
/// only, not the full contract the real generation prompt builds.
fn build_sketch_prompt(question: &str, tables: &[ContextTable]) -> String {
    let mut prompt = String::from(
        "Write a single, rough SQL SELECT using only the tables below that might answer the question. \
         It does not need to be correct or complete, it only needs to name the right tables.\n\nTables:\n",
    );
    for table in tables {
        prompt.push_str(&format!("- {}: {}\n", table.descriptor.name, table.descriptor.summary));
    }
    prompt.push_str(&format!("\nQuestion: {question}\nSQL:"));
    prompt
}

/// Breadth-first expansion over foreign keys up to `config.fk_expansion_depth`
/// hops, capping how many edges a "hub" table (one with many FKs) is allowed
/// to contribute so a single highly-connected table doesn't pull in most of
/// the schema.
async fn expand_via_foreign_keys(
    catalog: &dyn CatalogStore,
    tables: &mut Vec<ContextTable>,
    present: &mut HashSet<String>,
    config: &RetrievalConfig,
) -> RetrievalResult<Vec<FkEdge>> {
    let mut frontier: Vec<String> = present.iter().cloned().collect();
    let mut all_edges: Vec<FkEdge> = Vec::new();
    let mut seen_constraints: HashSet<String> = HashSet::new();

    for _ in 0..config.fk_expansion_depth {
        if frontier.is_empty() {
            break;
        }
        let edges = catalog.fk_edges(&frontier).await.map_err(RetrievalError::Catalog)?;

        let mut degree: HashMap<String, usize> = HashMap::new();
        for edge in &edges {
            *degree.entry(edge.from_table.clone()).or_insert(0) += 1;
            *degree.entry(edge.to_table.clone()).or_insert(0) += 1;
        }

        let mut per_hub_used: HashMap<String, usize> = HashMap::new();
        let mut next_frontier = Vec::new();

        let mut sorted_edges = edges;
        sorted_edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        for edge in sorted_edges {
            if seen_constraints.contains(&edge.constraint_name) {
                continue;
            }
            let from_is_hub = degree.get(&edge.from_table).copied().unwrap_or(0) > config.hub_degree_threshold;
            let to_is_hub = degree.get(&edge.to_table).copied().unwrap_or(0) > config.hub_degree_threshold;
            let hub_table = if from_is_hub {
                Some(edge.from_table.clone())
            } else if to_is_hub {
                Some(edge.to_table.clone())
            } else {
                None
            };
            if let Some(hub) = &hub_table {
                let used = per_hub_used.entry(hub.clone()).or_insert(0);
                if *used >= config.hub_edge_cap {
                    continue;
                }
                *used += 1;
            }

            seen_constraints.insert(edge.constraint_name.clone());
            for candidate in [&edge.from_table, &edge.to_table] {
                let key = candidate.to_lowercase();
                if !present.contains(&key) {
                    present.insert(key.clone());
                    next_frontier.push(candidate.clone());
                }
            }
            all_edges.push(edge);
        }

        if !next_frontier.is_empty() {
            let new_descriptors = catalog
                .descriptors(&next_frontier)
                .await
                .map_err(RetrievalError::Catalog)?;
            for descriptor in new_descriptors {
                tables.push(ContextTable {
                    retrieval_score: None,
                    source: TableSource::FkExpansion,
                    descriptor,
                });
            }
        }

        frontier = next_frontier;
    }

    Ok(all_edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlq_catalog::FakeCatalogStore;
    use nlq_core::types::{ColumnDescriptor, FkEdge, TableDescriptor};
    use nlq_llm::FakeEmbeddingClient;
    use std::collections::HashMap as StdHashMap;

    fn table(name: &str) -> TableDescriptor {
        TableDescriptor {
            name: name.to_string(),
            module: Some("sales".to_string()),
            summary: format!("{name} table"),
            columns: vec![ColumnDescriptor {
                name: "id".to_string(),
                data_type: "integer".to_string(),
                nullable: false,
                is_primary_key: true,
                references: None,
                description: None,
            }],
            row_count_estimate: Some(10),
        }
    }

    #[tokio::test]
    async fn retrieves_and_expands_join_path() {
        let store = FakeCatalogStore::new()
            .with_table(table("orders"), vec![1.0, 0.0])
            .with_table(table("customers"), vec![0.0, 1.0])
            .with_fk_edge(FkEdge {
                constraint_name: "orders_customer_fk".to_string(),
                from_table: "orders".to_string(),
                from_column: "customer_id".to_string(),
                to_table: "customers".to_string(),
                to_column: "id".to_string(),
            });
        let embedder = FakeEmbeddingClient::new(StdHashMap::from([
            ("how many orders".to_string(), vec![1.0, 0.0]),
        ]));
        let config = RetrievalConfig::default();

        let packet = retrieve_schema_context("how many orders", Some(&embedder), None, false, &store, &config)
            .await
            .unwrap();

        assert!(packet.contains_table("orders"));
        assert!(packet.contains_table("customers"));
    }

    #[tokio::test]
    async fn both_channels_failing_is_an_error() {
        let store = FakeCatalogStore::new();
        let config = RetrievalConfig::default();
        let result = retrieve_schema_context("nothing matches", None, None, false, &store, &config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn pre_sql_recall_pulls_in_sketch_tables() {
        use nlq_llm::FakeGeneratorClient;

        let store = FakeCatalogStore::new()
            .with_table(table("orders"), vec![1.0, 0.0])
            .with_table(table("refunds"), vec![0.9, 0.1]);
        let embedder = FakeEmbeddingClient::new(StdHashMap::from([(
            "how many orders".to_string(),
            vec![1.0, 0.0],
        )]));
        let generator = FakeGeneratorClient::new(vec!["SELECT * FROM orders JOIN refunds ON refunds.order_id = orders.id".to_string()]);
        let mut config = RetrievalConfig::default();
        config.fused_top_m = 1;
        config.cosine_top_k = 1;
        config.bm25_top_k = 1;

        let packet = retrieve_schema_context(
            "how many orders",
            Some(&embedder),
            Some(&generator),
            true,
            &store,
            &config,
        )
        .await
        .unwrap();

        assert!(packet.contains_table("refunds"));
        let refunds = packet.table("refunds").unwrap();
        assert!(matches!(refunds.source, TableSource::PreSqlRecall));
    }
}

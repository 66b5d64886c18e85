use super::*;
use async_trait::async_trait;
use nlq_catalog::{CatalogError, CatalogResult, CatalogStore, FakeCatalogStore, SearchHit};
use nlq_core::config::{
    CatalogConfig, Dialect, EmbeddingConfig, EvalConfig, FeatureFlags, GeneratorConfig, LinkerConfig, PlannerConfig,
    RepairConfig, RetrievalConfig, TargetDatabaseConfig,
};
use nlq_core::types::{
    ColumnDescriptor, ExecutionResult, ExplainOutcome, FkEdge, ForeignKeyRef, ModuleDescriptor, ResultColumn,
    TableDescriptor,
};
use nlq_eval::{ExplainClient, FakeExplainClient};
use nlq_exec::FakeExecutor;
use nlq_llm::{FakeEmbeddingClient, FakeGeneratorClient, GeneratorClient, LlmResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn column(name: &str, data_type: &str, pk: bool, references: Option<ForeignKeyRef>) -> ColumnDescriptor {
    ColumnDescriptor {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable: !pk,
        is_primary_key: pk,
        references,
        description: None,
    }
}

fn table(name: &str, columns: Vec<ColumnDescriptor>) -> TableDescriptor {
    TableDescriptor {
        name: name.to_string(),
        module: Some("sales".to_string()),
        summary: format!("{name} table"),
        columns,
        row_count_estimate: Some(1_000),
    }
}

fn fk(constraint: &str, from_table: &str, from_column: &str, to_table: &str, to_column: &str) -> FkEdge {
    FkEdge {
        constraint_name: constraint.to_string(),
        from_table: from_table.to_string(),
        from_column: from_column.to_string(),
        to_table: to_table.to_string(),
        to_column: to_column.to_string(),
    }
}

fn test_config() -> NlqConfig {
    NlqConfig {
        deployment_name: "test".to_string(),
        dialect: Dialect::default(),
        catalog: CatalogConfig::default(),
        database: TargetDatabaseConfig::default(),
        generator: GeneratorConfig::default(),
        embedding: EmbeddingConfig::default(),
        retrieval: RetrievalConfig::default(),
        planner: PlannerConfig::default(),
        eval: EvalConfig::default(),
        repair: RepairConfig::default(),
        linker: LinkerConfig::default(),
        features: FeatureFlags::default(),
    }
}

fn count_result() -> ExecutionResult {
    ExecutionResult {
        columns: vec![ResultColumn {
            name: "count".to_string(),
            data_type: "int8".to_string(),
        }],
        rows: vec![vec![serde_json::json!(3)]],
        row_count: 1,
        truncated: false,
    }
}

fn wiring(
    catalog: FakeCatalogStore,
    generator: impl GeneratorClient + 'static,
    explain: impl ExplainClient + 'static,
) -> Wiring {
    Wiring {
        config: test_config(),
        catalog: Arc::new(catalog),
        generator: Arc::new(generator),
        embedding: Arc::new(FakeEmbeddingClient::new(HashMap::new())),
        explain: Arc::new(explain),
        executor: Arc::new(FakeExecutor::returning(count_result())),
    }
}

/// Returns a single fixed completion per call, advancing through `responses`
/// as `generate()` is invoked again — lets a test drive the initial
/// generation call and the repair loop's regeneration call with genuinely
/// different SQL, which [`FakeGeneratorClient`]'s cycling can't express.
struct SequencedGeneratorClient {
    responses: Vec<&'static str>,
    call_index: Mutex<usize>,
}

impl SequencedGeneratorClient {
    fn new(responses: Vec<&'static str>) -> Self {
        Self {
            responses,
            call_index: Mutex::new(0),
        }
    }
}

#[async_trait]
impl GeneratorClient for SequencedGeneratorClient {
    async fn generate(&self, _prompt: &str, k: usize, _temperature: f32) -> LlmResult<Vec<String>> {
        let mut idx = self.call_index.lock().unwrap();
        let pos = (*idx).min(self.responses.len() - 1);
        let response = self.responses[pos].to_string();
        *idx += 1;
        Ok(std::iter::repeat(response).take(k.max(1)).collect())
    }
}

/// Fails EXPLAIN for any SQL containing `needle`, succeeds otherwise — lets
/// one explain client fail an initial bad candidate and accept its repair
/// within a single `answer()` call.
struct FailsOnSubstring {
    needle: &'static str,
}

#[async_trait]
impl ExplainClient for FailsOnSubstring {
    async fn explain(&self, sql: &str, _timeout_ms: u64) -> ExplainOutcome {
        if sql.contains(self.needle) {
            ExplainOutcome::Error {
                message: format!("column reference \"{}\" not found", self.needle),
            }
        } else {
            ExplainOutcome::Ok {
                estimated_rows: Some(5.0),
                estimated_cost: Some(1.0),
                plan_json: serde_json::json!({}),
            }
        }
    }
}

struct FailingCatalog;

#[async_trait]
impl CatalogStore for FailingCatalog {
    async fn similarity_search(&self, _embedding: &[f32], _top_k: usize) -> CatalogResult<Vec<SearchHit>> {
        Ok(Vec::new())
    }

    async fn bm25_search(&self, _query: &str, _top_k: usize) -> CatalogResult<Vec<SearchHit>> {
        Ok(Vec::new())
    }

    async fn fk_edges(&self, _table_names: &[String]) -> CatalogResult<Vec<FkEdge>> {
        Ok(Vec::new())
    }

    async fn descriptors(&self, _table_names: &[String]) -> CatalogResult<Vec<TableDescriptor>> {
        Ok(Vec::new())
    }

    async fn module_descriptors(&self) -> CatalogResult<Vec<ModuleDescriptor>> {
        Err(CatalogError::Unavailable("connection refused".to_string()))
    }
}

fn employees_table() -> TableDescriptor {
    table(
        "employees",
        vec![
            column("employee_id", "integer", true, None),
            column("first_name", "text", false, None),
            column("last_name", "text", false, None),
            column(
                "department_id",
                "integer",
                false,
                Some(ForeignKeyRef {
                    table: "departments".to_string(),
                    column: "department_id".to_string(),
                }),
            ),
            column("hire_date", "date", false, None),
        ],
    )
}

fn departments_table() -> TableDescriptor {
    table(
        "departments",
        vec![
            column("department_id", "integer", true, None),
            column("name", "text", false, None),
        ],
    )
}

/// Four tables chained by foreign keys, used by the multi-hop scenarios.
/// `order_lines` sits at the hub: it connects `products` (and transitively
/// `product_categories`) on one side and `sales_orders` on the other.
fn revenue_catalog() -> FakeCatalogStore {
    let products = table(
        "products",
        vec![
            column("product_id", "integer", true, None),
            column(
                "category_id",
                "integer",
                false,
                Some(ForeignKeyRef {
                    table: "product_categories".to_string(),
                    column: "category_id".to_string(),
                }),
            ),
            column("name", "text", false, None),
            column("unit_price", "numeric", false, None),
        ],
    );
    let product_categories = table(
        "product_categories",
        vec![
            column("category_id", "integer", true, None),
            column("category_name", "text", false, None),
        ],
    );
    let order_lines = table(
        "order_lines",
        vec![
            column("order_line_id", "integer", true, None),
            column(
                "product_id",
                "integer",
                false,
                Some(ForeignKeyRef {
                    table: "products".to_string(),
                    column: "product_id".to_string(),
                }),
            ),
            column(
                "order_id",
                "integer",
                false,
                Some(ForeignKeyRef {
                    table: "sales_orders".to_string(),
                    column: "order_id".to_string(),
                }),
            ),
            column("quantity", "integer", false, None),
        ],
    );
    let sales_orders = table(
        "sales_orders",
        vec![
            column("order_id", "integer", true, None),
            column("customer_name", "text", false, None),
            column("order_date", "date", false, None),
        ],
    );

    FakeCatalogStore::new()
        .with_table(products, vec![1.0, 0.0])
        .with_table(product_categories, vec![0.0, 1.0])
        .with_table(order_lines, vec![0.5, 0.5])
        .with_table(sales_orders, vec![0.2, 0.8])
        .with_fk_edge(fk("order_lines_product_fk", "order_lines", "product_id", "products", "product_id"))
        .with_fk_edge(fk(
            "order_lines_order_fk",
            "order_lines",
            "order_id",
            "sales_orders",
            "order_id",
        ))
        .with_fk_edge(fk(
            "products_category_fk",
            "products",
            "category_id",
            "product_categories",
            "category_id",
        ))
}

const REVENUE_QUESTION: &str = "Total revenue by product category in 2024";

const REVENUE_SQL_OK: &str = "SELECT pc.category_name, SUM(ol.quantity * p.unit_price) AS revenue \
FROM order_lines ol \
JOIN products p ON ol.product_id = p.product_id \
JOIN product_categories pc ON p.category_id = pc.category_id \
JOIN sales_orders so ON ol.order_id = so.order_id \
WHERE so.order_date >= '2024-01-01' \
GROUP BY pc.category_name";

#[tokio::test]
async fn scenario_a_single_table_lookup() {
    let catalog = FakeCatalogStore::new().with_table(employees_table(), vec![1.0, 0.0]);
    let generator = FakeGeneratorClient::new(vec![
        "SELECT COUNT(*) FROM employees WHERE EXTRACT(YEAR FROM hire_date) = 2024".to_string(),
    ]);
    let w = wiring(catalog, generator, FakeExplainClient::always_ok());

    let question = Question {
        text: "How many employees were hired in 2024?".to_string(),
        database_id: "default".to_string(),
    };
    let outcome = answer(&w, question, AnswerOptions::default()).await.unwrap();

    let sql_lower = outcome.sql.to_lowercase();
    assert!(sql_lower.contains("from employees"));
    assert!(!sql_lower.contains("join"));
    assert_eq!(outcome.result.row_count, 1);
}

#[tokio::test]
async fn scenario_b_two_table_join() {
    let catalog = FakeCatalogStore::new()
        .with_table(employees_table(), vec![1.0, 0.0])
        .with_table(departments_table(), vec![0.0, 1.0])
        .with_fk_edge(fk(
            "employees_department_fk",
            "employees",
            "department_id",
            "departments",
            "department_id",
        ));
    let generator = FakeGeneratorClient::new(vec![
        "SELECT e.first_name, e.last_name FROM employees e \
         JOIN departments d ON e.department_id = d.department_id \
         WHERE d.name = 'Sales'"
            .to_string(),
    ]);
    let w = wiring(catalog, generator, FakeExplainClient::always_ok());

    let question = Question {
        text: "List all employees in the Sales department".to_string(),
        database_id: "default".to_string(),
    };
    let outcome = answer(&w, question, AnswerOptions::default()).await.unwrap();

    let sql_lower = outcome.sql.to_lowercase();
    assert!(sql_lower.contains("from employees"));
    assert!(sql_lower.contains("join departments"));
    assert!(sql_lower.contains("'sales'"));
}

#[tokio::test]
async fn scenario_c_hub_traversal() {
    let generator = FakeGeneratorClient::new(vec![REVENUE_SQL_OK.to_string()]);
    let w = wiring(revenue_catalog(), generator, FakeExplainClient::always_ok());

    let question = Question {
        text: REVENUE_QUESTION.to_string(),
        database_id: "default".to_string(),
    };
    let outcome = answer(&w, question, AnswerOptions::default()).await.unwrap();

    let sql_lower = outcome.sql.to_lowercase();
    for t in ["order_lines", "products", "product_categories", "sales_orders"] {
        assert!(sql_lower.contains(t), "expected {t} in {sql_lower}");
    }
}

#[tokio::test]
async fn scenario_d_column_autocorrect_cross_table_hint() {
    let wrong_sql = "SELECT pc.category_name, SUM(ol.quantity * p.unit_price) AS revenue \
FROM order_lines ol \
JOIN products p ON ol.product_id = p.product_id \
JOIN product_categories pc ON p.category_id = pc.category_id \
JOIN sales_orders so ON ol.order_id = so.order_id \
WHERE ol.order_date >= '2024-01-01' \
GROUP BY pc.category_name";

    let generator = SequencedGeneratorClient::new(vec![wrong_sql, REVENUE_SQL_OK]);
    let explain = FailsOnSubstring { needle: "ol.order_date" };
    let w = wiring(revenue_catalog(), generator, explain);

    let question = Question {
        text: REVENUE_QUESTION.to_string(),
        database_id: "default".to_string(),
    };
    let outcome = answer(&w, question, AnswerOptions { include_trace: true })
        .await
        .unwrap();

    assert!(outcome.sql.contains("so.order_date"));
    assert!(!outcome.sql.contains("ol.order_date"));
    let trace = outcome.trace.unwrap();
    let winner = trace.candidates[trace.selected_candidate_index.unwrap()].clone();
    assert_eq!(winner.repair_attempts, 1);
}

#[tokio::test]
async fn scenario_e_phantom_column_removal() {
    let wrong_sql = "SELECT pc.category_name, SUM(ol.quantity * p.unit_price) AS revenue \
FROM order_lines ol \
JOIN products p ON ol.product_id = p.product_id \
JOIN product_categories pc ON p.category_id = pc.category_id \
JOIN sales_orders so ON ol.order_id = so.order_id \
WHERE p.division = 'West' \
GROUP BY pc.category_name";

    let generator = SequencedGeneratorClient::new(vec![wrong_sql, REVENUE_SQL_OK]);
    let explain = FailsOnSubstring { needle: "p.division" };
    let w = wiring(revenue_catalog(), generator, explain);

    let question = Question {
        text: REVENUE_QUESTION.to_string(),
        database_id: "default".to_string(),
    };
    let outcome = answer(&w, question, AnswerOptions::default()).await.unwrap();

    assert!(!outcome.sql.contains("division"));
}

#[tokio::test]
async fn scenario_f_unsupported_concept() {
    let catalog = FakeCatalogStore::new().with_table(employees_table(), vec![1.0, 0.0]);
    let generator = FakeGeneratorClient::new(vec![
        "SELECT department_id, COUNT(*) FROM employees GROUP BY department_id".to_string(),
    ]);
    let w = wiring(catalog, generator, FakeExplainClient::always_ok());

    let question = Question {
        text: "What is the gross margin by department?".to_string(),
        database_id: "default".to_string(),
    };
    let outcome = answer(&w, question, AnswerOptions { include_trace: true })
        .await
        .unwrap();

    let link_bundle = outcome.trace.unwrap().link_bundle.unwrap();
    assert!(link_bundle.unsupported_concepts.iter().any(|c| c == "margin"));
    assert_eq!(outcome.result.row_count, 1);
}

#[tokio::test]
async fn no_candidates_when_generator_returns_nothing() {
    let catalog = FakeCatalogStore::new().with_table(employees_table(), vec![1.0, 0.0]);
    let generator = FakeGeneratorClient::new(Vec::new());
    let w = wiring(catalog, generator, FakeExplainClient::always_ok());

    let question = Question {
        text: "How many employees were hired in 2024?".to_string(),
        database_id: "default".to_string(),
    };
    let err = answer(&w, question, AnswerOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoCandidates);
}

#[tokio::test]
async fn repair_exhausted_once_attempts_run_out() {
    let catalog = FakeCatalogStore::new().with_table(employees_table(), vec![1.0, 0.0]);
    let generator = FakeGeneratorClient::new(vec!["SELECT * FROM employees".to_string()]);
    let w = Wiring {
        config: NlqConfig {
            repair: RepairConfig {
                max_attempts: 1,
                ..RepairConfig::default()
            },
            ..test_config()
        },
        catalog: Arc::new(catalog),
        generator: Arc::new(generator),
        embedding: Arc::new(FakeEmbeddingClient::new(HashMap::new())),
        explain: Arc::new(FakeExplainClient::always_failing()),
        executor: Arc::new(FakeExecutor::returning(count_result())),
    };

    let question = Question {
        text: "How many employees were hired in 2024?".to_string(),
        database_id: "default".to_string(),
    };
    let err = answer(&w, question, AnswerOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RepairExhausted);
}

#[tokio::test]
async fn catalog_unavailable_surfaces_as_catalog_unavailable_error() {
    let generator = FakeGeneratorClient::new(vec!["SELECT 1".to_string()]);
    let w = wiring(FakeCatalogStore::new(), generator, FakeExplainClient::always_ok());
    let w = Wiring {
        catalog: Arc::new(FailingCatalog),
        ..w
    };

    let question = Question {
        text: "How many employees were hired in 2024?".to_string(),
        database_id: "default".to_string(),
    };
    let err = answer(&w, question, AnswerOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CatalogUnavailable);
}

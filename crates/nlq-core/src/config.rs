//! Process configuration (`nlq.yml`), loaded once at process start.
//!
//! Mirrors the teacher's `featherflow.yml` / `Config::load` pattern: a single
//! `serde_yaml`-deserialized struct with `#[serde(default = "...")]` per
//! optional field, validated immediately after load, with environment
//! variables overriding file values for connection secrets only.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NlqConfig {
    /// Deployment name, surfaced in traces and logs.
    #[serde(default = "default_deployment_name")]
    pub deployment_name: String,

    /// Target SQL dialect. Spec targets a single dialect; this field exists
    /// for forward-compatibility with §1's "Non-goals: cross-dialect
    /// generation" note, not to support switching today.
    #[serde(default)]
    pub dialect: Dialect,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub database: TargetDatabaseConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub eval: EvalConfig,

    #[serde(default)]
    pub repair: RepairConfig,

    #[serde(default)]
    pub linker: LinkerConfig,

    #[serde(default)]
    pub features: FeatureFlags,
}

fn default_deployment_name() -> String {
    "nlq".to_string()
}

/// SQL dialect. Spec §1: "single SQL dialect supporting CTEs, window
/// functions, EXTRACT, EXPLAIN (FORMAT JSON) and a vector-similarity operator".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// Catalog store connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Postgres DSN. Overridden by `NLQ_CATALOG_URL` if set.
    #[serde(default = "default_catalog_url")]
    pub url: String,

    /// Embedding vector dimension, must match the stored columns.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            embedding_dim: default_embedding_dim(),
            pool_size: default_pool_size(),
        }
    }
}

fn default_catalog_url() -> String {
    "postgres://localhost/nlq_catalog".to_string()
}

fn default_embedding_dim() -> usize {
    768
}

fn default_pool_size() -> u32 {
    8
}

/// Target database (the one the final SQL executes against).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDatabaseConfig {
    #[serde(default = "default_target_url")]
    pub url: String,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// `statement_timeout`, in milliseconds, applied per EXPLAIN/execute call.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

impl Default for TargetDatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_target_url(),
            pool_size: default_pool_size(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }
}

fn default_target_url() -> String {
    "postgres://localhost/nlq_target".to_string()
}

fn default_statement_timeout_ms() -> u64 {
    5_000
}

/// Generator (LLM) worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_generator_url")]
    pub url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// K by difficulty bucket: {easy, default, hard}.
    #[serde(default = "default_k_easy")]
    pub k_easy: usize,
    #[serde(default = "default_k_default")]
    pub k_default: usize,
    #[serde(default = "default_k_hard")]
    pub k_hard: usize,

    /// Whether candidate generation fans out in parallel (resource hint).
    #[serde(default = "default_true")]
    pub parallel: bool,

    #[serde(default = "default_generator_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            url: default_generator_url(),
            temperature: default_temperature(),
            k_easy: default_k_easy(),
            k_default: default_k_default(),
            k_hard: default_k_hard(),
            parallel: true,
            timeout_ms: default_generator_timeout_ms(),
        }
    }
}

fn default_generator_url() -> String {
    "http://127.0.0.1:8081/generate".to_string()
}
fn default_temperature() -> f32 {
    0.6
}
fn default_k_easy() -> usize {
    2
}
fn default_k_default() -> usize {
    4
}
fn default_k_hard() -> usize {
    6
}
fn default_generator_timeout_ms() -> u64 {
    20_000
}

/// Embedding worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            timeout_ms: default_embedding_timeout_ms(),
        }
    }
}

fn default_embedding_url() -> String {
    "http://127.0.0.1:8082/embed".to_string()
}
fn default_embedding_timeout_ms() -> u64 {
    5_000
}

/// Retrieval thresholds and fusion parameters (spec §4.2/§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_module_top_k")]
    pub module_top_k: usize,
    #[serde(default = "default_module_floor")]
    pub module_similarity_floor: f32,
    #[serde(default = "default_module_gap")]
    pub module_similarity_gap: f32,
    #[serde(default = "default_max_modules")]
    pub max_modules: usize,

    #[serde(default = "default_cosine_top_k")]
    pub cosine_top_k: usize,
    #[serde(default = "default_cosine_threshold")]
    pub cosine_threshold: f32,
    #[serde(default = "default_bm25_top_k")]
    pub bm25_top_k: usize,
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f32,
    #[serde(default = "default_fused_top_m")]
    pub fused_top_m: usize,

    #[serde(default = "default_fk_expansion_depth")]
    pub fk_expansion_depth: usize,
    #[serde(default = "default_hub_degree_threshold")]
    pub hub_degree_threshold: usize,
    #[serde(default = "default_hub_edge_cap")]
    pub hub_edge_cap: usize,
    #[serde(default = "default_fk_decay_factor")]
    pub fk_expansion_decay: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            module_top_k: default_module_top_k(),
            module_similarity_floor: default_module_floor(),
            module_similarity_gap: default_module_gap(),
            max_modules: default_max_modules(),
            cosine_top_k: default_cosine_top_k(),
            cosine_threshold: default_cosine_threshold(),
            bm25_top_k: default_bm25_top_k(),
            rrf_k: default_rrf_k(),
            fused_top_m: default_fused_top_m(),
            fk_expansion_depth: default_fk_expansion_depth(),
            hub_degree_threshold: default_hub_degree_threshold(),
            hub_edge_cap: default_hub_edge_cap(),
            fk_expansion_decay: default_fk_decay_factor(),
        }
    }
}

fn default_module_top_k() -> usize {
    8
}
fn default_module_floor() -> f32 {
    0.35
}
fn default_module_gap() -> f32 {
    0.1
}
fn default_max_modules() -> usize {
    3
}
fn default_cosine_top_k() -> usize {
    20
}
fn default_cosine_threshold() -> f32 {
    0.2
}
fn default_bm25_top_k() -> usize {
    20
}
fn default_rrf_k() -> f32 {
    60.0
}
fn default_fused_top_m() -> usize {
    12
}
fn default_fk_expansion_depth() -> usize {
    2
}
fn default_hub_degree_threshold() -> usize {
    8
}
fn default_hub_edge_cap() -> usize {
    3
}
fn default_fk_decay_factor() -> f32 {
    0.85
}

/// Join planner configuration (spec §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_k_shortest_paths")]
    pub k_shortest_paths: usize,
    #[serde(default = "default_max_skeletons")]
    pub max_skeletons: usize,
    #[serde(default = "default_hub_traversal_penalty")]
    pub hub_traversal_penalty: f64,
    #[serde(default = "default_child_parent_bonus")]
    pub child_parent_bonus: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            k_shortest_paths: default_k_shortest_paths(),
            max_skeletons: default_max_skeletons(),
            hub_traversal_penalty: default_hub_traversal_penalty(),
            child_parent_bonus: default_child_parent_bonus(),
        }
    }
}

fn default_k_shortest_paths() -> usize {
    3
}
fn default_max_skeletons() -> usize {
    3
}
fn default_hub_traversal_penalty() -> f64 {
    0.5
}
fn default_child_parent_bonus() -> f64 {
    -0.1
}

/// Candidate evaluation configuration (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
    #[serde(default = "default_explain_timeout_ms")]
    pub explain_timeout_ms: u64,
    #[serde(default)]
    pub value_verification_top_n: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_limit: default_max_limit(),
            explain_timeout_ms: default_explain_timeout_ms(),
            value_verification_top_n: 2,
        }
    }
}

fn default_max_limit() -> u64 {
    1000
}
fn default_explain_timeout_ms() -> u64 {
    3_000
}

/// Repair loop configuration (spec §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_confidence_penalty")]
    pub confidence_penalty_per_attempt: f32,
    #[serde(default = "default_autocorrect_threshold")]
    pub autocorrect_confidence_threshold: f32,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            confidence_penalty_per_attempt: default_confidence_penalty(),
            autocorrect_confidence_threshold: default_autocorrect_threshold(),
        }
    }
}

fn default_max_attempts() -> usize {
    3
}
fn default_confidence_penalty() -> f32 {
    0.15
}
fn default_autocorrect_threshold() -> f32 {
    0.75
}

/// One static table-warning rule: whenever `table` ends up in
/// `required_tables` and the question contains any of `trigger_keywords`
/// (whole word, case-insensitive), `message` is surfaced to the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableWarningRule {
    pub table: String,
    pub trigger_keywords: Vec<String>,
    pub message: String,
}

/// Schema linker configuration (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkerConfig {
    /// Minimum blended relevance score (0.3 link count + 0.4 best
    /// confidence + 0.3 retrieval similarity) for a table to be added to
    /// `required_tables`.
    #[serde(default = "default_table_relevance_threshold")]
    pub table_relevance_threshold: f32,

    /// Domain-specific table-warning rules. Empty by default: there is no
    /// universal set of confusable tables to warn about, this is entirely
    /// deployment-specific configuration.
    #[serde(default)]
    pub table_warning_rules: Vec<TableWarningRule>,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            table_relevance_threshold: default_table_relevance_threshold(),
            table_warning_rules: Vec::new(),
        }
    }
}

fn default_table_relevance_threshold() -> f32 {
    0.4
}

/// Feature flags, loaded once per process (spec §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub linker_enabled: bool,
    #[serde(default = "default_true")]
    pub join_planner_enabled: bool,
    #[serde(default)]
    pub pre_sql_recall_enabled: bool,
    #[serde(default)]
    pub value_verification_enabled: bool,
    #[serde(default = "default_true")]
    pub dialect_normalization_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            linker_enabled: true,
            join_planner_enabled: true,
            pre_sql_recall_enabled: false,
            value_verification_enabled: false,
            dialect_normalization_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl NlqConfig {
    /// Load configuration from a file path, applying environment overrides.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: NlqConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from `nlq.yml` in `dir`, falling back to built-in defaults if absent.
    pub fn load_from_dir_or_default(dir: &Path) -> ConfigResult<Self> {
        let path = dir.join("nlq.yml");
        if path.exists() {
            Self::load(&path)
        } else {
            let mut config = Self::default_config();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    fn default_config() -> Self {
        serde_yaml::from_str("deployment_name: nlq\n").expect("built-in default must parse")
    }

    /// Environment overrides follow CLI flag > env var > file default
    /// precedence at the call site; this only applies the env-var tier.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NLQ_CATALOG_URL") {
            self.catalog.url = url;
        }
        if let Ok(url) = std::env::var("NLQ_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(url) = std::env::var("NLQ_GENERATOR_URL") {
            self.generator.url = url;
        }
        if let Ok(url) = std::env::var("NLQ_EMBEDDING_URL") {
            self.embedding.url = url;
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.catalog.embedding_dim == 0 {
            return Err(ConfigError::Invalid {
                message: "catalog.embedding_dim must be non-zero".to_string(),
            });
        }
        if self.repair.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "repair.max_attempts must be at least 1".to_string(),
            });
        }
        if self.retrieval.max_modules == 0 {
            return Err(ConfigError::Invalid {
                message: "retrieval.max_modules must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.linker.table_relevance_threshold) {
            return Err(ConfigError::Invalid {
                message: "linker.table_relevance_threshold must be between 0.0 and 1.0".to_string(),
            });
        }
        Ok(())
    }
}

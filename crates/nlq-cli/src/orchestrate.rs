//! The single orchestrator entry point: `answer()` wires schema retrieval,
//! linking, join planning, prompt construction, candidate generation,
//! evaluation and the repair loop, and execution into one pipeline
//! (spec §2/§6).

use crate::wiring::Wiring;
use nlq_core::config::NlqConfig;
use nlq_core::error::{ErrorKind, OrchestratorError, OrchestratorResult};
use nlq_core::types::{
    AnswerOptions, AnswerOutcome, Candidate, JoinPlan, JoinSkeleton, Question, SchemaContextPacket, SchemaLinkBundle,
    Trace,
};
use nlq_llm::{classify_difficulty, k_for};
use nlq_repair::{build_next_attempt, can_retry, classify, RepairDecision};
use nlq_sql::normalize;
use std::collections::{HashMap, HashSet};

/// Answers one natural-language `question` against `question.database_id`,
/// running the full pipeline once and returning the executed result (or a
/// structured [`OrchestratorError`] with whatever trace was built before
/// the failure).
pub async fn answer(wiring: &Wiring, question: Question, options: AnswerOptions) -> OrchestratorResult<AnswerOutcome> {
    let config = &wiring.config;
    let mut trace = Trace::default();

    let modules = wiring.catalog.module_descriptors().await.map_err(|e| {
        OrchestratorError::new(ErrorKind::CatalogUnavailable, format!("module_descriptors failed: {e}"))
    })?;

    let question_embedding = route_question_embedding(wiring, &question.text).await;
    let routed = nlq_retrieval::route_modules(&question.text, modules, question_embedding.as_deref(), &config.retrieval);
    log::info!(
        "module router selected {} module(s): {}",
        routed.len(),
        routed.iter().map(|r| r.module.name.as_str()).collect::<Vec<_>>().join(", ")
    );

    let context = nlq_retrieval::retrieve_schema_context(
        &question.text,
        Some(wiring.embedding.as_ref()),
        Some(wiring.generator.as_ref()),
        config.features.pre_sql_recall_enabled,
        wiring.catalog.as_ref(),
        &config.retrieval,
    )
    .await
    .map_err(retrieval_error)?;
    trace.context = options.include_trace.then(|| context.clone());

    let link_bundle = build_link_bundle(&question.text, &context, config);
    trace.link_bundle = options.include_trace.then(|| link_bundle.clone());

    let join_plan = build_join_plan(&link_bundle, &context, config)?;
    trace.join_plan = options.include_trace.then(|| join_plan.clone());

    let base_prompt = nlq_llm::build_base_prompt(&question.text, &context, &link_bundle, &join_plan)
        .map_err(|e| OrchestratorError::new(ErrorKind::InfrastructureError, format!("prompt render failed: {e}")))?;

    let difficulty = classify_difficulty(&question.text);
    let k = k_for(difficulty, &config.generator);

    let raw_completions = wiring
        .generator
        .generate(&base_prompt, k, config.generator.temperature)
        .await
        .map_err(|e| OrchestratorError::new(ErrorKind::GeneratorUnavailable, e.to_string()).with_trace_from(&trace))?;

    let mut candidates = dedupe_candidates(raw_completions, config);
    if candidates.is_empty() {
        return Err(OrchestratorError::new(ErrorKind::NoCandidates, "generator returned no completions")
            .with_trace_from(&trace));
    }

    let context_tables: HashSet<String> = context.tables.iter().map(|t| t.descriptor.name.to_lowercase()).collect();
    let context_columns: HashSet<String> = context
        .tables
        .iter()
        .flat_map(|t| t.descriptor.columns.iter().map(|c| c.name.to_lowercase()))
        .collect();

    let winner = run_repair_loop(
        wiring,
        &question.text,
        &mut candidates,
        &context_tables,
        &context_columns,
        &join_plan,
        &context,
        config,
    )
    .await?;

    trace.candidates = candidates.clone();
    trace.selected_candidate_index = Some(winner);

    let selected = &candidates[winner];
    let result = wiring
        .executor
        .execute(&selected.normalized_sql, config.database.statement_timeout_ms, config.eval.max_limit as usize)
        .await
        .map_err(execution_error)?;

    Ok(AnswerOutcome {
        sql: selected.normalized_sql.clone(),
        result,
        trace: options.include_trace.then_some(trace),
    })
}

/// Embeds the question once so the module router can compare it against
/// each module's own embedding (spec §4.2). Degrades to keyword-only
/// routing (`None`) when the embedding worker is unavailable after retry,
/// same failure semantics the schema retriever itself uses.
async fn route_question_embedding(wiring: &Wiring, question: &str) -> Option<Vec<f32>> {
    use nlq_llm::EmbeddingClient;
    match wiring.embedding.embed_with_retry(question).await {
        Ok(embedding) => Some(embedding),
        Err(e) => {
            log::warn!("module router: embedding unavailable, falling back to keyword-only routing: {e}");
            None
        }
    }
}

fn build_link_bundle(question: &str, context: &SchemaContextPacket, config: &NlqConfig) -> SchemaLinkBundle {
    if !config.features.linker_enabled {
        let required_tables: Vec<String> = context.tables.iter().map(|t| t.descriptor.name.clone()).collect();
        return SchemaLinkBundle {
            required_tables,
            linked_columns: Vec::new(),
            value_hints: Vec::new(),
            table_warnings: Vec::new(),
            unsupported_concepts: Vec::new(),
        };
    }
    let mut bundle = nlq_linker::link_schema(question, context, &config.linker);
    if bundle.required_tables.is_empty() {
        bundle.required_tables = context.tables.iter().map(|t| t.descriptor.name.clone()).collect();
    }
    bundle
}

fn build_join_plan(link_bundle: &SchemaLinkBundle, context: &SchemaContextPacket, config: &NlqConfig) -> OrchestratorResult<JoinPlan> {
    if !config.features.join_planner_enabled || link_bundle.required_tables.is_empty() {
        return Ok(JoinPlan {
            best: JoinSkeleton {
                tables_in_order: link_bundle.required_tables.clone(),
                clauses: Vec::new(),
                cost: 0.0,
            },
            alternatives: Vec::new(),
        });
    }
    nlq_planner::plan_join(&link_bundle.required_tables, &context.fk_edges, &config.planner)
        .map_err(|e| OrchestratorError::new(ErrorKind::InfrastructureError, format!("join planner failed: {e}")))
}

/// Builds one candidate per completion, fence-stripping and (optionally)
/// dialect-normalizing each one, then drops duplicates by normalized form,
/// keeping the earliest occurrence (spec §4.7: generation may return the
/// same statement more than once across completions).
fn dedupe_candidates(raw_completions: Vec<String>, config: &NlqConfig) -> Vec<Candidate> {
    let mut seen: HashMap<String, ()> = HashMap::new();
    let mut candidates = Vec::new();
    for raw in raw_completions {
        let normalized = if config.features.dialect_normalization_enabled {
            normalize(&raw)
        } else {
            raw.clone()
        };
        let dedupe_key = normalized.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if seen.contains_key(&dedupe_key) {
            continue;
        }
        seen.insert(dedupe_key, ());
        let mut candidate = Candidate::new(raw);
        candidate.normalized_sql = normalized;
        candidates.push(candidate);
    }
    candidates
}

/// Evaluates `candidates`, and on failure repairs every retryable candidate
/// and re-evaluates, up to `config.repair.max_attempts` rounds.
#[allow(clippy::too_many_arguments)]
async fn run_repair_loop(
    wiring: &Wiring,
    question: &str,
    candidates: &mut Vec<Candidate>,
    context_tables: &HashSet<String>,
    context_columns: &HashSet<String>,
    join_plan: &JoinPlan,
    context: &SchemaContextPacket,
    config: &NlqConfig,
) -> OrchestratorResult<usize> {
    let mut repair_contexts: Vec<nlq_core::types::RepairContext> = candidates.iter().map(|_| Default::default()).collect();

    loop {
        let eval_result = nlq_eval::evaluate_candidates(
            question,
            candidates,
            context_tables,
            context_columns,
            join_plan,
            wiring.explain.as_ref(),
            &config.eval,
            config.repair.confidence_penalty_per_attempt,
        )
        .await;

        match eval_result {
            Ok(winner) => return Ok(winner),
            Err(e) => {
                let mut repaired_any = false;
                for (idx, candidate) in candidates.iter_mut().enumerate() {
                    let decision = classify(candidate);
                    if decision != RepairDecision::Retry || !can_retry(&repair_contexts[idx], &config.repair) {
                        continue;
                    }

                    let attempt = match build_next_attempt(&repair_contexts[idx], candidate, context, &config.repair) {
                        Ok(attempt) => attempt,
                        Err(err) => {
                            log::debug!("candidate {idx}: repair attempt build failed: {err}");
                            continue;
                        }
                    };

                    let delta_prompt = format!("{}\n\n{}", candidate.normalized_sql, attempt.delta_prompt);
                    let regenerated = wiring.generator.generate(&delta_prompt, 1, config.generator.temperature).await;
                    let Ok(mut completions) = regenerated else {
                        continue;
                    };
                    let Some(raw) = completions.pop() else { continue };

                    let normalized = if config.features.dialect_normalization_enabled {
                        normalize(&raw)
                    } else {
                        raw.clone()
                    };

                    let mut new_attempt = attempt;
                    new_attempt.outcome_sql = Some(normalized.clone());
                    repair_contexts[idx].attempts.push(new_attempt);

                    candidate.raw_sql = raw;
                    candidate.normalized_sql = normalized;
                    candidate.repair_attempts = repair_contexts[idx].attempt_count();
                    candidate.validation = None;
                    candidate.lint = None;
                    candidate.explain = None;
                    candidate.score = None;
                    repaired_any = true;
                }

                if !repaired_any {
                    let kind = match &e {
                        nlq_eval::EvalError::NoCandidates => ErrorKind::NoCandidates,
                        nlq_eval::EvalError::ExplainAllFailed => ErrorKind::ExplainAllFailed,
                        nlq_eval::EvalError::Database(_) => ErrorKind::InfrastructureError,
                    };
                    return Err(OrchestratorError::new(kind, e.to_string()));
                }
            }
        }

        if repair_contexts.iter().all(|rc| !can_retry(rc, &config.repair)) {
            return Err(OrchestratorError::new(ErrorKind::RepairExhausted, "repair attempts exhausted for every candidate"));
        }
    }
}

fn retrieval_error(e: nlq_retrieval::RetrievalError) -> OrchestratorError {
    match e {
        nlq_retrieval::RetrievalError::Catalog(c) => OrchestratorError::new(ErrorKind::CatalogUnavailable, c.to_string()),
        nlq_retrieval::RetrievalError::EmbeddingUnavailable(m) => OrchestratorError::new(ErrorKind::EmbeddingUnavailable, m),
        nlq_retrieval::RetrievalError::RetrievalFailed => {
            OrchestratorError::new(ErrorKind::RetrievalFailed, "both cosine and BM25 retrieval failed")
        }
    }
}

fn execution_error(e: nlq_exec::ExecError) -> OrchestratorError {
    match e {
        nlq_exec::ExecError::Timeout(ms) => {
            OrchestratorError::new(ErrorKind::ExecutionTimeout, format!("statement timed out after {ms}ms"))
        }
        nlq_exec::ExecError::Database(db) => OrchestratorError::new(ErrorKind::ExecutionFailed, db.to_string()),
    }
}

trait WithTraceFrom {
    fn with_trace_from(self, trace: &Trace) -> Self;
}

impl WithTraceFrom for OrchestratorError {
    fn with_trace_from(self, trace: &Trace) -> Self {
        match serde_json::to_value(trace) {
            Ok(value) => self.with_trace(value),
            Err(_) => self,
        }
    }
}

#[cfg(test)]
#[path = "orchestrate_test.rs"]
mod tests;

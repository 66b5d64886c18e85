//! Module router: narrows the catalog to a handful of modules before the
//! more expensive table/column-level retrieval runs (spec §4.2).

use nlq_core::config::RetrievalConfig;
use nlq_core::cosine_similarity;
use nlq_core::types::ModuleDescriptor;

/// A module plus how it was found and its score in that pass. Kept simple
/// (no trait object) since the router stays in-process with the catalog
/// store, unlike generation/embedding which cross an HTTP boundary.
#[derive(Debug, Clone)]
pub struct RoutedModule {
    pub module: ModuleDescriptor,
    pub keyword_hit: bool,
    pub embedding_score: Option<f32>,
}

/// Keyword pass: a module matches if any of its configured keywords appears
/// in the question as a whole word (case-insensitive). Unlike a substring
/// match, "order" in the keyword set does not fire on "reorder".
fn keyword_matches(question: &str, module: &ModuleDescriptor) -> bool {
    let question_tokens: Vec<String> = question
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    module
        .keywords
        .iter()
        .any(|keyword| question_tokens.iter().any(|t| t == &keyword.to_lowercase()))
}

/// Embedding pass: cosine similarity between the question embedding and the
/// module's own embedding (the average of its member tables' embeddings,
/// computed at catalog rebuild time). `None` when either vector is missing.
fn embedding_score(module: &ModuleDescriptor, question_embedding: Option<&[f32]>) -> Option<f32> {
    let question_embedding = question_embedding?;
    if module.embedding.is_empty() {
        return None;
    }
    Some(cosine_similarity(question_embedding, &module.embedding))
}

/// Routes `question` to the modules most likely to contain the answer,
/// unioning the keyword and embedding passes and capping at
/// `config.max_modules`. A module with a keyword hit is always kept even if
/// its embedding score is below the floor; purely-embedding modules must
/// clear `module_similarity_floor` and stay within `module_similarity_gap`
/// of the top embedding score.
pub fn route_modules(
    question: &str,
    modules: Vec<ModuleDescriptor>,
    question_embedding: Option<&[f32]>,
    config: &RetrievalConfig,
) -> Vec<RoutedModule> {
    let mut routed: Vec<RoutedModule> = modules
        .into_iter()
        .map(|module| {
            let keyword_hit = keyword_matches(question, &module);
            let embedding_score = embedding_score(&module, question_embedding);
            RoutedModule {
                module,
                keyword_hit,
                embedding_score,
            }
        })
        .collect();

    let top_embedding_score = routed
        .iter()
        .filter_map(|r| r.embedding_score)
        .fold(0.0_f32, f32::max);

    routed.retain(|r| {
        r.keyword_hit
            || r.embedding_score.is_some_and(|score| {
                score >= config.module_similarity_floor
                    && (top_embedding_score - score) <= config.module_similarity_gap
            })
    });

    routed.sort_by(|a, b| {
        let score_a = a.embedding_score.unwrap_or(0.0) + if a.keyword_hit { 1.0 } else { 0.0 };
        let score_b = b.embedding_score.unwrap_or(0.0) + if b.keyword_hit { 1.0 } else { 0.0 };
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.module.name.cmp(&b.module.name))
    });

    routed.truncate(config.max_modules.max(1));
    if routed.is_empty() {
        log::warn!("module router found no matching modules for question");
    }
    routed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, tables: &[&str], keywords: &[&str], embedding: Vec<f32>) -> ModuleDescriptor {
        ModuleDescriptor {
            name: name.to_string(),
            description: format!("{name} module"),
            table_names: tables.iter().map(|t| t.to_string()).collect(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            embedding,
        }
    }

    fn config() -> RetrievalConfig {
        RetrievalConfig::default()
    }

    #[test]
    fn keyword_hit_always_kept() {
        let modules = vec![
            module("sales", &["orders"], &["order", "orders"], vec![]),
            module("hr", &["employees"], &["employee"], vec![]),
        ];
        let routed = route_modules("how many orders", modules, None, &config());
        assert!(routed.iter().any(|r| r.module.name == "sales" && r.keyword_hit));
    }

    #[test]
    fn keyword_match_is_whole_word_not_substring() {
        let modules = vec![module("sales", &["orders"], &["order"], vec![])];
        let routed = route_modules("please reorder the shelf", modules, None, &config());
        assert!(routed.is_empty(), "'order' keyword must not match inside 'reorder'");
    }

    #[test]
    fn embedding_only_module_requires_floor() {
        let modules = vec![module("sales", &["orders"], &[], vec![1.0, 0.0])];
        let low_embedding = vec![0.01, 0.0];
        let routed = route_modules("xyz", modules, Some(&low_embedding), &config());
        assert!(routed.is_empty());
    }

    #[test]
    fn embedding_pass_compares_against_module_embedding() {
        let modules = vec![module("sales", &["orders"], &[], vec![1.0, 0.0])];
        let question_embedding = vec![1.0, 0.0];
        let routed = route_modules("xyz", modules, Some(&question_embedding), &config());
        assert_eq!(routed.len(), 1);
        assert_eq!(routed[0].embedding_score, Some(1.0));
    }

    #[test]
    fn caps_at_max_modules() {
        let modules = vec![
            module("a", &["t1"], &[], vec![0.9, 0.1]),
            module("b", &["t2"], &[], vec![0.8, 0.2]),
            module("c", &["t3"], &[], vec![0.7, 0.3]),
            module("d", &["t4"], &[], vec![0.6, 0.4]),
        ];
        let mut cfg = config();
        cfg.max_modules = 2;
        let question_embedding = vec![1.0, 0.0];
        let routed = route_modules("unrelated text", modules, Some(&question_embedding), &cfg);
        assert_eq!(routed.len(), 2);
    }
}

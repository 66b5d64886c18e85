//! Reciprocal rank fusion: merges two independently-ranked lists into one,
//! by rank rather than by raw score, so cosine similarity and BM25 (which
//! live on unrelated scales) combine meaningfully (spec §4.3).

use std::collections::HashMap;

/// Fuses `lists`, each already sorted best-first, using RRF with constant
/// `k`. Items not present in a given list contribute nothing for that list.
/// Returns `(item, fused_score)` sorted best-first; ties break by the item's
/// `Ord` implementation (stable, deterministic).
pub fn reciprocal_rank_fusion<T: Clone + Eq + std::hash::Hash + Ord>(
    lists: &[Vec<T>],
    k: f32,
) -> Vec<(T, f32)> {
    let mut scores: HashMap<T, f32> = HashMap::new();
    for list in lists {
        for (rank, item) in list.iter().enumerate() {
            let contribution = 1.0 / (k + (rank + 1) as f32);
            *scores.entry(item.clone()).or_insert(0.0) += contribution;
        }
    }
    let mut fused: Vec<(T, f32)> = scores.into_iter().collect();
    fused.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuses_two_lists_by_rank() {
        let cosine = vec!["orders".to_string(), "customers".to_string(), "products".to_string()];
        let bm25 = vec!["customers".to_string(), "orders".to_string()];
        let fused = reciprocal_rank_fusion(&[cosine, bm25], 60.0);
        assert_eq!(fused[0].0, "orders");
        assert_eq!(fused[1].0, "customers");
        assert_eq!(fused[2].0, "products");
    }

    #[test]
    fn item_absent_from_one_list_still_scored() {
        let cosine = vec!["a".to_string()];
        let bm25: Vec<String> = Vec::new();
        let fused = reciprocal_rank_fusion(&[cosine, bm25], 60.0);
        assert_eq!(fused.len(), 1);
        assert!(fused[0].1 > 0.0);
    }

    #[test]
    fn empty_lists_fuse_to_empty() {
        let fused: Vec<(String, f32)> = reciprocal_rank_fusion(&[Vec::new(), Vec::new()], 60.0);
        assert!(fused.is_empty());
    }

    #[test]
    fn deterministic_tie_break_by_ord() {
        let list_a = vec!["b".to_string(), "a".to_string()];
        let list_b = vec!["a".to_string(), "b".to_string()];
        let fused = reciprocal_rank_fusion(&[list_a, list_b], 60.0);
        assert_eq!(fused[0].1, fused[1].1);
        assert_eq!(fused[0].0, "a");
    }
}

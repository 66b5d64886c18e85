//! Adaptive candidate count (spec §4.7): a cheap regex-free keyword
//! classifier buckets the question into {easy, default, hard}, which maps
//! to K candidates via `GeneratorConfig`.

use nlq_core::config::GeneratorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Default,
    Hard,
}

const HARD_MARKERS: &[&str] = &[
    "compare", "correlation", "trend", "percentage of", "rank", "running total", "cohort", "funnel", "median",
];
const EASY_MARKERS: &[&str] = &["list", "show", "what is", "how many", "count of"];

/// Classifies question difficulty by keyword presence. Hard markers win
/// over easy ones when both are present (a comparison question phrased as
/// "how many X compare to Y" is still hard).
pub fn classify_difficulty(question: &str) -> Difficulty {
    let lower = question.to_lowercase();
    if HARD_MARKERS.iter().any(|m| lower.contains(m)) {
        Difficulty::Hard
    } else if EASY_MARKERS.iter().any(|m| lower.contains(m)) {
        Difficulty::Easy
    } else {
        Difficulty::Default
    }
}

/// Maps a difficulty bucket to the configured candidate count K.
pub fn k_for(difficulty: Difficulty, config: &GeneratorConfig) -> usize {
    match difficulty {
        Difficulty::Easy => config.k_easy,
        Difficulty::Default => config.k_default,
        Difficulty::Hard => config.k_hard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_easy_question() {
        assert_eq!(classify_difficulty("How many orders were placed last week?"), Difficulty::Easy);
    }

    #[test]
    fn classifies_hard_question() {
        assert_eq!(
            classify_difficulty("What's the month-over-month trend in revenue?"),
            Difficulty::Hard
        );
    }

    #[test]
    fn classifies_default_question() {
        assert_eq!(classify_difficulty("Which customer placed the largest order?"), Difficulty::Default);
    }

    #[test]
    fn hard_marker_wins_over_easy() {
        assert_eq!(classify_difficulty("How many orders, ranked by revenue?"), Difficulty::Hard);
    }

    #[test]
    fn k_for_maps_each_bucket() {
        let config = GeneratorConfig::default();
        assert_eq!(k_for(Difficulty::Easy, &config), config.k_easy);
        assert_eq!(k_for(Difficulty::Default, &config), config.k_default);
        assert_eq!(k_for(Difficulty::Hard, &config), config.k_hard);
    }
}

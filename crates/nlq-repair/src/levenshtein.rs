//! Small fixed-size Levenshtein distance, hand-rolled rather than pulled in
//! from a string-distance crate — this is the only place the repair loop
//! needs edit distance, and the DP is a dozen lines.

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (n, m) = (a_chars.len(), b_chars.len());

    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let mut row: Vec<usize> = (0..=m).collect();
    for i in 1..=n {
        let mut prev_diag = row[0];
        row[0] = i;
        for j in 1..=m {
            let temp = row[j];
            row[j] = if a_chars[i - 1] == b_chars[j - 1] {
                prev_diag
            } else {
                1 + prev_diag.min(row[j]).min(row[j - 1])
            };
            prev_diag = temp;
        }
    }
    row[m]
}

/// Finds the closest match to `target` among `candidates`, returning it
/// along with its distance, when the distance is within `max_distance`.
pub fn closest_match<'a>(target: &str, candidates: &[&'a str], max_distance: usize) -> Option<(&'a str, usize)> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(&target.to_lowercase(), &c.to_lowercase())))
        .filter(|(_, d)| *d <= max_distance)
        .min_by_key(|(_, d)| *d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_have_zero_distance() {
        assert_eq!(levenshtein("orders", "orders"), 0);
    }

    #[test]
    fn single_substitution() {
        assert_eq!(levenshtein("custmer_id", "customer_id"), 1);
    }

    #[test]
    fn empty_string_distance_is_length() {
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn closest_match_picks_nearest_candidate() {
        let candidates = ["customer_id", "order_id", "product_id"];
        let result = closest_match("custmer_id", &candidates, 2);
        assert_eq!(result, Some(("customer_id", 1)));
    }

    #[test]
    fn closest_match_respects_max_distance() {
        let candidates = ["product_id"];
        let result = closest_match("custmer_id", &candidates, 2);
        assert!(result.is_none());
    }
}

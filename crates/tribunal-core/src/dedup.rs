//! Approximate string deduplication.
//!
//! Different providers phrase the same finding almost identically. Two items
//! are duplicates when their lower-cased, trimmed forms agree on the first
//! [`DEDUP_WINDOW`] characters. Order is stable and the first occurrence wins.

use std::collections::HashSet;

/// Number of leading characters compared.
pub const DEDUP_WINDOW: usize = 60;

/// Comparison key for one item.
pub fn dedup_key(item: &str) -> String {
    item.trim()
        .to_lowercase()
        .chars()
        .take(DEDUP_WINDOW)
        .collect()
}

/// Remove near-duplicates, keeping the first occurrence of each.
pub fn dedup<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(Into::into)
        .filter(|item| seen.insert(dedup_key(item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_case_and_whitespace_collapse() {
        let result = dedup(["Great job!", "GREAT JOB!  ", "Different text"]);
        assert_eq!(result, vec!["Great job!", "Different text"]);
    }

    #[test]
    fn test_shared_prefix_beyond_window_is_duplicate() {
        let prefix = "x".repeat(DEDUP_WINDOW);
        let result = dedup([format!("{prefix} first ending"), format!("{prefix} second ending")]);
        assert_eq!(result.len(), 1);
        assert!(result[0].ends_with("first ending"));
    }

    #[test]
    fn test_short_distinct_strings_survive() {
        let result = dedup(["No banner", "No photo", "no banner"]);
        assert_eq!(result, vec!["No banner", "No photo"]);
    }

    #[test]
    fn test_leading_whitespace_ignored() {
        let result = dedup(["   Add metrics", "add metrics"]);
        assert_eq!(result, vec!["   Add metrics"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedup(Vec::<String>::new()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_dedup_is_idempotent(items in proptest::collection::vec(".{0,80}", 0..20)) {
            let once = dedup(items.clone());
            let twice = dedup(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_dedup_keys_are_unique(items in proptest::collection::vec("[a-cA-C ]{0,8}", 0..30)) {
            let result = dedup(items.clone());
            let keys: HashSet<String> = result.iter().map(|s| dedup_key(s)).collect();
            prop_assert_eq!(keys.len(), result.len());
            prop_assert!(result.len() <= items.len());
        }

        #[test]
        fn prop_dedup_preserves_first_occurrence_order(items in proptest::collection::vec("[a-d]{1,3}", 0..30)) {
            let result = dedup(items.clone());
            let mut cursor = items.iter();
            for kept in &result {
                prop_assert!(cursor.any(|item| item == kept));
            }
        }
    }
}

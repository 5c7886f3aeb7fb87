//! Property-based tests for history deduplication

use std::collections::HashSet;

use proptest::prelude::*;
use rli::HistoryStore;

fn line_strategy() -> impl Strategy<Value = String> {
    // Small alphabet so duplicates are common
    prop_oneof![
        "[abc]{1,3}",
        "[abc]{1,2} [xy]{1,2}",
        Just(String::new()),
        Just("   ".to_string()),
    ]
}

proptest! {
    #[test]
    fn test_never_contains_duplicates(lines in prop::collection::vec(line_strategy(), 0..100)) {
        let mut history = HistoryStore::new();
        for line in &lines {
            history.record(line);
        }

        let entries: Vec<&str> = history.entries().collect();
        let unique: HashSet<&str> = entries.iter().copied().collect();
        prop_assert_eq!(entries.len(), unique.len());
    }

    #[test]
    fn test_holds_every_distinct_non_blank_line(lines in prop::collection::vec(line_strategy(), 0..100)) {
        let mut history = HistoryStore::new();
        for line in &lines {
            history.record(line);
        }

        let expected: HashSet<&str> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        let actual: HashSet<&str> = history.entries().collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn test_last_recorded_line_is_most_recent(
        lines in prop::collection::vec(line_strategy(), 0..50),
        last in "[abc]{1,3}",
    ) {
        let mut history = HistoryStore::new();
        for line in &lines {
            history.record(line);
        }
        history.record(&last);
        history.record(&last);

        prop_assert_eq!(history.latest(), Some(last.as_str()));
        prop_assert_eq!(history.entries().filter(|e| *e == last).count(), 1);
    }

    #[test]
    fn test_limit_is_respected(
        lines in prop::collection::vec(line_strategy(), 0..100),
        limit in 1usize..10,
    ) {
        let mut history = HistoryStore::with_limit(Some(limit));
        for line in &lines {
            history.record(line);
        }
        prop_assert!(history.len() <= limit);
    }

    #[test]
    fn test_entries_reverse_oldest_first(lines in prop::collection::vec(line_strategy(), 0..50)) {
        let mut history = HistoryStore::new();
        for line in &lines {
            history.record(line);
        }

        let mut newest_first: Vec<&str> = history.entries().collect();
        newest_first.reverse();
        let oldest_first: Vec<&str> = history.oldest_first().collect();
        prop_assert_eq!(newest_first, oldest_first);
    }
}

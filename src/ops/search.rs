use std::collections::BTreeMap;
use std::ops::Range;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::todo::TodoItem;

/// Where a matching todo lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// The active set
    Active,
    /// The completed file for a day
    Completed(NaiveDate),
}

/// A search hit on a todo title
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub bucket: Bucket,
    pub item: &'a TodoItem,
    pub spans: Vec<Range<usize>>,
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Search titles in the active set, then every completed day (most recent
/// day first).
pub fn search_todos<'a>(
    re: &Regex,
    active: &'a [TodoItem],
    completed: &'a BTreeMap<NaiveDate, Vec<TodoItem>>,
) -> Vec<SearchHit<'a>> {
    let mut hits = Vec::new();

    for item in active {
        let spans = find_matches(re, &item.title);
        if !spans.is_empty() {
            hits.push(SearchHit {
                bucket: Bucket::Active,
                item,
                spans,
            });
        }
    }

    for (day, items) in completed.iter().rev() {
        for item in items {
            let spans = find_matches(re, &item.title);
            if !spans.is_empty() {
                hits.push(SearchHit {
                    bucket: Bucket::Completed(*day),
                    item,
                    spans,
                });
            }
        }
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> (Vec<TodoItem>, BTreeMap<NaiveDate, Vec<TodoItem>>) {
        let today = day("2025-06-15");
        let active = vec![
            TodoItem::active("Write quarterly report", today),
            TodoItem::active("Buy milk", today),
        ];
        let mut completed = BTreeMap::new();
        completed.insert(
            day("2025-06-01"),
            vec![TodoItem::completed("Draft report outline", day("2025-06-01"))],
        );
        completed.insert(
            day("2025-06-10"),
            vec![
                TodoItem::completed("Report to manager", day("2025-06-10")),
                TodoItem::completed("Buy bread", day("2025-06-10")),
            ],
        );
        (active, completed)
    }

    #[test]
    fn finds_active_then_recent_completed() {
        let (active, completed) = sample();
        let re = Regex::new("(?i)report").unwrap();
        let hits = search_todos(&re, &active, &completed);

        let found: Vec<(Bucket, &str)> = hits
            .iter()
            .map(|h| (h.bucket, h.item.title.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (Bucket::Active, "Write quarterly report"),
                (Bucket::Completed(day("2025-06-10")), "Report to manager"),
                (Bucket::Completed(day("2025-06-01")), "Draft report outline"),
            ]
        );
    }

    #[test]
    fn records_match_spans() {
        let (active, completed) = sample();
        let re = Regex::new("Buy").unwrap();
        let hits = search_todos(&re, &active, &completed);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].spans, vec![0..3]);
    }

    #[test]
    fn no_matches() {
        let (active, completed) = sample();
        let re = Regex::new("dentist").unwrap();
        assert!(search_todos(&re, &active, &completed).is_empty());
    }
}

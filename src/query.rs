// Query pipeline: status filter, then text search, then sort

use crate::models::Task;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Which tasks to keep by completion state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.is_completed,
            StatusFilter::Pending => !task.is_completed,
        }
    }
}

/// Direction of the text sort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Completed => write!(f, "completed"),
            StatusFilter::Pending => write!(f, "pending"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" => Ok(StatusFilter::Completed),
            "pending" => Ok(StatusFilter::Pending),
            other => Err(format!("Unknown status filter: {}", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("Unknown sort order: {}", other)),
        }
    }
}

/// Criteria for one view of the collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub status: StatusFilter,
    /// Case-insensitive substring; empty matches everything
    pub search: String,
    pub sort: SortOrder,
}

impl Query {
    pub fn new(status: StatusFilter, search: impl Into<String>, sort: SortOrder) -> Self {
        Self {
            status,
            search: search.into(),
            sort,
        }
    }
}

/// Derive the ordered view of `tasks` described by `query`
///
/// Stages run in a fixed order: status filter, text search, then a stable
/// sort on the text. Ties keep the order they had after the search stage in
/// both directions.
pub fn query<'a>(tasks: &'a [Task], query: &Query) -> Vec<&'a Task> {
    let needle = query.search.to_lowercase();

    let mut view: Vec<&Task> = tasks
        .iter()
        .filter(|task| query.status.matches(task))
        .filter(|task| needle.is_empty() || task.text.to_lowercase().contains(&needle))
        .collect();

    match query.sort {
        SortOrder::Asc => view.sort_by(|a, b| collate(&a.text, &b.text)),
        SortOrder::Desc => view.sort_by(|a, b| collate(&b.text, &a.text)),
    }

    view
}

/// Locale-aware text ordering
///
/// Compares in three levels, like a root-locale collator: base letters
/// with accents and case removed, then accents, then case with lowercase
/// first. Text is decomposed (NFD) first, so precomposed and combining
/// forms of the same letter compare equal.
pub fn collate(a: &str, b: &str) -> Ordering {
    let primary = base_letters(a).cmp(base_letters(b));
    if primary != Ordering::Equal {
        return primary;
    }

    let secondary = a.nfd().flat_map(char::to_lowercase).cmp(b.nfd().flat_map(char::to_lowercase));
    if secondary != Ordering::Equal {
        return secondary;
    }

    for (x, y) in a.nfd().zip(b.nfd()) {
        if x == y {
            continue;
        }
        match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => return x.cmp(&y),
        }
    }

    a.nfd().count().cmp(&b.nfd().count())
}

fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskFields, TaskId};

    fn task(text: &str, completed: bool) -> Task {
        let mut task = Task::new(TaskId::generate(), TaskFields::new(text));
        task.is_completed = completed;
        task
    }

    fn texts(view: &[&Task]) -> Vec<String> {
        view.iter().map(|t| t.text.clone()).collect()
    }

    fn sample() -> Vec<Task> {
        vec![task("Buy milk", false), task("apple", true), task("Call mom", false)]
    }

    #[test]
    fn test_pending_ascending() {
        let tasks = sample();
        let view = query(&tasks, &Query::new(StatusFilter::Pending, "", SortOrder::Asc));
        assert_eq!(texts(&view), vec!["Buy milk", "Call mom"]);
    }

    #[test]
    fn test_all_sorts_case_insensitively() {
        let tasks = sample();
        let view = query(&tasks, &Query::default());
        assert_eq!(texts(&view), vec!["apple", "Buy milk", "Call mom"]);

        let view = query(&tasks, &Query::new(StatusFilter::All, "", SortOrder::Desc));
        assert_eq!(texts(&view), vec!["Call mom", "Buy milk", "apple"]);
    }

    #[test]
    fn test_completed_only() {
        let tasks = sample();
        let view = query(&tasks, &Query::new(StatusFilter::Completed, "", SortOrder::Asc));
        assert_eq!(texts(&view), vec!["apple"]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let tasks = sample();
        let view = query(&tasks, &Query::new(StatusFilter::All, "MIL", SortOrder::Asc));
        assert_eq!(texts(&view), vec!["Buy milk"]);

        let view = query(&tasks, &Query::new(StatusFilter::All, "l", SortOrder::Asc));
        assert_eq!(texts(&view), vec!["apple", "Buy milk", "Call mom"]);
    }

    #[test]
    fn test_search_applies_after_status_filter() {
        let tasks = sample();
        let view = query(&tasks, &Query::new(StatusFilter::Pending, "apple", SortOrder::Asc));
        assert!(view.is_empty());
    }

    #[test]
    fn test_sort_is_stable_for_equal_text() {
        let tasks = vec![task("same", false), task("other", false), task("same", true)];
        let first = tasks[0].id;
        let last = tasks[2].id;

        let asc = query(&tasks, &Query::default());
        assert_eq!(texts(&asc), vec!["other", "same", "same"]);
        assert_eq!(asc[1].id, first);
        assert_eq!(asc[2].id, last);

        let desc = query(&tasks, &Query::new(StatusFilter::All, "", SortOrder::Desc));
        assert_eq!(texts(&desc), vec!["same", "same", "other"]);
        assert_eq!(desc[0].id, first);
        assert_eq!(desc[1].id, last);
    }

    #[test]
    fn test_query_is_deterministic() {
        let tasks = sample();
        let q = Query::new(StatusFilter::All, "a", SortOrder::Desc);
        let a: Vec<_> = query(&tasks, &q).iter().map(|t| t.id).collect();
        let b: Vec<_> = query(&tasks, &q).iter().map(|t| t.id).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_collate() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("Zoo", "apple"), Ordering::Greater);
        assert_eq!(collate("a", "A"), Ordering::Less);
        assert_eq!(collate("A", "a"), Ordering::Greater);
        assert_eq!(collate("same", "same"), Ordering::Equal);
        assert_eq!(collate("ab", "abc"), Ordering::Less);
    }

    #[test]
    fn test_collate_accented_text() {
        assert_eq!(collate("Água", "banana"), Ordering::Less);
        assert_eq!(collate("Ótimo", "Zebra"), Ordering::Less);
        assert_eq!(collate("Estudar", "Ótimo"), Ordering::Less);
        assert_eq!(collate("ação", "acaso"), Ordering::Less);

        // Accent only decides when the base letters match
        assert_eq!(collate("e", "é"), Ordering::Less);
        assert_eq!(collate("é", "f"), Ordering::Less);
        assert_eq!(collate("é", "É"), Ordering::Less);

        // Precomposed and combining forms are the same text
        assert_eq!(collate("caf\u{e9}", "cafe\u{301}"), Ordering::Equal);
    }

    #[test]
    fn test_collate_mixed_scripts() {
        assert_eq!(collate("Zürich", "Ωmega"), Ordering::Less);
        assert_eq!(collate("ωmega", "Ωmega"), Ordering::Less);
        assert_eq!(collate("straße", "strasse"), Ordering::Greater);
    }

    #[test]
    fn test_sort_accented_texts() {
        let tasks = vec![
            task("Zebra", false),
            task("Ótimo", false),
            task("Estudar", false),
            task("Água", false),
            task("banana", false),
        ];

        let asc = query(&tasks, &Query::default());
        assert_eq!(texts(&asc), vec!["Água", "banana", "Estudar", "Ótimo", "Zebra"]);

        let desc = query(&tasks, &Query::new(StatusFilter::All, "", SortOrder::Desc));
        assert_eq!(texts(&desc), vec!["Zebra", "Ótimo", "Estudar", "banana", "Água"]);
    }

    #[test]
    fn test_desc_keeps_accented_ties_in_order() {
        let tasks = vec![
            task("Água", false),
            task("Ótimo", false),
            task("A\u{301}gua", true),
        ];
        let first = tasks[0].id;
        let last = tasks[2].id;

        let desc = query(&tasks, &Query::new(StatusFilter::All, "", SortOrder::Desc));
        assert_eq!(desc[0].text, "Ótimo");
        assert_eq!(desc[1].id, first);
        assert_eq!(desc[2].id, last);
    }

    #[test]
    fn test_parse_filter_and_order() {
        assert_eq!("Pending".parse::<StatusFilter>().unwrap(), StatusFilter::Pending);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("done".parse::<StatusFilter>().is_err());
        assert_eq!(StatusFilter::Completed.to_string(), "completed");
    }
}

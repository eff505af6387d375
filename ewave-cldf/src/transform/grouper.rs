//! Group association rows into one-to-many relations.
//!
//! Association tables (`cc.csv`, `examplesource.csv`, `valueexample.csv`)
//! list one pair per row. They are turned into ordered lists per owner:
//!
//! ```text
//! association rows (any order)       →  lists per owner (sorted)
//! ┌──────────────────────────┐          ┌──────────────────────┐
//! │ value 12, sentence 301   │          │ 12 → [298, 301]      │
//! │ value 9,  sentence 17    │    →     │ 9  → [17]            │
//! │ value 12, sentence 298   │          └──────────────────────┘
//! └──────────────────────────┘
//! ```
//!
//! Rows are sorted by a composite key whose first component is the owner, so
//! list order is reproducible whatever the order of the input file.

use std::collections::HashMap;

use crate::models::{ContributorAssignment, ExampleSourceRecord, ValueExampleRecord};

use super::reference::Reference;

/// Sort `rows` by `sort_key` and collect `item`s per `owner`.
///
/// `sort_key` must order by owner first.
pub fn group_by_owner<R, K, T>(
    mut rows: Vec<R>,
    sort_key: impl Fn(&R) -> K,
    owner: impl Fn(&R) -> String,
    item: impl Fn(&R) -> T,
) -> HashMap<String, Vec<T>>
where
    K: Ord,
{
    rows.sort_by_cached_key(|r| sort_key(r));

    let mut groups: HashMap<String, Vec<T>> = HashMap::new();
    for row in &rows {
        groups.entry(owner(row)).or_default().push(item(row));
    }
    groups
}

/// Language ID → contributor IDs, by rank.
pub fn contributors_by_language(rows: Vec<ContributorAssignment>) -> HashMap<String, Vec<String>> {
    group_by_owner(
        rows,
        ContributorAssignment::sort_key,
        |r| r.language.to_string(),
        |r| r.contributor.to_string(),
    )
}

/// Example ID → formatted references, by source key.
pub fn sources_by_example(rows: Vec<ExampleSourceRecord>) -> HashMap<String, Vec<String>> {
    group_by_owner(
        rows,
        ExampleSourceRecord::sort_key,
        |r| r.example.to_string(),
        |r| Reference::new(r.source.as_str(), &r.description).to_string(),
    )
}

/// Value ID → example sentence IDs, by sentence.
pub fn examples_by_value(rows: Vec<ValueExampleRecord>) -> HashMap<String, Vec<String>> {
    group_by_owner(
        rows,
        ValueExampleRecord::sort_key,
        |r| r.value.to_string(),
        |r| r.sentence.to_string(),
    )
}

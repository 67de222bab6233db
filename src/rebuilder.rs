use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::data_models::{LinkEntry, MergedByType, ResultItem, SearchData, SearchResponse};
use crate::error::FilterError;

/// Before/after link occurrences for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTally {
    pub before: usize,
    pub after: usize,
}

impl CategoryTally {
    pub fn filtered(&self) -> usize {
        self.before - self.after
    }
}

/// Per-request accounting, keyed by category name across both containers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    tallies: BTreeMap<String, CategoryTally>,
}

impl CategoryCounts {
    pub fn add(&mut self, category: &str, before: usize, after: usize) {
        let tally = self.tallies.entry(category.to_string()).or_default();
        tally.before += before;
        tally.after += after;
    }

    pub fn get(&self, category: &str) -> Option<CategoryTally> {
        self.tallies.get(category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CategoryTally)> {
        self.tallies.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn total_before(&self) -> usize {
        self.tallies.values().map(|t| t.before).sum()
    }

    pub fn total_after(&self) -> usize {
        self.tallies.values().map(|t| t.after).sum()
    }
}

fn is_valid(entry: &LinkEntry, valid: &HashSet<String>) -> bool {
    entry.url.as_deref().is_some_and(|url| valid.contains(url))
}

fn keep_valid(entries: &[LinkEntry], valid: &HashSet<String>) -> Vec<LinkEntry> {
    entries
        .iter()
        .filter(|entry| is_valid(entry, valid))
        .cloned()
        .collect()
}

/// Filter every category; categories left with no links are dropped.
pub fn rebuild_merged(
    merged: &MergedByType,
    valid: &HashSet<String>,
    counts: &mut CategoryCounts,
) -> MergedByType {
    let mut rebuilt = MergedByType::with_capacity(merged.len());
    for (category, entries) in merged {
        let kept = keep_valid(entries, valid);
        counts.add(category, entries.len(), kept.len());
        if !kept.is_empty() {
            rebuilt.insert(category.clone(), kept);
        }
    }
    rebuilt
}

/// Filter the links of every item; items left with no links are dropped.
/// Every other field of a surviving item is copied unchanged.
pub fn rebuild_results(
    results: &[ResultItem],
    valid: &HashSet<String>,
    counts: &mut CategoryCounts,
) -> Vec<ResultItem> {
    let mut rebuilt = Vec::with_capacity(results.len());
    for item in results {
        for entry in &item.links {
            let after = usize::from(is_valid(entry, valid));
            counts.add(entry.category_or_unknown(), 1, after);
        }

        let kept = keep_valid(&item.links, valid);
        if !kept.is_empty() {
            rebuilt.push(ResultItem {
                links: kept,
                fields: item.fields.clone(),
            });
        }
    }
    rebuilt
}

/// Rebuild the searchable payload using only links in `valid`.
///
/// `total` is the number of surviving items, or the size of `valid` when no
/// item survives.
pub fn rebuild_data(data: &SearchData, valid: &HashSet<String>) -> (SearchData, CategoryCounts) {
    let mut counts = CategoryCounts::default();

    let merged_by_type = data
        .merged_by_type()
        .map(|merged| rebuild_merged(merged, valid, &mut counts))
        .unwrap_or_default();
    let results = rebuild_results(data.results(), valid, &mut counts);

    let total = if results.is_empty() {
        valid.len()
    } else {
        results.len()
    };

    let rebuilt = SearchData {
        total: Some(Value::from(total)),
        results: Some(results),
        merged_by_type: Some(merged_by_type),
        ..Default::default()
    };
    (rebuilt, counts)
}

/// Rebuild `upstream` in place of its `data` object.
///
/// Every other top-level key of the upstream JSON (`code`, `message`, nulls
/// included) is kept as received; `data` becomes
/// `{total, results, merged_by_type}`.
pub fn rebuild_response(
    upstream: Value,
    response: &SearchResponse,
    valid: &HashSet<String>,
) -> Result<(Value, CategoryCounts), FilterError> {
    let empty = SearchData::default();
    let (data, counts) = rebuild_data(response.data.as_ref().unwrap_or(&empty), valid);
    let data = serde_json::to_value(&data)?;

    let rebuilt = match upstream {
        Value::Object(mut envelope) => {
            envelope.insert("data".to_string(), data);
            Value::Object(envelope)
        }
        _ => {
            return Err(FilterError::Malformed {
                reason: "top-level payload is not an object".to_string(),
            });
        }
    };
    Ok((rebuilt, counts))
}

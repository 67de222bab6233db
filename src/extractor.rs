use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::data_models::{LinkEntry, SearchData, SearchResponse};
use crate::error::FilterError;

/// Which container a link occurrence was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    MergedByType,
    Results { item: usize },
}

/// One occurrence of a URL inside the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLocation {
    pub container: Container,
    pub position: usize,
    pub category: String,
}

impl fmt::Display for LinkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.container {
            Container::MergedByType => write!(
                f,
                "merged_by_type[{}][{}]",
                self.category, self.position
            ),
            Container::Results { item } => write!(f, "results[{}].links[{}]", item, self.position),
        }
    }
}

/// Distinct URLs of a response plus where each one occurs.
///
/// `unique` keeps first-seen order so the validator request is deterministic.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtractedLinks {
    unique: Vec<String>,
    seen: HashSet<String>,
    locations: HashMap<String, Vec<LinkLocation>>,
}

impl ExtractedLinks {
    fn record(&mut self, url: &str, location: LinkLocation) {
        if self.seen.insert(url.to_string()) {
            self.unique.push(url.to_string());
        }
        self.locations
            .entry(url.to_string())
            .or_default()
            .push(location);
    }

    pub fn unique(&self) -> &[String] {
        &self.unique
    }

    pub fn unique_set(&self) -> &HashSet<String> {
        &self.seen
    }

    pub fn len(&self) -> usize {
        self.unique.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unique.is_empty()
    }

    pub fn locations(&self, url: &str) -> &[LinkLocation] {
        self.locations.get(url).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total occurrences across both containers, duplicates included.
    pub fn occurrences(&self) -> usize {
        self.locations.values().map(Vec::len).sum()
    }

    /// Occurrences whose URL is not in `valid`.
    pub fn dropped_occurrences(&self, valid: &HashSet<String>) -> usize {
        self.locations
            .iter()
            .filter(|(url, _)| !valid.contains(*url))
            .map(|(_, locs)| locs.len())
            .sum()
    }
}

fn link_url<'a>(entry: &'a LinkEntry, location: &LinkLocation) -> Result<&'a str, FilterError> {
    entry
        .url
        .as_deref()
        .ok_or_else(|| FilterError::MissingUrl {
            location: location.to_string(),
        })
}

/// Collect every link URL reachable from `merged_by_type` and from the
/// `links` of every result item. Missing containers count as empty.
pub fn extract_links(response: &SearchResponse) -> Result<ExtractedLinks, FilterError> {
    match &response.data {
        Some(data) => extract_from_data(data),
        None => Ok(ExtractedLinks::default()),
    }
}

pub fn extract_from_data(data: &SearchData) -> Result<ExtractedLinks, FilterError> {
    let mut extracted = ExtractedLinks::default();

    if let Some(merged) = data.merged_by_type() {
        for (category, entries) in merged {
            for (position, entry) in entries.iter().enumerate() {
                let location = LinkLocation {
                    container: Container::MergedByType,
                    position,
                    category: category.clone(),
                };
                let url = link_url(entry, &location)?;
                extracted.record(url, location);
            }
        }
    }

    for (item, result) in data.results().iter().enumerate() {
        for (position, entry) in result.links.iter().enumerate() {
            let location = LinkLocation {
                container: Container::Results { item },
                position,
                category: entry.category_or_unknown().to_string(),
            };
            let url = link_url(entry, &location)?;
            extracted.record(url, location);
        }
    }

    Ok(extracted)
}

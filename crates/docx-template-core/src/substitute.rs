use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::accessor::collect_containers;
use crate::error::Result;
use crate::model::Document;
use crate::replace::replace_all;

/// Placeholder token → replacement value.
pub type PlaceholderMap = BTreeMap<String, String>;

/// Parse a flat JSON object of string values, e.g. `{"{{NAME}}": "Ana"}`.
pub fn parse_placeholder_map(json: &str) -> Result<PlaceholderMap> {
    Ok(serde_json::from_str(json)?)
}

/// Number of substitutions made per placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubstitutionReport {
    pub counts: BTreeMap<String, usize>,
}

impl SubstitutionReport {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Placeholders that matched nowhere.
    pub fn unmatched(&self) -> impl Iterator<Item = &str> {
        self.counts
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(k, _)| k.as_str())
    }

    /// Fold another story's counts into this report.
    pub fn merge(&mut self, other: SubstitutionReport) {
        for (placeholder, n) in other.counts {
            *self.counts.entry(placeholder).or_default() += n;
        }
    }
}

/// Apply every placeholder of `map` to every paragraph of `document`.
pub fn apply_all(document: &mut Document, map: &PlaceholderMap) -> SubstitutionReport {
    let mut report = SubstitutionReport::default();
    let mut paragraphs = collect_containers(document);

    for (placeholder, value) in map {
        let count: usize = paragraphs
            .iter_mut()
            .map(|p| replace_all(p, placeholder, value))
            .sum();
        debug!(placeholder = placeholder.as_str(), count, "applied placeholder");
        report.counts.insert(placeholder.clone(), count);
    }
    report
}

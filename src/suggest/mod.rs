//! Tag suggestions for autocomplete.
//!
//! A [`SuggestionSource`] turns a typed query into candidate tags. The
//! bundled [`CatalogSource`] filters a JSON catalog the way the remote
//! autocomplete endpoint does (case-insensitive substring on name or category)
//! and ranks matches with a fuzzy matcher.

use crate::formula::Tag;
use anyhow::Context;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of suggestions returned for a query.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 8;

/// A candidate tag offered by a suggestion source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestionItem {
    pub id: String,
    pub name: String,
    pub value: f64,
    pub category: String,
}

impl From<SuggestionItem> for Tag {
    fn from(item: SuggestionItem) -> Self {
        Tag {
            id: item.id,
            name: item.name,
            value: item.value,
            category: item.category,
        }
    }
}

/// Produces tag suggestions for a query.
///
/// An empty query yields no suggestions. Errors are reported to the caller,
/// which treats them as "no suggestions available".
pub trait SuggestionSource {
    fn suggest(&self, query: &str) -> anyhow::Result<Vec<SuggestionItem>>;
}

/// Suggestion source backed by an in-memory catalog.
#[derive(Clone, Debug, Default)]
pub struct CatalogSource {
    items: Vec<SuggestionItem>,
    max_results: usize,
}

impl CatalogSource {
    pub fn new(items: Vec<SuggestionItem>) -> Self {
        Self {
            items,
            max_results: DEFAULT_MAX_SUGGESTIONS,
        }
    }

    /// Limit the number of suggestions returned per query.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Parse a catalog from a JSON array of suggestion items.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let items: Vec<SuggestionItem> =
            serde_json::from_str(json).context("Failed to parse suggestion catalog")?;
        Ok(Self::new(items))
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let source = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), count = source.len(), "loaded catalog");
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Filter and rank catalog items for a query.
    ///
    /// Items whose name or category contains the query (ignoring case) are
    /// kept, best fuzzy score first; ties keep catalog order.
    pub fn filter_items(items: &[SuggestionItem], query: &str) -> Vec<usize> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(usize, i64)> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                item.name.to_lowercase().contains(&needle)
                    || item.category.to_lowercase().contains(&needle)
            })
            .map(|(idx, item)| {
                let score = matcher
                    .fuzzy_match(&item.name, query)
                    .or_else(|| matcher.fuzzy_match(&item.category, query))
                    .unwrap_or(0);
                (idx, score)
            })
            .collect();

        // Stable sort keeps catalog order among equal scores
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(idx, _)| idx).collect()
    }
}

impl SuggestionSource for CatalogSource {
    fn suggest(&self, query: &str) -> anyhow::Result<Vec<SuggestionItem>> {
        Ok(Self::filter_items(&self.items, query)
            .into_iter()
            .take(self.max_results)
            .filter_map(|idx| self.items.get(idx).cloned())
            .collect())
    }
}

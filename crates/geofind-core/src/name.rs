//! Per-country inverted name index with fuzzy fallback.
//!
//! The inverted map takes `(country, term)` to the ids of the cities known
//! under that term, where a term is either a canonical name or an alternate
//! name. The BK-tree holds every distinct term so a misspelled query can
//! fall back to the closest stored spellings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bktree::BkTree;
use crate::city::{City, CityId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameIndex {
    inverted: HashMap<String, HashMap<String, Vec<CityId>>>,
    tree: BkTree,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a city under its name and every alternate name.
    pub fn insert(&mut self, city: &City, id: CityId) {
        let country = self.inverted.entry(city.country.clone()).or_default();
        for term in std::iter::once(city.name.as_str())
            .chain(city.alt_names.iter().map(String::as_str))
        {
            if term.is_empty() {
                continue;
            }
            country.entry(term.to_owned()).or_default().push(id);
            self.tree.add(term);
        }
    }

    /// Number of distinct terms across all countries.
    pub fn num_terms(&self) -> usize {
        self.tree.len()
    }

    /// Exact match first; otherwise the BK-tree proposes terms within
    /// `max_distance` edits, tried in tree traversal order, and the first
    /// one with a non-empty bucket in the requested country wins. Buckets
    /// keep insertion order, so the first id is the earliest matching city
    /// in file-input order.
    pub fn find(&self, name: &str, country: &str, max_distance: u32) -> Option<CityId> {
        let buckets = self.inverted.get(country)?;
        if let Some(ids) = buckets.get(name) {
            if let Some(&id) = ids.first() {
                return Some(id);
            }
        }
        for candidate in self.tree.search(name, max_distance) {
            if let Some(&id) = buckets.get(candidate).and_then(|ids| ids.first()) {
                return Some(id);
            }
        }
        None
    }
}

//! Two-level postal-code map: country → postal code → entry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::city::City;

/// One row of the postal-code registry. `(country_code, postal_code)` is the
/// primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostalEntry {
    pub country_code: String,
    pub postal_code: String,
    pub place_name: String,
    pub admin_name1: String,
    pub admin_code1: String,
    pub admin_name2: String,
    pub admin_code2: String,
    pub admin_name3: String,
    pub admin_code3: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostalIndex {
    entries: HashMap<String, HashMap<String, PostalEntry>>,
}

impl PostalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry under its `(country, postal)` key. A duplicate key
    /// replaces the previous entry, so the last row in scan order wins.
    pub fn insert(&mut self, entry: PostalEntry) {
        self.entries
            .entry(entry.country_code.clone())
            .or_default()
            .insert(entry.postal_code.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a postal code and synthesizes a [`City`] from the entry's
    /// place name and coordinates.
    pub fn find(&self, code: &str, country: &str) -> Option<City> {
        let entry = self.entries.get(country)?.get(code)?;
        Some(City {
            name: entry.place_name.clone(),
            country: entry.country_code.clone(),
            latitude: entry.latitude,
            longitude: entry.longitude,
            alt_names: Vec::new(),
        })
    }
}

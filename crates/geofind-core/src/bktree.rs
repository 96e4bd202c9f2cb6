//! BK-tree over Levenshtein distance, for bounded-edit-distance lookups.
//!
//! Each node stores one term; the child under key `d` is the subtree of
//! terms at edit distance exactly `d` from that node's term. The triangle
//! inequality then lets a range search visit only children whose key lies in
//! `[d - max, d + max]` around the query's distance `d` to the node.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn edit_distance(a: &str, b: &str) -> u32 {
    strsim::levenshtein(a, b) as u32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node {
    term: String,
    children: BTreeMap<u32, Node>,
}

impl Node {
    fn new(term: String) -> Self {
        Self {
            term,
            children: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BkTree {
    root: Option<Box<Node>>,
    len: usize,
}

impl BkTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct terms stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a term. Duplicates are detected on the way down (distance 0)
    /// and ignored.
    pub fn add(&mut self, term: &str) {
        let Some(root) = self.root.as_deref_mut() else {
            self.root = Some(Box::new(Node::new(term.to_owned())));
            self.len = 1;
            return;
        };
        let mut node = root;
        loop {
            let d = edit_distance(term, &node.term);
            if d == 0 {
                return;
            }
            match node.children.entry(d) {
                Entry::Occupied(slot) => node = slot.into_mut(),
                Entry::Vacant(slot) => {
                    slot.insert(Node::new(term.to_owned()));
                    self.len += 1;
                    return;
                }
            }
        }
    }

    /// All stored terms within `max` edits of `query`, in tree traversal
    /// order (depth-first, children visited in ascending distance key).
    pub fn search(&self, query: &str, max: u32) -> Vec<&str> {
        let mut out = Vec::new();
        if let Some(root) = self.root.as_deref() {
            Self::search_node(root, query, max, &mut out);
        }
        out
    }

    fn search_node<'a>(node: &'a Node, query: &str, max: u32, out: &mut Vec<&'a str>) {
        let d = edit_distance(query, &node.term);
        if d <= max {
            out.push(&node.term);
        }
        let low = d.saturating_sub(max).max(1);
        let high = d + max;
        if high < low {
            return;
        }
        for child in node.children.range(low..=high).map(|(_, c)| c) {
            Self::search_node(child, query, max, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TERMS: &[&str] = &[
        "Beijing", "Berlin", "Bern", "Bergen", "Belgrade", "Bristol", "Brest", "Boston",
        "Peking", "北京市",
    ];

    fn tree() -> BkTree {
        let mut t = BkTree::new();
        for term in TERMS {
            t.add(term);
        }
        t
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut t = tree();
        assert_eq!(t.len(), TERMS.len());
        t.add("Berlin");
        assert_eq!(t.len(), TERMS.len());
    }

    #[test]
    fn finds_terms_within_bound() {
        let t = tree();
        let hits = t.search("Bejing", 2);
        assert!(hits.contains(&"Beijing"));
        assert!(!hits.contains(&"Boston"));

        assert!(t.search("Brest", 0).contains(&"Brest"));
        assert!(t.search("xylophone", 2).is_empty());
    }

    #[test]
    fn distance_is_over_codepoints() {
        let t = tree();
        // One codepoint dropped from a CJK term is edit distance 1.
        assert!(t.search("北京", 1).contains(&"北京市"));
    }

    #[test]
    fn matches_brute_force() {
        let t = tree();
        for query in ["Berln", "bern", "Bristol", "Pekin", "Begrade", ""] {
            for max in 0..=3u32 {
                let mut expect: Vec<&str> = TERMS
                    .iter()
                    .copied()
                    .filter(|term| edit_distance(query, term) <= max)
                    .collect();
                let mut got = t.search(query, max);
                expect.sort_unstable();
                got.sort_unstable();
                assert_eq!(got, expect, "query {query:?} max {max}");
            }
        }
    }

    #[test]
    fn empty_tree_searches_cleanly() {
        let t = BkTree::new();
        assert!(t.is_empty());
        assert!(t.search("anything", 2).is_empty());
    }
}

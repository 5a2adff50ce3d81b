//! InteractionTable - symmetric weighted co-mention counts

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::registry::CanonicalName;

/// Tolerance used when comparing accumulated weights
pub const WEIGHT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionTable {
    weights: HashMap<CanonicalName, HashMap<CanonicalName, f64>>,
}

impl InteractionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to both (a, b) and (b, a). Self-pairs are ignored.
    pub fn add_pair(&mut self, a: &str, b: &str, weight: f64) {
        if a == b {
            return;
        }
        self.add_directed(a, b, weight);
        self.add_directed(b, a, weight);
    }

    fn add_directed(&mut self, from: &str, to: &str, weight: f64) {
        *self
            .weights
            .entry(from.to_string())
            .or_default()
            .entry(to.to_string())
            .or_insert(0.0) += weight;
    }

    /// Sum every entry of `other` into this table
    pub fn merge(&mut self, other: &InteractionTable) {
        for (from, row) in &other.weights {
            let target = self.weights.entry(from.clone()).or_default();
            for (to, weight) in row {
                *target.entry(to.clone()).or_insert(0.0) += weight;
            }
        }
    }

    pub fn weight(&self, a: &str, b: &str) -> f64 {
        self.weights
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(0.0)
    }

    /// Outgoing neighbours of `name`
    pub fn neighbors(&self, name: &str) -> impl Iterator<Item = (&str, f64)> {
        self.weights
            .get(name)
            .into_iter()
            .flat_map(|row| row.iter().map(|(n, w)| (n.as_str(), *w)))
    }

    /// Sum of outgoing weights of `name`
    pub fn strength(&self, name: &str) -> f64 {
        self.neighbors(name).map(|(_, w)| w).sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    /// Every directed entry (each undirected pair appears twice)
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.weights.iter().flat_map(|(from, row)| {
            row.iter().map(move |(to, w)| (from.as_str(), to.as_str(), *w))
        })
    }

    pub fn node_count(&self) -> usize {
        self.weights.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.weights.values().map(HashMap::len).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn is_symmetric(&self) -> bool {
        self.entries()
            .all(|(a, b, w)| (self.weight(b, a) - w).abs() <= WEIGHT_EPSILON)
    }

    /// Equality within floating tolerance
    pub fn approx_eq(&self, other: &InteractionTable) -> bool {
        let covers = |x: &InteractionTable, y: &InteractionTable| {
            x.entries()
                .all(|(a, b, w)| (y.weight(a, b) - w).abs() <= WEIGHT_EPSILON)
        };
        covers(self, other) && covers(other, self)
    }

    /// Ordered copy for stable rendering
    pub fn to_sorted(&self) -> BTreeMap<CanonicalName, BTreeMap<CanonicalName, f64>> {
        self.weights
            .iter()
            .map(|(from, row)| {
                let row = row.iter().map(|(to, w)| (to.clone(), *w)).collect();
                (from.clone(), row)
            })
            .collect()
    }

    /// Keep only the directed entries accepted by `keep`, dropping empty rows
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str, &str, f64) -> bool) {
        for (from, row) in self.weights.iter_mut() {
            row.retain(|to, w| keep(from.as_str(), to.as_str(), *w));
        }
        self.weights.retain(|_, row| !row.is_empty());
    }
}

impl FromIterator<(CanonicalName, CanonicalName, f64)> for InteractionTable {
    fn from_iter<I: IntoIterator<Item = (CanonicalName, CanonicalName, f64)>>(iter: I) -> Self {
        let mut table = InteractionTable::new();
        for (a, b, w) in iter {
            table.add_pair(&a, &b, w);
        }
        table
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str, f64)]) -> InteractionTable {
        pairs
            .iter()
            .map(|(a, b, w)| (a.to_string(), b.to_string(), *w))
            .collect()
    }

    #[test]
    fn test_add_pair_is_symmetric() {
        let mut t = InteractionTable::new();
        t.add_pair("гарри поттер", "рон уизли", 0.5);
        t.add_pair("рон уизли", "гарри поттер", 0.5);

        assert_eq!(t.weight("гарри поттер", "рон уизли"), 1.0);
        assert_eq!(t.weight("рон уизли", "гарри поттер"), 1.0);
        assert_eq!(t.edge_count(), 1);
        assert!(t.is_symmetric());
    }

    #[test]
    fn test_self_pair_ignored() {
        let mut t = InteractionTable::new();
        t.add_pair("добби", "добби", 1.0);
        assert!(t.is_empty());
    }

    #[test]
    fn test_merge_sums_and_creates() {
        let mut global = table(&[("a", "b", 1.0)]);
        let local = table(&[("a", "b", 0.5), ("b", "c", 2.0)]);
        global.merge(&local);

        assert_eq!(global.weight("a", "b"), 1.5);
        assert_eq!(global.weight("c", "b"), 2.0);
        assert_eq!(global.node_count(), 3);
    }

    #[test]
    fn test_merge_commutative() {
        let t1 = table(&[("a", "b", 0.5), ("a", "c", 0.1)]);
        let t2 = table(&[("a", "b", 0.2), ("c", "d", 0.3)]);

        let mut left = InteractionTable::new();
        left.merge(&t1);
        left.merge(&t2);

        let mut right = InteractionTable::new();
        right.merge(&t2);
        right.merge(&t1);

        assert!(left.approx_eq(&right));
        assert!(!left.approx_eq(&t1));
    }

    #[test]
    fn test_strength_and_neighbors() {
        let t = table(&[("a", "b", 2.0), ("a", "c", 1.5)]);
        assert_eq!(t.strength("a"), 3.5);
        assert_eq!(t.strength("b"), 2.0);
        assert_eq!(t.strength("zzz"), 0.0);
        assert_eq!(t.neighbors("a").count(), 2);
    }

    #[test]
    fn test_to_sorted_is_ordered() {
        let t = table(&[("b", "a", 1.0), ("c", "a", 1.0)]);
        let sorted = t.to_sorted();
        let keys: Vec<&String> = sorted.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}

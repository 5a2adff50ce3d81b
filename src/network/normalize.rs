//! GraphNormalizer - threshold filtering of the global table
//!
//! | Step | Rule                                                        |
//! |------|-------------------------------------------------------------|
//! | 1    | drop edges with weight < `min_edge_weight`                  |
//! | 2    | node is strong if its remaining weight ≥ `min_node_weight`  |
//! | 3    | keep edges whose endpoints are both strong                  |
//!
//! With `min_documents` set, characters resolved in fewer documents are
//! removed from the aggregate before step 1.
//!
//! Step 2 runs once. Removing edges in step 3 can leave a strong node below
//! the threshold; it is not re-evaluated unless `prune_to_fixpoint` is set.

use std::collections::{BTreeMap, HashMap, HashSet};

use rustworkx_core::petgraph::graph::{NodeIndex, UnGraph};

use super::aggregate::Aggregate;
use super::registry::CanonicalName;
use super::table::{InteractionTable, WEIGHT_EPSILON};
use crate::config::GraphConfig;
use crate::error::CastResult;

// =============================================================================
// Formatting
// =============================================================================

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// "гарри поттер" -> "Гарри Поттер"
pub fn format_name(name: &str) -> String {
    name.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One decimal place
pub fn round_weight(weight: f64) -> f64 {
    (weight * 10.0).round() / 10.0
}

// =============================================================================
// GraphNormalizer
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphNormalizer {
    pub min_edge_weight: f64,
    pub min_node_weight: f64,
    pub prune_to_fixpoint: bool,
    pub min_documents: usize,
}

impl Default for GraphNormalizer {
    fn default() -> Self {
        Self::from_config(&GraphConfig::default())
    }
}

impl GraphNormalizer {
    pub fn new(min_edge_weight: f64, min_node_weight: f64) -> Self {
        GraphNormalizer {
            min_edge_weight,
            min_node_weight,
            prune_to_fixpoint: false,
            min_documents: 0,
        }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        GraphNormalizer {
            min_edge_weight: config.min_edge_weight,
            min_node_weight: config.min_node_weight,
            prune_to_fixpoint: config.prune_to_fixpoint,
            min_documents: config.min_documents,
        }
    }

    /// Drop characters below `min_documents`, then [`Self::normalize`].
    /// Tables merged with `merge_table` carry no document counts and are
    /// dropped entirely when the knob is set.
    pub fn normalize_aggregate(&self, aggregate: &Aggregate) -> FinalGraph {
        if self.min_documents == 0 {
            return self.normalize(&aggregate.table);
        }

        let frequent = |name: &str| {
            aggregate.document_frequency.get(name).copied().unwrap_or(0) >= self.min_documents
        };
        let mut table = aggregate.table.clone();
        table.retain(|a, b, _| frequent(a) && frequent(b));
        self.normalize(&table)
    }

    pub fn normalize(&self, table: &InteractionTable) -> FinalGraph {
        let mut graph = table.clone();
        let min_edge = self.min_edge_weight - WEIGHT_EPSILON;
        graph.retain(|_, _, w| w >= min_edge);

        loop {
            let strong = self.strong_nodes(&graph);
            let before = graph.node_count();
            graph.retain(|a, b, _| strong.contains(a) && strong.contains(b));

            if !self.prune_to_fixpoint || graph.node_count() == before {
                break;
            }
        }

        FinalGraph { table: graph }
    }

    fn strong_nodes(&self, table: &InteractionTable) -> HashSet<String> {
        let min_node = self.min_node_weight - WEIGHT_EPSILON;
        table
            .nodes()
            .filter(|n| table.strength(n) >= min_node)
            .map(str::to_string)
            .collect()
    }
}

// =============================================================================
// FinalGraph
// =============================================================================

/// The filtered relationship graph. Weights keep full precision; rounding
/// happens only in [`FinalGraph::formatted`] and [`FinalGraph::to_json`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalGraph {
    table: InteractionTable,
}

impl FinalGraph {
    pub fn table(&self) -> &InteractionTable {
        &self.table
    }

    pub fn weight(&self, a: &str, b: &str) -> f64 {
        self.table.weight(a, b)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.neighbors(name).next().is_some()
    }

    /// Canonical node names, sorted
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = self.table.nodes().collect();
        nodes.sort_unstable();
        nodes
    }

    pub fn node_count(&self) -> usize {
        self.table.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.table.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Capitalized names, weights rounded to one decimal
    pub fn formatted(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.table
            .to_sorted()
            .into_iter()
            .map(|(from, row)| {
                let row = row
                    .into_iter()
                    .map(|(to, w)| (format_name(&to), round_weight(w)))
                    .collect();
                (format_name(&from), row)
            })
            .collect()
    }

    /// Pretty JSON of [`FinalGraph::formatted`]; non-ASCII names kept as is
    pub fn to_json(&self) -> CastResult<String> {
        Ok(serde_json::to_string_pretty(&self.formatted())?)
    }

    /// Undirected petgraph export for layout/rendering collaborators.
    /// Node weights are display names, edge weights full precision.
    pub fn to_graph(&self) -> UnGraph<String, f64> {
        let mut graph = UnGraph::with_capacity(self.node_count(), self.edge_count());
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();

        for name in self.nodes() {
            index.insert(name, graph.add_node(format_name(name)));
        }

        let mut edges: Vec<(&str, &str, f64)> =
            self.table.entries().filter(|(a, b, _)| a < b).collect();
        edges.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));

        for (a, b, w) in edges {
            if let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) {
                graph.add_edge(ia, ib, w);
            }
        }
        graph
    }

    /// Canonical (uncapitalized, unrounded) ordered view
    pub fn to_canonical(&self) -> BTreeMap<CanonicalName, BTreeMap<CanonicalName, f64>> {
        self.table.to_sorted()
    }

    pub fn into_table(self) -> InteractionTable {
        self.table
    }
}

// =============================================================================
// Tests
// =============================================================================

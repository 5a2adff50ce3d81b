//! RelationAggregator - merges per-document tables into the global table
//!
//! Workers never touch the global table directly. Each finished document is
//! merged whole, one writer at a time. Addition is order independent, so the
//! result does not depend on which worker finishes first (up to floating
//! point rounding).

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use super::registry::CanonicalName;
use super::scorer::{DocumentScore, ScoreStats};
use super::table::InteractionTable;

/// Global aggregate after all documents were merged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aggregate {
    pub table: InteractionTable,
    /// Number of documents each character was resolved in
    pub document_frequency: BTreeMap<CanonicalName, usize>,
    /// Documents merged (failed documents are not counted)
    pub documents: usize,
    pub stats: ScoreStats,
}

#[derive(Debug, Default)]
pub struct RelationAggregator {
    inner: Mutex<Aggregate>,
}

impl RelationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Aggregate> {
        // A panicking writer leaves at most one whole merge missing; keep going
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge one finished document
    pub fn merge(&self, score: &DocumentScore) {
        let mut agg = self.lock();
        agg.table.merge(&score.table);
        for name in score.characters() {
            *agg.document_frequency.entry(name.to_string()).or_insert(0) += 1;
        }
        agg.stats.absorb(&score.stats);
        agg.documents += 1;
    }

    /// Merge a bare table (no per-document bookkeeping)
    pub fn merge_table(&self, table: &InteractionTable) {
        self.lock().table.merge(table);
    }

    /// Copy of the current global table
    pub fn snapshot(&self) -> InteractionTable {
        self.lock().table.clone()
    }

    pub fn into_inner(self) -> Aggregate {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! ContextTracker - recency window for alias disambiguation
//!
//! A bare alias shared by several characters ("Смит") resolves to whichever
//! of them was mentioned most recently in the running narrative.
//! One tracker per document; it is never shared between documents.

use std::collections::{BTreeSet, VecDeque};

use super::registry::{CanonicalName, CharacterRegistry};

pub const DEFAULT_CONTEXT_WINDOW: usize = 5;

#[derive(Debug, Clone)]
pub struct ContextTracker<'r> {
    registry: &'r CharacterRegistry,
    /// Most recent at the back
    window: VecDeque<CanonicalName>,
    capacity: usize,
}

impl<'r> ContextTracker<'r> {
    pub fn new(registry: &'r CharacterRegistry, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        ContextTracker {
            registry,
            window: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Record a resolved mention, moving it to the back of the window.
    /// Names the registry does not know are ignored.
    pub fn record(&mut self, name: &str) {
        if !self.registry.is_canonical(name) {
            return;
        }

        if let Some(idx) = self.window.iter().position(|n| n == name) {
            self.window.remove(idx);
        }
        self.window.push_back(name.to_string());

        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    /// Most recently recorded name that is also in `candidates`
    pub fn most_recent_match(&self, candidates: &BTreeSet<CanonicalName>) -> Option<&str> {
        self.window
            .iter()
            .rev()
            .find(|name| candidates.contains(*name))
            .map(String::as_str)
    }

    /// Window contents, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &str> {
        self.window.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================

//! InteractionScorer - per-sentence resolution and pairwise weighting
//!
//! # Per sentence
//! 1. Tokens go through the [`DialogueSegmenter`]; closed spans contribute
//!    their participants to the sentence's dialogue set.
//! 2. Person mentions resolve to canonical names:
//!    full name → itself, unique alias → its owner, shared alias → most
//!    recent owner in the [`ContextTracker`], else the lexicographically
//!    smallest owner. Unknown aliases are dropped.
//! 3. Every unordered pair of distinct characters gets `0.5`, or `1.0` when
//!    both are dialogue participants, added symmetrically.
//!
//! A scorer carries the narrative state of exactly one document. Build a new
//! one for every document.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::annotate::{MentionSpan, Sentence};
use super::context::ContextTracker;
use super::dialogue::{DialogueSegmenter, SpeakerAttribution};
use super::registry::{normalize_name, CanonicalName, CharacterRegistry};
use super::table::InteractionTable;
use crate::config::GraphConfig;

/// Weight for a plain co-mention in one sentence
pub const CO_MENTION_WEIGHT: f64 = 0.5;
/// Weight when both characters took part in the same dialogue span
pub const DIALOGUE_WEIGHT: f64 = 1.0;

// =============================================================================
// Result Types
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub sentences: usize,
    /// Person mentions seen
    pub mentions: usize,
    pub resolved: usize,
    /// Mentions whose alias is unknown
    pub dropped: usize,
    /// Resolutions that had several candidates
    pub ambiguous: usize,
    pub dialogue_spans: usize,
}

impl ScoreStats {
    pub fn absorb(&mut self, other: &ScoreStats) {
        self.sentences += other.sentences;
        self.mentions += other.mentions;
        self.resolved += other.resolved;
        self.dropped += other.dropped;
        self.ambiguous += other.ambiguous;
        self.dialogue_spans += other.dialogue_spans;
    }
}

/// Everything one document contributes to the aggregate
#[derive(Debug, Clone, Default)]
pub struct DocumentScore {
    pub table: InteractionTable,
    /// Resolved mentions per character
    pub mentions: BTreeMap<CanonicalName, usize>,
    pub stats: ScoreStats,
}

impl DocumentScore {
    /// Characters resolved at least once in this document
    pub fn characters(&self) -> impl Iterator<Item = &str> {
        self.mentions.keys().map(String::as_str)
    }
}

// =============================================================================
// InteractionScorer
// =============================================================================

pub struct InteractionScorer<'a> {
    registry: &'a CharacterRegistry,
    tracker: ContextTracker<'a>,
    segmenter: DialogueSegmenter<'a>,
    score: DocumentScore,
}

impl<'a> InteractionScorer<'a> {
    pub fn new(
        registry: &'a CharacterRegistry,
        config: &'a GraphConfig,
        speakers: &'a dyn SpeakerAttribution,
    ) -> Self {
        InteractionScorer {
            registry,
            tracker: ContextTracker::new(registry, config.context_window),
            segmenter: DialogueSegmenter::new(&config.quote_glyphs, registry, speakers),
            score: DocumentScore::default(),
        }
    }

    /// Score a whole document and hand back its local table
    pub fn score_document(mut self, sentences: &[Sentence]) -> DocumentScore {
        for sentence in sentences {
            self.score_sentence(sentence);
        }
        self.finish()
    }

    pub fn score_sentence(&mut self, sentence: &Sentence) {
        self.score.stats.sentences += 1;

        let mut dialogue_set: BTreeSet<CanonicalName> = BTreeSet::new();
        for token in &sentence.tokens {
            if let Some(participants) = self.segmenter.feed(token) {
                self.score.stats.dialogue_spans += 1;
                dialogue_set.extend(participants);
            }
        }

        let mut present: BTreeSet<CanonicalName> = dialogue_set.clone();
        for span in sentence.mentions.iter().filter(|m| m.is_person()) {
            self.score.stats.mentions += 1;
            match self.resolve(span) {
                Some(name) => {
                    self.score.stats.resolved += 1;
                    *self.score.mentions.entry(name.clone()).or_insert(0) += 1;
                    present.insert(name);
                }
                None => self.score.stats.dropped += 1,
            }
        }

        let present: Vec<&CanonicalName> = present.iter().collect();
        for (i, a) in present.iter().enumerate() {
            for b in &present[i + 1..] {
                let weight = if dialogue_set.contains(*a) && dialogue_set.contains(*b) {
                    DIALOGUE_WEIGHT
                } else {
                    CO_MENTION_WEIGHT
                };
                self.score.table.add_pair(a, b, weight);
            }
        }
    }

    /// Resolve one mention and record it in the recency window
    pub fn resolve(&mut self, span: &MentionSpan) -> Option<CanonicalName> {
        let key = normalize_name(span.key());
        if key.is_empty() {
            return None;
        }

        let name = if self.registry.is_canonical(&key) {
            key
        } else {
            let registry = self.registry;
            let candidates = registry.resolve_alias(&key);
            match candidates.len() {
                0 => return None,
                1 => candidates.iter().next()?.clone(),
                _ => {
                    self.score.stats.ambiguous += 1;
                    let chosen = match self.tracker.most_recent_match(candidates) {
                        Some(recent) => recent.to_string(),
                        None => candidates.iter().next()?.clone(),
                    };
                    debug!(alias = %key, chosen = %chosen, candidates = candidates.len(), "ambiguous alias resolved");
                    chosen
                }
            }
        };

        self.tracker.record(&name);
        Some(name)
    }

    pub fn context(&self) -> &ContextTracker<'a> {
        &self.tracker
    }

    pub fn finish(self) -> DocumentScore {
        self.score
    }
}

// =============================================================================
// Tests
// =============================================================================

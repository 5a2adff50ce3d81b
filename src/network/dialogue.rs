//! DialogueSegmenter - quotation-span tracking
//!
//! Two states, `Outside` (initial) and `Inside`. Any configured quote glyph
//! toggles between them; opening and closing glyphs are not distinguished,
//! so `«` ... `«` closes a span just like `«` ... `»`.
//!
//! Participants are collected while inside a span and flushed when it
//! closes. Who gets added is up to a [`SpeakerAttribution`] strategy; the
//! default one adds nobody, so closed spans yield an empty set.

use std::collections::BTreeSet;

use super::registry::{CanonicalName, CharacterRegistry};

// =============================================================================
// Speaker attribution
// =============================================================================

/// Strategy that names dialogue participants from tokens inside a quote
pub trait SpeakerAttribution: Send + Sync {
    /// Canonical name of a participant evidenced by `token`, if any
    fn attribute(&self, token: &str, registry: &CharacterRegistry) -> Option<CanonicalName>;
}

/// Default strategy: never attributes anyone
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpeakerAttribution;

impl SpeakerAttribution for NoSpeakerAttribution {
    fn attribute(&self, _token: &str, _registry: &CharacterRegistry) -> Option<CanonicalName> {
        None
    }
}

// =============================================================================
// DialogueSegmenter
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    Outside,
    Inside,
}

pub struct DialogueSegmenter<'a> {
    state: DialogueState,
    participants: BTreeSet<CanonicalName>,
    glyphs: &'a [String],
    registry: &'a CharacterRegistry,
    speakers: &'a dyn SpeakerAttribution,
}

impl<'a> DialogueSegmenter<'a> {
    pub fn new(
        glyphs: &'a [String],
        registry: &'a CharacterRegistry,
        speakers: &'a dyn SpeakerAttribution,
    ) -> Self {
        DialogueSegmenter {
            state: DialogueState::Outside,
            participants: BTreeSet::new(),
            glyphs,
            registry,
            speakers,
        }
    }

    /// Feed one token. Returns the participant set only when this token
    /// closes a dialogue span.
    pub fn feed(&mut self, token: &str) -> Option<BTreeSet<CanonicalName>> {
        if self.glyphs.iter().any(|g| g == token) {
            return match self.state {
                DialogueState::Outside => {
                    self.state = DialogueState::Inside;
                    None
                }
                DialogueState::Inside => {
                    self.state = DialogueState::Outside;
                    Some(std::mem::take(&mut self.participants))
                }
            };
        }

        if self.state == DialogueState::Inside {
            if let Some(name) = self.speakers.attribute(token, self.registry) {
                self.participants.insert(name);
            }
        }
        None
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn in_dialogue(&self) -> bool {
        self.state == DialogueState::Inside
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;

    /// Attributes any token that is a known alias with a single owner
    struct AliasSpeakers;

    impl SpeakerAttribution for AliasSpeakers {
        fn attribute(&self, token: &str, registry: &CharacterRegistry) -> Option<CanonicalName> {
            let owners = registry.resolve_alias(token);
            if owners.len() == 1 {
                owners.iter().next().cloned()
            } else {
                None
            }
        }
    }

    fn registry() -> CharacterRegistry {
        CharacterRegistry::from_lines(["Гарри Поттер", "Рон Уизли"]).unwrap()
    }

    #[test]
    fn test_toggle_yields_only_on_close() {
        let r = registry();
        let glyphs = GraphConfig::default().quote_glyphs;
        let mut seg = DialogueSegmenter::new(&glyphs, &r, &NoSpeakerAttribution);

        assert_eq!(seg.state(), DialogueState::Outside);
        assert_eq!(seg.feed("«"), None);
        assert!(seg.in_dialogue());
        assert_eq!(seg.feed("Гарри"), None);

        let closed = seg.feed("»");
        assert_eq!(closed, Some(BTreeSet::new()), "default strategy yields empty set");
        assert_eq!(seg.state(), DialogueState::Outside);
    }

    #[test]
    fn test_any_glyph_toggles() {
        let r = registry();
        let glyphs = GraphConfig::default().quote_glyphs;
        let mut seg = DialogueSegmenter::new(&glyphs, &r, &NoSpeakerAttribution);

        seg.feed("«");
        assert!(seg.feed("«").is_some(), "same glyph closes the span");
        seg.feed("\"");
        assert!(seg.in_dialogue());
        assert!(seg.feed("”").is_some());
    }

    #[test]
    fn test_non_glyph_tokens_do_not_toggle() {
        let r = registry();
        let glyphs = GraphConfig::default().quote_glyphs;
        let mut seg = DialogueSegmenter::new(&glyphs, &r, &NoSpeakerAttribution);

        for token in ["Гарри", "сказал", "—", ",", "."] {
            assert_eq!(seg.feed(token), None);
        }
        assert!(!seg.in_dialogue());
    }

    #[test]
    fn test_pluggable_strategy_collects_and_flushes() {
        let r = registry();
        let glyphs = GraphConfig::default().quote_glyphs;
        let mut seg = DialogueSegmenter::new(&glyphs, &r, &AliasSpeakers);

        seg.feed("Гарри"); // outside: ignored
        seg.feed("«");
        seg.feed("Рон");
        seg.feed("Гарри");
        let closed = seg.feed("»").unwrap();
        assert_eq!(closed.len(), 2);
        assert!(closed.contains("рон уизли"));

        seg.feed("«");
        assert_eq!(seg.feed("»"), Some(BTreeSet::new()), "participants were cleared");
    }
}

//! Text annotation: sentences, tokens and person-mention spans
//!
//! The scorer only consumes [`Sentence`]s. Where they come from is the job of
//! a [`TextAnnotator`]; a full NLP front end (NER + lemmatizer) plugs in here.
//! [`LexiconAnnotator`] is the built-in fallback: it finds registry aliases in
//! plain text with Aho-Corasick, no model weights required.

use std::sync::OnceLock;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use super::registry::CharacterRegistry;
use crate::error::{CastError, CastResult};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntityLabel {
    #[default]
    Person,
    Other,
}

/// An entity span reported by the annotator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionSpan {
    /// Surface text as it appears in the sentence
    pub text: String,
    /// Dictionary form, when the annotator lemmatizes ("Поттера" -> "поттер")
    #[serde(default)]
    pub lemma: Option<String>,
    /// Byte offsets into `Sentence::text` (the original casing)
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
    #[serde(default)]
    pub label: EntityLabel,
}

impl MentionSpan {
    pub fn person(text: impl Into<String>) -> Self {
        let text = text.into();
        let end = text.len();
        MentionSpan {
            text,
            lemma: None,
            start: 0,
            end,
            label: EntityLabel::Person,
        }
    }

    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = Some(lemma.into());
        self
    }

    pub fn is_person(&self) -> bool {
        self.label == EntityLabel::Person
    }

    /// Text used for resolution: the lemma when present, else the surface form
    pub fn key(&self) -> &str {
        self.lemma.as_deref().unwrap_or(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sentence {
    #[serde(default)]
    pub text: String,
    pub tokens: Vec<String>,
    pub mentions: Vec<MentionSpan>,
}

impl Sentence {
    /// Sentence tokenized with [`tokenize`] (word boundaries, punctuation kept)
    /// and the given person mentions
    pub fn new(text: &str, mentions: Vec<MentionSpan>) -> Self {
        Sentence {
            text: text.to_string(),
            tokens: tokenize(text),
            mentions,
        }
    }
}

/// The text-annotation collaborator
pub trait TextAnnotator: Send + Sync {
    fn annotate(&self, text: &str) -> CastResult<Vec<Sentence>>;
}

/// Word-boundary tokens with whitespace dropped; punctuation (and therefore
/// quote glyphs) kept as separate tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_word_bounds()
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn sentence_boundary() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| {
        Regex::new(r#"[.!?…]+["»”]*\s+|\n\s*\n"#).expect("sentence boundary pattern is valid")
    })
}

/// Split text into trimmed, non-empty sentence slices
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in sentence_boundary().find_iter(text) {
        let end = m.start() + m.as_str().trim_end().len();
        let piece = text[start..end].trim();
        if !piece.is_empty() {
            sentences.push(piece);
        }
        start = m.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

// =============================================================================
// LexiconAnnotator
// =============================================================================

/// Alias matcher over the registry's alias index
pub struct LexiconAnnotator {
    automaton: AhoCorasick,
    patterns: Vec<String>,
}

impl std::fmt::Debug for LexiconAnnotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexiconAnnotator")
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

impl LexiconAnnotator {
    pub fn new(registry: &CharacterRegistry) -> CastResult<Self> {
        let mut patterns: Vec<String> = registry.alias_keys().map(str::to_string).collect();
        patterns.sort();

        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|e| CastError::Annotation(format!("failed to build automaton: {}", e)))?;

        Ok(LexiconAnnotator {
            automaton,
            patterns,
        })
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Alias mentions in one sentence, whole words only, longest match wins.
    /// Offsets and surface text refer to `sentence`, not its lower-cased copy.
    pub fn find_mentions(&self, sentence: &str) -> Vec<MentionSpan> {
        let (lowered, origin) = lower_with_origin(sentence);

        let mut spans: Vec<(usize, usize)> = self
            .automaton
            .find_overlapping_iter(&lowered)
            .map(|m| (m.start(), m.end()))
            .filter(|&(start, end)| end > start && on_word_boundary(&lowered, start, end))
            .collect();

        spans.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| (b.1 - b.0).cmp(&(a.1 - a.0))));

        let mut mentions = Vec::new();
        let mut last_end = 0;
        for (start, end) in spans {
            if start < last_end {
                continue;
            }
            last_end = end;

            let (Some(&(start, _)), Some(&(_, end))) = (origin.get(start), origin.get(end - 1))
            else {
                continue;
            };
            mentions.push(MentionSpan {
                text: sentence[start..end].to_string(),
                lemma: None,
                start,
                end,
                label: EntityLabel::Person,
            });
        }
        mentions
    }
}

/// Lower-cased copy of `text`, plus for every byte of the copy the byte range
/// of the `text` char it came from. `str::to_lowercase` maps each char to the
/// same number of chars as `char::to_lowercase` (final sigma included).
fn lower_with_origin(text: &str) -> (String, Vec<(usize, usize)>) {
    let lowered = text.to_lowercase();
    let mut origin = Vec::with_capacity(lowered.len());
    let mut lower_chars = lowered.chars();

    for (start, ch) in text.char_indices() {
        let range = (start, start + ch.len_utf8());
        for _ in 0..ch.to_lowercase().count() {
            if let Some(lc) = lower_chars.next() {
                origin.extend(std::iter::repeat(range).take(lc.len_utf8()));
            }
        }
    }
    (lowered, origin)
}

fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

impl TextAnnotator for LexiconAnnotator {
    fn annotate(&self, text: &str) -> CastResult<Vec<Sentence>> {
        Ok(split_sentences(text)
            .into_iter()
            .map(|s| Sentence::new(s, self.find_mentions(s)))
            .collect())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn annotator() -> LexiconAnnotator {
        let registry =
            CharacterRegistry::from_lines(["Гарри Поттер", "Рон Уизли", "Добби"]).unwrap();
        LexiconAnnotator::new(&registry).unwrap()
    }

    #[test]
    fn test_split_sentences() {
        let text = "Гарри проснулся. Рон спал!  Где Добби?\n\nКонец";
        assert_eq!(
            split_sentences(text),
            vec!["Гарри проснулся.", "Рон спал!", "Где Добби?", "Конец"]
        );
    }

    #[test]
    fn test_split_keeps_closing_quote_with_sentence() {
        let text = "«Бежим!» Рон кивнул.";
        assert_eq!(split_sentences(text), vec!["«Бежим!»", "Рон кивнул."]);
    }

    #[test]
    fn test_tokenize_keeps_quote_glyphs() {
        let tokens = tokenize("«Привет, Рон!» — сказал Гарри.");
        assert_eq!(tokens.first().map(String::as_str), Some("«"));
        assert!(tokens.iter().any(|t| t == "»"));
        assert!(tokens.iter().any(|t| t == "Рон"));
        assert!(!tokens.iter().any(|t| t.trim().is_empty()));
    }

    #[test]
    fn test_find_mentions_prefers_full_name() {
        let a = annotator();
        let mentions = a.find_mentions("Гарри Поттер и Рон вошли.");
        let texts: Vec<&str> = mentions.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Гарри Поттер", "Рон"]);
        assert!(mentions.iter().all(MentionSpan::is_person));
    }

    #[test]
    fn test_find_mentions_whole_words_only() {
        let a = annotator();
        // "Поттера" is inflected: full name fails the boundary check, first name survives
        let mentions = a.find_mentions("Друзья Гарри Поттера и Ронни.");
        let texts: Vec<&str> = mentions.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Гарри"]);
    }

    #[test]
    fn test_find_mentions_offsets_survive_case_folding() {
        // "İ" lower-cases to two chars, shifting every later byte
        let registry = CharacterRegistry::from_lines(["Рон Уизли"]).unwrap();
        let a = LexiconAnnotator::new(&registry).unwrap();
        let sentence = "İİ и Рон Уизли.";

        let mentions = a.find_mentions(sentence);
        assert_eq!(mentions.len(), 1);
        let m = &mentions[0];
        assert_eq!(m.text, "Рон Уизли");
        assert_eq!(&sentence[m.start..m.end], "Рон Уизли");
    }

    #[test]
    fn test_annotate_document() {
        let a = annotator();
        let sentences = a.annotate("Гарри увидел Добби. Никого не было.").unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].mentions.len(), 2);
        assert!(sentences[1].mentions.is_empty());
    }

    #[test]
    fn test_mention_key_prefers_lemma() {
        let span = MentionSpan::person("Поттера").with_lemma("поттер");
        assert_eq!(span.key(), "поттер");
        assert_eq!(MentionSpan::person("Рон").key(), "Рон");
    }

    #[test]
    fn test_sentence_deserializes_with_defaults() {
        let json = r#"{ "tokens": ["Гарри"], "mentions": [{ "text": "Гарри" }] }"#;
        let sentence: Sentence = serde_json::from_str(json).unwrap();
        assert_eq!(sentence.mentions[0].label, EntityLabel::Person);
        assert!(sentence.text.is_empty());
    }
}

//! CharacterRegistry: canonical names + alias index
//!
//! Built once from the known-character list, read-only afterwards.
//!
//! | Line               | Canonical       | Aliases                               |
//! |--------------------|-----------------|---------------------------------------|
//! | `Гарри Поттер`     | `гарри поттер`  | `гарри`, `поттер`, `гарри поттер`     |
//! | `Добби`            | `добби`         | `добби`                               |
//! | `Альбус П. В. Д.`  | `альбус п. в. д.` | self only (not exactly two tokens)  |

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::error::{CastError, CastResult};

/// Lower-cased, trimmed full name. The identity key for a character.
pub type CanonicalName = String;

/// Normalize a raw name or mention into lookup form
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

static EMPTY: BTreeSet<CanonicalName> = BTreeSet::new();

// =============================================================================
// CharacterRegistry
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct CharacterRegistry {
    characters: BTreeSet<CanonicalName>,
    aliases: HashMap<String, BTreeSet<CanonicalName>>,
}

impl CharacterRegistry {
    /// Build from raw name lines. Empty lines are skipped; an input with no
    /// names at all is a configuration error.
    pub fn from_lines<I, S>(lines: I) -> CastResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = CharacterRegistry::default();
        for line in lines {
            registry.register(line.as_ref());
        }

        if registry.characters.is_empty() {
            return Err(CastError::config("character list is empty"));
        }
        Ok(registry)
    }

    /// Read a UTF-8 file with one full name per line
    pub fn from_file(path: impl AsRef<Path>) -> CastResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| CastError::io(path, e))?;
        Self::from_lines(contents.lines())
    }

    fn register(&mut self, raw: &str) {
        let canonical = normalize_name(raw);
        if canonical.is_empty() {
            return;
        }

        let parts: Vec<&str> = canonical.split(' ').collect();
        if parts.len() == 2 {
            for part in &parts {
                self.add_alias(part, &canonical);
            }
        }
        self.add_alias(&canonical, &canonical);
        self.characters.insert(canonical);
    }

    fn add_alias(&mut self, alias: &str, canonical: &str) {
        self.aliases
            .entry(alias.to_string())
            .or_default()
            .insert(canonical.to_string());
    }

    /// Canonical names sharing `token` as an alias. Empty when unknown.
    pub fn resolve_alias(&self, token: &str) -> &BTreeSet<CanonicalName> {
        self.aliases.get(&normalize_name(token)).unwrap_or(&EMPTY)
    }

    /// Exact canonical-name check (expects already normalized input)
    pub fn is_canonical(&self, name: &str) -> bool {
        self.characters.contains(name)
    }

    /// Canonical names in lexicographic order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.characters.iter().map(String::as_str)
    }

    /// Every alias string known to the index (including self-aliases)
    pub fn alias_keys(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

// =============================================================================
// Tests
// =============================================================================

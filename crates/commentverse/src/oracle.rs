//! The pronunciation lookup capability the poem builders depend on.

use std::collections::HashMap;

use cmudict_db::CmuDict;

/// Resolves words to ARPABET transcriptions and derives syllable counts,
/// rhyme keys and stress strings from them.
///
/// Lookups are treated as pure: unknown words yield an empty list, never an
/// error. The host loads one oracle and shares it by reference.
pub trait PronunciationOracle {
    /// Every transcription of `word`, first variant first.
    fn pronunciations(&self, word: &str) -> Vec<&str>;

    fn first_pronunciation(&self, word: &str) -> Option<&str> {
        self.pronunciations(word).into_iter().next()
    }

    fn syllable_count(&self, phones: &str) -> usize {
        cmudict_types::syllable_count(phones)
    }

    fn rhyme_key<'p>(&self, phones: &'p str) -> &'p str {
        cmudict_types::rhyming_part(phones)
    }

    fn stresses(&self, phones: &str) -> String {
        cmudict_types::stresses(phones)
    }
}

impl PronunciationOracle for CmuDict {
    fn pronunciations(&self, word: &str) -> Vec<&str> {
        CmuDict::pronunciations(self, word)
            .into_iter()
            .map(|p| p.phones)
            .collect()
    }
}

/// In-memory oracle built from `(word, phones)` pairs.
///
/// Repeated words add further variants in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MapOracle {
    entries: HashMap<String, Vec<String>>,
}

impl MapOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: &str, phones: &str) {
        self.entries
            .entry(word.to_lowercase())
            .or_default()
            .push(phones.to_string());
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for MapOracle {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut oracle = MapOracle::new();
        for (word, phones) in iter {
            oracle.insert(word, phones);
        }
        oracle
    }
}

impl PronunciationOracle for MapOracle {
    fn pronunciations(&self, word: &str) -> Vec<&str> {
        self.entries
            .get(&word.to_lowercase())
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

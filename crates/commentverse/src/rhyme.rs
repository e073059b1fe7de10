use std::collections::HashMap;

use tracing::debug;

use crate::corpus::FragmentId;
use crate::filter::Candidates;
use crate::oracle::PronunciationOracle;

/// A fragment together with the final word that placed it in its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RhymeEntry {
    pub fragment: FragmentId,
    pub word: String,
}

/// Fragments whose final words share a rhyme key.
///
/// No two entries share a final word, so a group never pairs a word with
/// itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RhymeGroup {
    key: String,
    entries: Vec<RhymeEntry>,
}

impl RhymeGroup {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn entries(&self) -> &[RhymeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fragments(&self) -> impl Iterator<Item = FragmentId> + '_ {
        self.entries.iter().map(|e| e.fragment)
    }
}

/// Rhyme groups in the order their keys were first seen in the corpus.
#[derive(Debug, Clone, Default)]
pub struct RhymeGroups {
    groups: Vec<RhymeGroup>,
    by_key: HashMap<String, usize>,
}

impl RhymeGroups {
    /// Group rhyme candidates by the rhyming part of their final word's first
    /// pronunciation.
    ///
    /// Heteronyms are keyed by their first variant only.
    pub fn build<O>(candidates: &Candidates, oracle: &O) -> Self
    where
        O: PronunciationOracle + ?Sized,
    {
        let mut out = Self::default();
        for (fragment, word) in candidates.rhyme_words() {
            let Some(phones) = oracle.first_pronunciation(word) else {
                continue;
            };
            let key = oracle.rhyme_key(phones);
            out.insert(key, fragment, word);
        }
        debug!(
            "grouped {} rhyme candidates into {} rhyme groups",
            candidates.rhyme_count(),
            out.len()
        );
        out
    }

    /// Add an entry unless the group already holds the same final word.
    ///
    /// Returns whether the entry was added.
    pub fn insert(&mut self, key: &str, fragment: FragmentId, word: &str) -> bool {
        let idx = match self.by_key.get(key) {
            Some(idx) => *idx,
            None => {
                self.groups.push(RhymeGroup {
                    key: key.to_string(),
                    entries: Vec::new(),
                });
                self.by_key.insert(key.to_string(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[idx];
        let lowered = word.to_lowercase();
        if group.entries.iter().any(|e| e.word.to_lowercase() == lowered) {
            return false;
        }
        group.entries.push(RhymeEntry {
            fragment,
            word: word.to_string(),
        });
        true
    }

    pub fn get(&self, key: &str) -> Option<&RhymeGroup> {
        self.by_key.get(key).map(|idx| &self.groups[*idx])
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RhymeGroup> {
        self.groups.iter()
    }

    pub fn largest(&self) -> usize {
        self.groups.iter().map(RhymeGroup::len).max().unwrap_or(0)
    }

    pub fn into_groups(self) -> Vec<RhymeGroup> {
        self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::FragmentArena;
    use crate::oracle::MapOracle;
    use std::collections::HashSet;

    fn oracle() -> MapOracle {
        [
            ("cat", "K AE1 T"),
            ("hat", "HH AE1 T"),
            ("that", "DH AE1 T"),
            ("day", "D EY1"),
            ("away", "AH0 W EY1"),
            ("read", "R IY1 D"),
            ("read", "R EH1 D"),
            ("bed", "B EH1 D"),
            ("need", "N IY1 D"),
        ]
        .into_iter()
        .collect()
    }

    fn groups_for(corpus: &[&str]) -> (FragmentArena, RhymeGroups) {
        let arena = FragmentArena::from_corpus(corpus);
        let o = oracle();
        let candidates = Candidates::scan(&arena, &o);
        let groups = RhymeGroups::build(&candidates, &o);
        (arena, groups)
    }

    #[test]
    fn groups_by_rhyming_part_in_first_seen_order() {
        let (_, groups) = groups_for(&[
            "somebody please feed the cat",
            "what a lovely sunny day",
            "I left my favourite hat",
            "and then they ran away",
        ]);
        let keys: Vec<&str> = groups.iter().map(RhymeGroup::key).collect();
        assert_eq!(keys, vec!["AE1 T", "EY1"]);
        assert_eq!(groups.get("AE1 T").map(RhymeGroup::len), Some(2));
        assert_eq!(groups.largest(), 2);
    }

    #[test]
    fn never_repeats_a_final_word_within_a_group() {
        let (arena, groups) = groups_for(&[
            "somebody please feed the cat",
            "there is no way I am a CAT",
            "look at that fluffy little Cat!",
            "I left my favourite hat",
        ]);
        let group = groups.get("AE1 T").expect("group present");
        assert_eq!(group.len(), 2);
        let words: HashSet<String> = group.entries().iter().map(|e| e.word.clone()).collect();
        assert_eq!(words.len(), group.len());
        assert_eq!(arena.text(group.entries()[0].fragment), "somebody please feed the cat");
    }

    #[test]
    fn heteronyms_use_first_variant_only() {
        let (_, groups) = groups_for(&[
            "this is a book I want to read",
            "it is time to go to bed",
            "this is all that we need",
        ]);
        assert_eq!(groups.get("IY1 D").map(RhymeGroup::len), Some(2));
        assert_eq!(groups.get("EH1 D").map(RhymeGroup::len), Some(1));
    }

    #[test]
    fn insert_reports_duplicates() {
        let mut groups = RhymeGroups::default();
        let a = FragmentArena::id(0);
        let b = FragmentArena::id(1);
        assert!(groups.insert("AE1 T", a, "cat"));
        assert!(!groups.insert("AE1 T", b, "Cat"));
        assert!(groups.insert("EY1", b, "cat"));
        assert_eq!(groups.len(), 2);
    }
}

//! Corpus filter: decides which fragments each poem builder may use.
//!
//! A single pass over the arena derives, per fragment, its rhyme word, its
//! total syllable count, and its acrostic initial. Eligibility is kept as one
//! bitset per builder so grouping is a walk over set bits.

use bitvec::prelude::*;
use tracing::debug;
use verse_meter::words_of;

use crate::corpus::{FragmentArena, FragmentId};
use crate::oracle::PronunciationOracle;

/// Fragments must be strictly longer than this (in characters).
pub const MIN_FRAGMENT_LEN: usize = 20;
/// Fragments must be strictly shorter than this (in characters).
pub const MAX_FRAGMENT_LEN: usize = 100;
/// Final words with these endings rarely yield useful rhymes.
pub const EXCLUDED_SUFFIXES: [&str; 3] = ["ing", "ed", "ion"];

type BitSet = BitVec<usize, Lsb0>;

/// Per-fragment attributes and eligibility masks for one corpus snapshot.
#[derive(Debug, Clone)]
pub struct Candidates {
    rhyme: BitSet,
    syllable: BitSet,
    acrostic: BitSet,
    final_words: Vec<Option<String>>,
    syllable_totals: Vec<Option<usize>>,
    initials: Vec<Option<char>>,
}

impl Candidates {
    pub fn scan<O>(arena: &FragmentArena, oracle: &O) -> Self
    where
        O: PronunciationOracle + ?Sized,
    {
        let n = arena.len();
        let mut rhyme = bitvec![usize, Lsb0; 0; n];
        let mut syllable = bitvec![usize, Lsb0; 0; n];
        let mut acrostic = bitvec![usize, Lsb0; 0; n];
        let mut final_words = Vec::with_capacity(n);
        let mut syllable_totals = Vec::with_capacity(n);
        let mut initials = Vec::with_capacity(n);

        for (id, text) in arena.iter() {
            let idx = id.index();

            let word = rhyme_word(text, oracle);
            rhyme.set(idx, word.is_some());
            final_words.push(word);

            let total = syllable_total(text, oracle);
            syllable.set(idx, total.is_some());
            syllable_totals.push(total);

            let initial = acrostic_initial(text);
            acrostic.set(idx, initial.is_some());
            initials.push(initial);
        }

        debug!(
            "filtered {n} fragments: {} rhyme, {} syllable, {} acrostic",
            rhyme.count_ones(),
            syllable.count_ones(),
            acrostic.count_ones()
        );

        Self {
            rhyme,
            syllable,
            acrostic,
            final_words,
            syllable_totals,
            initials,
        }
    }

    /// Rhyme-eligible fragments with their lowercased final word.
    pub fn rhyme_words(&self) -> impl Iterator<Item = (FragmentId, &str)> + '_ {
        self.rhyme.iter_ones().filter_map(|idx| {
            self.final_words[idx]
                .as_deref()
                .map(|word| (FragmentArena::id(idx), word))
        })
    }

    /// Fully resolvable fragments with their total syllable count.
    pub fn syllable_totals(&self) -> impl Iterator<Item = (FragmentId, usize)> + '_ {
        self.syllable
            .iter_ones()
            .filter_map(|idx| self.syllable_totals[idx].map(|n| (FragmentArena::id(idx), n)))
    }

    /// Acrostic-eligible fragments with their lowercased first letter.
    pub fn initials(&self) -> impl Iterator<Item = (FragmentId, char)> + '_ {
        self.acrostic
            .iter_ones()
            .filter_map(|idx| self.initials[idx].map(|c| (FragmentArena::id(idx), c)))
    }

    pub fn rhyme_count(&self) -> usize {
        self.rhyme.count_ones()
    }

    pub fn syllable_count(&self) -> usize {
        self.syllable.count_ones()
    }

    pub fn acrostic_count(&self) -> usize {
        self.acrostic.count_ones()
    }

    /// Fragments usable by at least one builder.
    pub fn usable_count(&self) -> usize {
        let mut any = self.rhyme.clone();
        any |= &self.syllable;
        any |= &self.acrostic;
        any.count_ones()
    }
}

pub fn within_length_bounds(text: &str) -> bool {
    let len = text.chars().count();
    len > MIN_FRAGMENT_LEN && len < MAX_FRAGMENT_LEN
}

/// The trailing word of a fragment, ignoring trailing punctuation.
///
/// Returns `None` when the fragment ends in a digit (before any trailing
/// punctuation) or when the trailing word is glued to digits or underscores.
/// Inner apostrophes are kept (`"don't"`).
pub fn final_word(text: &str) -> Option<&str> {
    let trimmed = text.trim_end_matches(|c: char| !is_word_char(c));
    let last = trimmed.chars().next_back()?;
    if !last.is_alphabetic() {
        return None;
    }

    let chars: Vec<(usize, char)> = trimmed.char_indices().collect();
    let mut start = chars.len();
    while start > 0 {
        let (_, c) = chars[start - 1];
        let inner_apostrophe = c == '\''
            && start >= 2
            && chars[start - 2].1.is_alphabetic()
            && start < chars.len();
        if c.is_alphabetic() || inner_apostrophe {
            start -= 1;
        } else {
            break;
        }
    }
    if start > 0 && is_word_char(chars[start - 1].1) {
        return None;
    }
    Some(&trimmed[chars[start].0..])
}

/// Lowercased final word if the fragment may end a rhyming line.
pub fn rhyme_word<O>(text: &str, oracle: &O) -> Option<String>
where
    O: PronunciationOracle + ?Sized,
{
    if !within_length_bounds(text) || !text.chars().any(char::is_alphabetic) {
        return None;
    }
    let word = final_word(text)?.to_lowercase();
    if EXCLUDED_SUFFIXES.iter().any(|suffix| word.ends_with(suffix)) {
        return None;
    }
    oracle.first_pronunciation(&word)?;
    Some(word)
}

/// Sum of first-variant syllable counts over every word in the fragment.
///
/// Any digit, any unknown word, or no words at all disqualifies the fragment.
pub fn syllable_total<O>(text: &str, oracle: &O) -> Option<usize>
where
    O: PronunciationOracle + ?Sized,
{
    if text.chars().any(char::is_numeric) {
        return None;
    }
    let words = words_of(text);
    if words.is_empty() {
        return None;
    }
    words.iter().try_fold(0usize, |total, word| {
        let phones = oracle.first_pronunciation(word)?;
        Some(total + oracle.syllable_count(phones))
    })
}

/// Lowercased first letter of an acrostic-eligible fragment.
pub fn acrostic_initial(text: &str) -> Option<char> {
    if !within_length_bounds(text) {
        return None;
    }
    let first = text.chars().find(|c| c.is_alphabetic())?;
    first.to_lowercase().next()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MapOracle;

    fn oracle() -> MapOracle {
        [
            ("cat", "K AE1 T"),
            ("the", "DH AH0"),
            ("sat", "S AE1 T"),
            ("on", "AA1 N"),
            ("mat", "M AE1 T"),
            ("don't", "D OW1 N T"),
            ("walked", "W AO1 K T"),
            ("nation", "N EY1 SH AH0 N"),
            ("singing", "S IH1 NG IH0 NG"),
            ("a", "AH0"),
            ("little", "L IH1 T AH0 L"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn finds_final_word_past_punctuation() {
        assert_eq!(final_word("the cat sat on the mat!!"), Some("mat"));
        assert_eq!(final_word("well I don't."), Some("don't"));
        assert_eq!(final_word("quoted 'word'"), Some("word"));
        assert_eq!(final_word("it costs 100."), None);
        assert_eq!(final_word("version x86"), None);
        assert_eq!(final_word("snake_case"), None);
        assert_eq!(final_word("?!"), None);
    }

    #[test]
    fn rhyme_filter_applies_length_suffix_and_lookup_rules() {
        let o = oracle();
        assert_eq!(
            rhyme_word("The cat sat on the Mat.", &o).as_deref(),
            Some("mat")
        );
        assert_eq!(rhyme_word("mat", &o), None);
        assert_eq!(rhyme_word(&format!("{} mat", "x".repeat(100)), &o), None);
        assert_eq!(rhyme_word("and then the little dog walked", &o), None);
        assert_eq!(rhyme_word("a proud and very great nation", &o), None);
        assert_eq!(rhyme_word("all night the birds were singing", &o), None);
        assert_eq!(rhyme_word("the cat sat on the zzyzx", &o), None);
        assert_eq!(rhyme_word("the cat sat on mat 42!", &o), None);
    }

    #[test]
    fn syllable_total_requires_every_word() {
        let o = oracle();
        assert_eq!(syllable_total("The cat sat on the mat.", &o), Some(6));
        assert_eq!(syllable_total("a little cat, don't!", &o), Some(5));
        assert_eq!(syllable_total("the cat sat on zzyzx", &o), None);
        assert_eq!(syllable_total("the 2 cats", &o), None);
        assert_eq!(syllable_total("cat ٣ cat", &o), None);
        assert_eq!(syllable_total("the cat sat on ½ mat", &o), None);
        assert_eq!(syllable_total("...", &o), None);
    }

    #[test]
    fn acrostic_initial_is_first_letter() {
        assert_eq!(acrostic_initial("  \"Cats are wonderful pets, honestly\""), Some('c'));
        assert_eq!(acrostic_initial("42 Apples fell from the tree today"), Some('a'));
        assert_eq!(acrostic_initial("short"), None);
        assert_eq!(acrostic_initial("1234567890 1234567890 123"), None);
    }

    #[test]
    fn scan_builds_masks_and_attributes() {
        let arena = FragmentArena::from_corpus(&[
            "The cat sat on the mat.",
            "tiny",
            "A little cat, a little mat, a cat",
            "This line has 3 digits and ends in mat",
        ]);
        let candidates = Candidates::scan(&arena, &oracle());
        assert_eq!(candidates.rhyme_count(), 3);
        assert_eq!(candidates.syllable_count(), 2);
        assert_eq!(candidates.acrostic_count(), 3);
        assert_eq!(candidates.usable_count(), 3);

        let words: Vec<&str> = candidates.rhyme_words().map(|(_, w)| w).collect();
        assert_eq!(words, vec!["mat", "cat", "mat"]);
        let totals: Vec<usize> = candidates.syllable_totals().map(|(_, n)| n).collect();
        assert_eq!(totals, vec![6, 10]);
    }
}

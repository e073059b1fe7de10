//! Shared, zero-copy helpers for ARPABET transcriptions as found in the CMU
//! Pronouncing Dictionary.
//!
//! A transcription is a whitespace-separated list of phones such as
//! `"K AE1 T"`. Vowel phones carry a trailing stress digit (`0`, `1`, `2`),
//! which is all that is needed to count syllables, derive a stress string,
//! or find the "rhyming part" of a word. Every helper borrows from the input
//! so callers can work directly on memory-mapped dictionary text.
//!
//! ```rust
//! use cmudict_types::{Stress, parse_variant_key, rhyming_part, syllable_count};
//!
//! assert_eq!(syllable_count("P AH0 T EY1 T OW0"), 3);
//! assert_eq!(rhyming_part("P AH0 T EY1 T OW0"), "EY1 T OW0");
//! assert_eq!(parse_variant_key("TOMATO(2)"), Some(("TOMATO", 2)));
//! assert_eq!(Stress::from_char('1'), Some(Stress::Primary));
//! ```

use std::fmt;

/// Lexical stress marker carried by ARPABET vowels.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Stress {
    Unstressed,
    Primary,
    Secondary,
}

impl Stress {
    /// Parse a CMU stress digit.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Stress::Unstressed),
            '1' => Some(Stress::Primary),
            '2' => Some(Stress::Secondary),
            _ => None,
        }
    }

    /// Emit the digit used in the dictionary.
    pub fn to_char(self) -> char {
        match self {
            Stress::Unstressed => '0',
            Stress::Primary => '1',
            Stress::Secondary => '2',
        }
    }

    /// Primary and secondary stress both anchor a rhyme.
    pub fn is_stressed(self) -> bool {
        !matches!(self, Stress::Unstressed)
    }
}

impl fmt::Display for Stress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stress::Unstressed => "unstressed",
            Stress::Primary => "primary",
            Stress::Secondary => "secondary",
        })
    }
}

/// One pronunciation variant of a dictionary word.
///
/// `variant` is 1 for the unmarked entry and `n` for `WORD(n)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pronunciation<'a> {
    pub word: &'a str,
    pub variant: u8,
    pub phones: &'a str,
}

impl<'a> Pronunciation<'a> {
    pub fn syllable_count(&self) -> usize {
        syllable_count(self.phones)
    }

    pub fn rhyming_part(&self) -> &'a str {
        rhyming_part(self.phones)
    }

    pub fn stresses(&self) -> String {
        stresses(self.phones)
    }
}

/// Stress marker of a single phone, `None` for consonants.
pub fn stress_of(phone: &str) -> Option<Stress> {
    phone.chars().next_back().and_then(Stress::from_char)
}

/// Whether the phone is a vowel (carries a stress digit).
pub fn is_vowel(phone: &str) -> bool {
    stress_of(phone).is_some()
}

/// Number of syllables, i.e. the number of vowel phones.
pub fn syllable_count(phones: &str) -> usize {
    phones.split_ascii_whitespace().filter(|p| is_vowel(p)).count()
}

/// Stress digits of every vowel, in order (`"P AH0 T EY1 T OW0"` -> `"010"`).
pub fn stresses(phones: &str) -> String {
    phones
        .split_ascii_whitespace()
        .filter_map(stress_of)
        .map(Stress::to_char)
        .collect()
}

/// Everything from the stressed vowel nearest the end of the word to the end.
///
/// The first phone is never chosen as the anchor; a transcription whose only
/// stressed vowel (or no stressed vowel at all) sits at index 0 yields the
/// whole transcription, which for a leading vowel is the same slice anyway.
pub fn rhyming_part(phones: &str) -> &str {
    let spans: Vec<(usize, &str)> = phone_spans(phones).collect();
    for (start, phone) in spans.iter().skip(1).rev() {
        if stress_of(phone).is_some_and(Stress::is_stressed) {
            return phones[*start..].trim_end();
        }
    }
    phones.trim()
}

/// Split a raw dictionary headword into the word and its variant number.
///
/// `"READ"` -> `("READ", 1)`, `"READ(2)"` -> `("READ", 2)`. Returns `None`
/// for an unterminated or non-numeric marker.
pub fn parse_variant_key(raw: &str) -> Option<(&str, u8)> {
    match raw.find('(') {
        None => Some((raw, 1)),
        Some(open) => {
            let inner = raw[open + 1..].strip_suffix(')')?;
            let variant = inner.parse::<u8>().ok()?;
            if open == 0 {
                return None;
            }
            Some((&raw[..open], variant))
        }
    }
}

/// Byte offset and text of each phone.
fn phone_spans(phones: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut rest = 0usize;
    std::iter::from_fn(move || {
        let tail = &phones[rest..];
        let skipped = tail.len() - tail.trim_start_matches(|c: char| c.is_ascii_whitespace()).len();
        let start = rest + skipped;
        if start >= phones.len() {
            return None;
        }
        let len = phones[start..]
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(phones.len() - start);
        rest = start + len;
        Some((start, &phones[start..start + len]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_vowels_as_syllables() {
        assert_eq!(syllable_count("K AE1 T"), 1);
        assert_eq!(syllable_count("AH0 B AW1 T"), 2);
        assert_eq!(syllable_count("HH M"), 0);
        assert_eq!(syllable_count(""), 0);
    }

    #[test]
    fn rhyming_part_starts_at_last_stressed_vowel() {
        assert_eq!(rhyming_part("K AE1 T"), "AE1 T");
        assert_eq!(rhyming_part("HH AE1 T"), "AE1 T");
        assert_eq!(rhyming_part("IH0 N S P AY1 R"), "AY1 R");
        assert_eq!(rhyming_part("K AA1 N T EH2 K S T"), "EH2 K S T");
        assert_eq!(rhyming_part("AY1"), "AY1");
        assert_eq!(rhyming_part("  D AO1 G  "), "AO1 G");
    }

    #[test]
    fn rhyming_part_falls_back_to_whole_transcription() {
        assert_eq!(rhyming_part("AE1 K T"), "AE1 K T");
        assert_eq!(rhyming_part("DH AH0"), "DH AH0");
    }

    #[test]
    fn collects_stress_string() {
        assert_eq!(stresses("P AH0 T EY1 T OW0"), "010");
        assert_eq!(stresses("K AA1 N T EH2 K S T"), "12");
    }

    #[test]
    fn parses_variant_keys() {
        assert_eq!(parse_variant_key("read"), Some(("read", 1)));
        assert_eq!(parse_variant_key("read(2)"), Some(("read", 2)));
        assert_eq!(parse_variant_key("read(x)"), None);
        assert_eq!(parse_variant_key("read(2"), None);
        assert_eq!(parse_variant_key("(2)"), None);
    }

    #[test]
    fn pronunciation_delegates_to_helpers() {
        let p = Pronunciation {
            word: "tomato",
            variant: 2,
            phones: "T AH0 M AA1 T OW2",
        };
        assert_eq!(p.syllable_count(), 3);
        assert_eq!(p.rhyming_part(), "OW2");
        assert_eq!(p.stresses(), "012");
    }
}

use std::str::FromStr;

use thiserror::Error;

/// Upper bound on pattern length; longer patterns cannot be satisfied by any
/// realistic corpus and are rejected up front.
pub const MAX_PATTERN_LEN: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("invalid character in rhyme scheme: {0:?}")]
    InvalidSymbol(char),
    #[error("invalid syllable count in pattern: {0:?}")]
    InvalidCount(String),
    #[error("pattern must not be empty")]
    Empty,
    #[error("pattern length must be at most {0}, got {1}")]
    TooLong(usize, usize),
}

/// An ordered rhyme scheme such as `AABB`; equal letters must rhyme.
///
/// Symbols are case-sensitive: `a` and `A` are different rhymes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RhymeScheme {
    symbols: Vec<char>,
}

impl RhymeScheme {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let mut symbols = Vec::with_capacity(raw.len());
        for c in raw.trim().chars() {
            if !c.is_alphabetic() {
                return Err(PatternError::InvalidSymbol(c));
            }
            symbols.push(c);
        }
        check_len(symbols.len())?;
        Ok(Self { symbols })
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Each distinct symbol with its number of occurrences, in order of first
    /// appearance.
    pub fn symbol_counts(&self) -> Vec<(char, usize)> {
        let mut counts: Vec<(char, usize)> = Vec::new();
        for &symbol in &self.symbols {
            match counts.iter_mut().find(|(s, _)| *s == symbol) {
                Some((_, n)) => *n += 1,
                None => counts.push((symbol, 1)),
            }
        }
        counts
    }
}

impl FromStr for RhymeScheme {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Dash-separated syllable counts, one per line (`5-7-5`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllablePattern {
    counts: Vec<usize>,
}

impl SyllablePattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        let counts = raw
            .split('-')
            .map(|token| {
                let token = token.trim();
                token
                    .parse::<usize>()
                    .map_err(|_| PatternError::InvalidCount(token.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        check_len(counts.len())?;
        Ok(Self { counts })
    }

    pub fn from_counts(counts: Vec<usize>) -> Result<Self, PatternError> {
        check_len(counts.len())?;
        Ok(Self { counts })
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromStr for SyllablePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Acrostic key: its letters, lowercased, everything else dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcrosticKey {
    letters: Vec<char>,
}

impl AcrosticKey {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let letters: Vec<char> = raw
            .chars()
            .filter(|c| c.is_alphabetic())
            .filter_map(|c| c.to_lowercase().next())
            .collect();
        check_len(letters.len())?;
        Ok(Self { letters })
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }
}

fn check_len(len: usize) -> Result<(), PatternError> {
    if len == 0 {
        return Err(PatternError::Empty);
    }
    if len > MAX_PATTERN_LEN {
        return Err(PatternError::TooLong(MAX_PATTERN_LEN, len));
    }
    Ok(())
}

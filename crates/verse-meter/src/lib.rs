//! Greedy stress-pattern scansion.
//!
//! A line scans against a [`Meter`] when its words, read left to right, can
//! each contribute one of their dictionary stress patterns so that the
//! concatenation equals the meter's template. The crate is decoupled from any
//! particular dictionary; it only depends on the callback you supply, which
//! maps a lowercase word to its stress strings (one per pronunciation
//! variant, e.g. `["01"]` for "about").
//!
//! # How it works
//! 1. Split the line into words (letters with inner apostrophes).
//! 2. For each word, try its variants in order and keep the first whose
//!    stresses extend the running pattern as a prefix of the template.
//! 3. Accept the line when the running pattern equals the template.
//!
//! The search never backtracks: an earlier word's choice is final.
//!
//! # Example
//! ```no_run
//! use cmudict_db::CmuDict;
//! use verse_meter::Meter;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dict = CmuDict::load("/path/to/cmudict.dict")?;
//! let stresses = |word: &str| -> Vec<String> {
//!     dict.pronunciations(word).iter().map(|p| p.stresses()).collect()
//! };
//! let meter = Meter::iambic_pentameter();
//! if let Some(scan) = meter.scan("Shall I compare thee to a summer's day", stresses) {
//!     println!("{}", scan.stresses);
//! }
//! # Ok(()) }
//! ```

use anyhow::{Result, bail};

/// A metrical template over `0` (unstressed) and `1` (stressed) positions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Meter {
    name: String,
    template: String,
    relax_secondary: bool,
}

/// How a single word was read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScannedWord {
    pub word: String,
    /// Stresses as matched against the template.
    pub stresses: String,
    /// 0-based index of the pronunciation variant that fit.
    pub variant: usize,
}

/// A successful reading of a whole line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scansion {
    pub words: Vec<ScannedWord>,
    pub stresses: String,
}

impl Meter {
    /// Build a meter from a template such as `"0101010101"`.
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if template.is_empty() {
            bail!("meter template must not be empty");
        }
        if let Some(bad) = template.chars().find(|c| !matches!(c, '0' | '1')) {
            bail!("meter template may only contain 0 and 1, found {bad:?}");
        }
        Ok(Self {
            name: name.into(),
            template,
            relax_secondary: false,
        })
    }

    /// Five iambs: `0101010101`.
    pub fn iambic_pentameter() -> Self {
        Self {
            name: "iambic pentameter".to_string(),
            template: "01".repeat(5),
            relax_secondary: false,
        }
    }

    /// Let secondary stress (`2`) fill either a stressed or unstressed slot.
    ///
    /// Off by default, in which case `2` never matches the template.
    pub fn relax_secondary(mut self, relax: bool) -> Self {
        self.relax_secondary = relax;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Scan `line`, returning `None` if any word is unknown or no reading fits.
    pub fn scan<F>(&self, line: &str, stresses_for: F) -> Option<Scansion>
    where
        F: Fn(&str) -> Vec<String>,
    {
        let mut running = String::with_capacity(self.template.len());
        let mut words = Vec::new();

        for word in words_of(line) {
            let variants = stresses_for(&word);
            if variants.is_empty() {
                return None;
            }
            let (variant, matched) = variants
                .iter()
                .enumerate()
                .find_map(|(idx, stress)| self.extend(&running, stress).map(|m| (idx, m)))?;
            running.push_str(&matched);
            words.push(ScannedWord {
                word,
                stresses: matched,
                variant,
            });
        }

        if running == self.template {
            Some(Scansion {
                words,
                stresses: running,
            })
        } else {
            None
        }
    }

    /// Match `stress` against the template right after `prefix`.
    fn extend(&self, prefix: &str, stress: &str) -> Option<String> {
        let slot = self.template.get(prefix.len()..)?;
        if stress.len() > slot.len() {
            return None;
        }
        let mut matched = String::with_capacity(stress.len());
        for (want, got) in slot.chars().zip(stress.chars()) {
            if got == want || (self.relax_secondary && got == '2') {
                matched.push(want);
            } else {
                return None;
            }
        }
        Some(matched)
    }
}

/// Lowercased words: runs of letters, keeping apostrophes between letters.
pub fn words_of(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, c) in chars.iter().enumerate() {
        let inner_apostrophe = *c == '\''
            && !current.is_empty()
            && chars.get(i + 1).is_some_and(|n| n.is_alphabetic());
        if c.is_alphabetic() || inner_apostrophe {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

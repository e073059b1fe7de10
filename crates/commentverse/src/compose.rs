use std::borrow::Cow;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::corpus::FragmentArena;
use crate::filter::Candidates;
use crate::forms;
use crate::oracle::PronunciationOracle;
use crate::pattern::{AcrosticKey, MAX_PATTERN_LEN, PatternError, RhymeScheme, SyllablePattern};
use crate::poem::{InsufficientCorpus, Poem};
use crate::rhyme::RhymeGroups;
use crate::syllable::SyllableGroups;

/// A poem shape, with any pattern still in its raw string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Form {
    Couplets,
    Villanelle,
    Haiku,
    Acrostic { key: String },
    Rhyme { scheme: String },
    Syllables { pattern: String },
    Metered { lines: usize },
}

impl Form {
    pub fn name(&self) -> &'static str {
        match self {
            Form::Couplets => "couplets",
            Form::Villanelle => "villanelle",
            Form::Haiku => "haiku",
            Form::Acrostic { .. } => "acrostic",
            Form::Rhyme { .. } => "rhyme",
            Form::Syllables { .. } => "syllables",
            Form::Metered { .. } => "metered",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error(transparent)]
    InsufficientCorpus(#[from] InsufficientCorpus),
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),
    #[error("line count must be between 1 and {max}, got {0}", max = MAX_PATTERN_LEN)]
    InvalidLineCount(usize),
}

/// How much of a corpus snapshot each builder can draw on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub fragments: usize,
    pub usable: usize,
    pub rhyme_candidates: usize,
    pub rhyme_groups: usize,
    pub largest_rhyme_group: usize,
    pub syllable_candidates: usize,
    pub acrostic_candidates: usize,
}

/// A corpus after normalization, dedup and filtering.
///
/// Building one scans every fragment through the oracle; a host serving many
/// requests from the same corpus builds it once and lends it to each
/// [`Composer`].
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    arena: FragmentArena,
    candidates: Candidates,
}

impl CorpusSnapshot {
    pub fn new<O, S>(oracle: &O, corpus: &[S]) -> Self
    where
        O: PronunciationOracle + ?Sized,
        S: AsRef<str>,
    {
        let arena = FragmentArena::from_corpus(corpus);
        let candidates = Candidates::scan(&arena, oracle);
        info!(
            "corpus snapshot: {} raw lines, {} fragments, {} usable",
            corpus.len(),
            arena.len(),
            candidates.usable_count()
        );
        Self { arena, candidates }
    }

    pub fn arena(&self) -> &FragmentArena {
        &self.arena
    }

    pub fn candidates(&self) -> &Candidates {
        &self.candidates
    }
}

/// Builds poems from one corpus snapshot.
///
/// Groups are rebuilt for every poem and consumed by it, so composing never
/// affects later calls.
pub struct Composer<'a, O: ?Sized> {
    oracle: &'a O,
    snapshot: Cow<'a, CorpusSnapshot>,
}

impl<'a, O> Composer<'a, O>
where
    O: PronunciationOracle + ?Sized,
{
    /// Filter `corpus` and compose from the result.
    pub fn new<S: AsRef<str>>(oracle: &'a O, corpus: &[S]) -> Self {
        Self {
            oracle,
            snapshot: Cow::Owned(CorpusSnapshot::new(oracle, corpus)),
        }
    }

    /// Compose from a snapshot built earlier with the same oracle.
    pub fn with_snapshot(oracle: &'a O, snapshot: &'a CorpusSnapshot) -> Self {
        Self {
            oracle,
            snapshot: Cow::Borrowed(snapshot),
        }
    }

    pub fn arena(&self) -> &FragmentArena {
        &self.snapshot.arena
    }

    pub fn candidates(&self) -> &Candidates {
        &self.snapshot.candidates
    }

    pub fn stats(&self) -> CorpusStats {
        let groups = self.rhyme_groups();
        CorpusStats {
            fragments: self.arena().len(),
            usable: self.candidates().usable_count(),
            rhyme_candidates: self.candidates().rhyme_count(),
            rhyme_groups: groups.len(),
            largest_rhyme_group: groups.largest(),
            syllable_candidates: self.candidates().syllable_count(),
            acrostic_candidates: self.candidates().acrostic_count(),
        }
    }

    pub fn compose<R: Rng + ?Sized>(&self, form: &Form, rng: &mut R) -> Result<Poem, ComposeError> {
        let poem = match form {
            Form::Couplets => self.couplets(rng)?,
            Form::Villanelle => self.villanelle(rng)?,
            Form::Haiku => self.haiku(rng)?,
            Form::Acrostic { key } => self.acrostic(key, rng)?,
            Form::Rhyme { scheme } => self.custom_rhyme(scheme, rng)?,
            Form::Syllables { pattern } => self.custom_syllables(pattern, rng)?,
            Form::Metered { lines } => self.metered(*lines, rng)?,
        };
        info!("composed {} with {} lines", form.name(), poem.line_count());
        Ok(poem)
    }

    /// Lines whose final words rhyme wherever the scheme repeats a letter.
    pub fn custom_rhyme<R: Rng + ?Sized>(
        &self,
        scheme: &str,
        rng: &mut R,
    ) -> Result<Poem, ComposeError> {
        let scheme = RhymeScheme::parse(scheme)?;
        Ok(forms::custom_rhyme(
            self.arena(),
            self.rhyme_groups(),
            &scheme,
            rng,
        )?)
    }

    /// Lines with exactly the syllable counts in a pattern like `5-7-5`.
    pub fn custom_syllables<R: Rng + ?Sized>(
        &self,
        pattern: &str,
        rng: &mut R,
    ) -> Result<Poem, ComposeError> {
        let pattern = SyllablePattern::parse(pattern)?;
        let mut groups = SyllableGroups::build(self.candidates());
        Ok(forms::custom_syllables(
            self.arena(),
            &mut groups,
            &pattern,
            rng,
        )?)
    }

    pub fn couplets<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Poem, InsufficientCorpus> {
        forms::couplets(self.arena(), self.rhyme_groups(), rng)
    }

    pub fn villanelle<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Poem, InsufficientCorpus> {
        forms::villanelle(self.arena(), self.rhyme_groups(), rng)
    }

    pub fn haiku<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Poem, InsufficientCorpus> {
        let mut groups = SyllableGroups::build(self.candidates());
        forms::haiku(self.arena(), &mut groups, rng)
    }

    pub fn acrostic<R: Rng + ?Sized>(&self, key: &str, rng: &mut R) -> Result<Poem, ComposeError> {
        let key = AcrosticKey::parse(key)?;
        Ok(forms::acrostic(self.arena(), self.candidates(), &key, rng)?)
    }

    pub fn metered<R: Rng + ?Sized>(&self, lines: usize, rng: &mut R) -> Result<Poem, ComposeError> {
        if lines == 0 || lines > MAX_PATTERN_LEN {
            return Err(ComposeError::InvalidLineCount(lines));
        }
        Ok(forms::metered(self.arena(), self.oracle, lines, rng)?)
    }

    fn rhyme_groups(&self) -> RhymeGroups {
        RhymeGroups::build(self.candidates(), self.oracle)
    }
}

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;
use tracing::info;

/// Index of a fragment inside a [`FragmentArena`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FragmentId(u32);

impl FragmentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Immutable, deduplicated store of normalized fragments.
///
/// Groupers and pools only hold [`FragmentId`]s; the text itself is never
/// mutated or moved once the arena is built.
#[derive(Debug, Clone, Default)]
pub struct FragmentArena {
    texts: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read corpus: {0}")]
    Io(#[from] std::io::Error),
}

impl FragmentArena {
    /// Normalize every raw fragment and keep the first copy of each text.
    pub fn from_corpus<S: AsRef<str>>(corpus: &[S]) -> Self {
        let mut seen = HashSet::with_capacity(corpus.len());
        let mut texts = Vec::with_capacity(corpus.len());
        for raw in corpus {
            if let Some(text) = normalize_fragment(raw.as_ref())
                && seen.insert(text.clone())
            {
                texts.push(text);
            }
        }
        Self { texts }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn text(&self, id: FragmentId) -> &str {
        &self.texts[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (FragmentId, &str)> + '_ {
        self.texts
            .iter()
            .enumerate()
            .map(|(idx, text)| (FragmentId(idx as u32), text.as_str()))
    }

    pub(crate) fn id(idx: usize) -> FragmentId {
        FragmentId(idx as u32)
    }
}

/// Collapse whitespace runs (newlines included) into single spaces.
///
/// Returns `None` when nothing but whitespace remains.
pub fn normalize_fragment(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Read a corpus file, one raw fragment per line.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<String>, CorpusError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut corpus = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            corpus.push(line);
        }
    }
    info!("loaded {} corpus lines", corpus.len());
    Ok(corpus)
}

//! Load the CMU Pronouncing Dictionary with zero-copy text.
//!
//! Both published layouts are accepted: the classic `cmudict-0.7b`
//! (`WORD  PH1 PH2`, upper case, `;;;` comments) and the newer
//! `cmudict.dict` (`word ph1 ph2`, lower case, trailing `# comment`).
//! Variant entries (`WORD(2)`) are folded under their headword and returned
//! in variant order. Callers choose between memory-mapped files or owned
//! buffers at runtime via [`LoadMode`].
//!
//! # Example
//! ```no_run
//! use cmudict_db::{CmuDict, LoadMode};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dict = CmuDict::load_with_mode("/path/to/cmudict.dict", LoadMode::Mmap)?;
//! for p in dict.pronunciations("tomato") {
//!     println!("{}({}): {} -> {}", p.word, p.variant, p.phones, p.rhyming_part());
//! }
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p cmudict-db --example lookup -- <dict> <word>...`.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use cmudict_types::{Pronunciation, parse_variant_key};
use memmap2::Mmap;

/// Strategy for loading the dictionary file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file (fast, zero-copy).
    Mmap,
    /// Read the file into an owned buffer (portable fallback).
    Owned,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

#[derive(Clone, Copy)]
struct TextRef {
    start: usize,
    len: usize,
}

struct EntryData {
    word: TextRef,
    variant: u8,
    phones: TextRef,
}

/// In-memory view of a pronouncing dictionary backed by mmap or an owned buffer.
pub struct CmuDict {
    buffer: Buffer,
    entries: HashMap<String, Vec<EntryData>>,
    pronunciation_count: usize,
}

impl CmuDict {
    /// Load a dictionary file, memory-mapping it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_mode(path, LoadMode::Mmap)
    }

    /// Load a dictionary file choosing between mmap and an owned buffer.
    pub fn load_with_mode(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        let buffer = load_file(path, mode)?;
        let (entries, pronunciation_count) = parse_dict(buffer.as_slice())
            .with_context(|| format!("parse {}", path.display()))?;
        Ok(Self {
            buffer,
            entries,
            pronunciation_count,
        })
    }

    /// Build a dictionary from bytes already in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let (entries, pronunciation_count) = parse_dict(&bytes)?;
        Ok(Self {
            buffer: Buffer::Owned(bytes),
            entries,
            pronunciation_count,
        })
    }

    /// Check whether a word has at least one pronunciation.
    pub fn word_exists(&self, word: &str) -> bool {
        self.entries.contains_key(&normalize_word(word))
    }

    /// All pronunciations of a word in variant order, or an empty list.
    pub fn pronunciations(&self, word: &str) -> Vec<Pronunciation<'_>> {
        self.entries
            .get(&normalize_word(word))
            .map(|variants| variants.iter().map(|e| self.make_view(e)).collect())
            .unwrap_or_default()
    }

    /// The unmarked (lowest-numbered) pronunciation of a word.
    pub fn first_pronunciation(&self, word: &str) -> Option<Pronunciation<'_>> {
        self.entries
            .get(&normalize_word(word))
            .and_then(|variants| variants.first())
            .map(|e| self.make_view(e))
    }

    /// Iterate over every pronunciation in the dictionary.
    pub fn iter_pronunciations(&self) -> impl Iterator<Item = Pronunciation<'_>> + '_ {
        self.entries
            .values()
            .flat_map(move |variants| variants.iter().map(move |e| self.make_view(e)))
    }

    /// Number of distinct headwords.
    pub fn word_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of pronunciations across all headwords, variants included.
    pub fn pronunciation_count(&self) -> usize {
        self.pronunciation_count
    }

    fn make_view<'a>(&'a self, data: &EntryData) -> Pronunciation<'a> {
        Pronunciation {
            word: self.text(data.word),
            variant: data.variant,
            phones: self.text(data.phones),
        }
    }

    fn text(&self, r: TextRef) -> &str {
        let bytes = self.buffer.as_slice();
        let slice = &bytes[r.start..r.start + r.len];
        std::str::from_utf8(slice).expect("dictionary text was validated as utf8 at load")
    }
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    match mode {
        LoadMode::Mmap => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

fn parse_dict(bytes: &[u8]) -> Result<(HashMap<String, Vec<EntryData>>, usize)> {
    let mut entries: HashMap<String, Vec<EntryData>> = HashMap::new();
    let mut count = 0usize;
    let mut line_start = 0usize;

    for (lineno, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let offset = line_start;
        line_start += raw_line.len() + 1;

        let line = strip_cr(raw_line);
        let line_str = std::str::from_utf8(line)
            .with_context(|| format!("line {} is not valid utf8", lineno + 1))?;
        let content = match line_str.find('#') {
            Some(hash) => &line_str[..hash],
            None => line_str,
        };
        if content.trim().is_empty() || content.starts_with(";;;") {
            continue;
        }

        let mut tokens = content.split_ascii_whitespace();
        let Some(head) = tokens.next() else {
            continue;
        };
        let Some(first_phone) = tokens.next() else {
            anyhow::bail!("line {}: entry {head:?} has no phones", lineno + 1);
        };
        let last_phone = tokens.last().unwrap_or(first_phone);

        let (word, variant) = parse_variant_key(head)
            .with_context(|| format!("line {}: malformed headword {head:?}", lineno + 1))?;

        let word_ref = text_ref(offset, line_str, word);
        let phones_start = token_offset(line_str, first_phone);
        let phones_end = token_offset(line_str, last_phone) + last_phone.len();
        let phones_ref = TextRef {
            start: offset + phones_start,
            len: phones_end - phones_start,
        };

        let variants = entries.entry(normalize_word(word)).or_default();
        variants.push(EntryData {
            word: word_ref,
            variant,
            phones: phones_ref,
        });
        variants.sort_by_key(|e| e.variant);
        count += 1;
    }

    Ok((entries, count))
}

fn text_ref(line_offset: usize, line: &str, token: &str) -> TextRef {
    TextRef {
        start: line_offset + token_offset(line, token),
        len: token.len(),
    }
}

/// Byte position of `token` inside `line`; `token` must be a subslice of it.
fn token_offset(line: &str, token: &str) -> usize {
    token.as_ptr() as usize - line.as_ptr() as usize
}

fn strip_cr(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

fn normalize_word(text: &str) -> String {
    text.trim().to_lowercase()
}

use std::fmt;

use thiserror::Error;

/// The single recoverable failure: the corpus cannot satisfy the request.
///
/// No partial poem accompanies it; assembly is all-or-nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("corpus too small, try again: {reason}")]
pub struct InsufficientCorpus {
    pub reason: String,
}

impl InsufficientCorpus {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// An assembled poem: an optional title and one or more stanzas of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poem {
    pub title: Option<String>,
    pub stanzas: Vec<Vec<String>>,
}

impl Poem {
    /// A single untitled stanza.
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self {
            title: None,
            stanzas: vec![lines],
        }
    }

    pub fn titled(title: &str, stanzas: Vec<Vec<String>>) -> Self {
        Self {
            title: Some(title.to_string()),
            stanzas,
        }
    }

    /// Content lines in order, stanza breaks skipped.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stanzas.iter().flatten().map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.stanzas.iter().map(Vec::len).sum()
    }
}

/// Lines joined by `\n`, stanzas separated by a blank line, no title and no
/// trailing newline.
impl fmt::Display for Poem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (s, stanza) in self.stanzas.iter().enumerate() {
            if s > 0 {
                f.write_str("\n\n")?;
            }
            for (l, line) in stanza.iter().enumerate() {
                if l > 0 {
                    f.write_str("\n")?;
                }
                f.write_str(line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_without_trailing_newline() {
        let poem = Poem::from_lines(vec!["one".into(), "two".into()]);
        assert_eq!(poem.to_string(), "one\ntwo");
        assert_eq!(poem.line_count(), 2);
    }

    #[test]
    fn separates_stanzas_with_blank_line() {
        let poem = Poem::titled(
            "Couplets",
            vec![vec!["a".into(), "b".into()], vec!["c".into()]],
        );
        assert_eq!(poem.to_string(), "a\nb\n\nc");
        assert_eq!(poem.lines().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(poem.title.as_deref(), Some("Couplets"));
    }

    #[test]
    fn insufficient_corpus_message() {
        let err = InsufficientCorpus::new("no 7-syllable fragments");
        assert_eq!(
            err.to_string(),
            "corpus too small, try again: no 7-syllable fragments"
        );
    }
}

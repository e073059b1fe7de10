//! Constrained poems mined from a corpus of short comments.
//!
//! Fragments are filtered and grouped by rhyme, syllable count and initial
//! letter, then drawn without replacement to fill a pattern or a fixed form.
//! [`Composer`] is the entry point; [`handlers::router`] serves it over HTTP.

pub mod compose;
pub mod corpus;
pub mod filter;
pub mod forms;
pub mod fulfill;
pub mod handlers;
pub mod oracle;
pub mod pattern;
pub mod poem;
pub mod pool;
pub mod rate_limit;
pub mod rhyme;
pub mod syllable;

pub use compose::{ComposeError, Composer, CorpusSnapshot, CorpusStats, Form};
pub use corpus::{FragmentArena, FragmentId, load_corpus, normalize_fragment};
pub use handlers::{AppState, router};
pub use oracle::{MapOracle, PronunciationOracle};
pub use pattern::{AcrosticKey, PatternError, RhymeScheme, SyllablePattern};
pub use poem::{InsufficientCorpus, Poem};

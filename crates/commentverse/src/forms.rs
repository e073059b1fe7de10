//! Poem formatters: fixed shapes assembled from the groupers.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;
use verse_meter::Meter;

use crate::corpus::{FragmentArena, FragmentId};
use crate::filter::Candidates;
use crate::fulfill::{fulfill_rhyme, fulfill_syllables};
use crate::oracle::PronunciationOracle;
use crate::pattern::{AcrosticKey, RhymeScheme, SyllablePattern};
use crate::poem::{InsufficientCorpus, Poem};
use crate::pool::Pool;
use crate::rhyme::{RhymeGroup, RhymeGroups};
use crate::syllable::SyllableGroups;

pub const COUPLETS_TITLE: &str = "Rhyming Couplets";
pub const HAIKU_TITLE: &str = "Haiku";
pub const VILLANELLE_TITLE: &str = "Villanelle";
pub const ACROSTIC_TITLE: &str = "Acrostic";
pub const METERED_TITLE: &str = "Iambic Pentameter";

const COUPLET_SCHEME: &str = "AABBCC";
const HAIKU_PATTERN: [usize; 3] = [5, 7, 5];

/// Distinct A-rhyme lines in a villanelle; the first two are the refrains.
pub const VILLANELLE_A_LINES: usize = 7;
/// Distinct B-rhyme lines in a villanelle.
pub const VILLANELLE_B_LINES: usize = 6;

/// Rhyme slot for each line of the five tercets and closing quatrain.
const VILLANELLE_LAYOUT: [&[Slot]; 6] = [
    &[Slot::A(0), Slot::B(0), Slot::A(1)],
    &[Slot::A(2), Slot::B(1), Slot::A(0)],
    &[Slot::A(3), Slot::B(2), Slot::A(1)],
    &[Slot::A(4), Slot::B(3), Slot::A(0)],
    &[Slot::A(5), Slot::B(4), Slot::A(1)],
    &[Slot::A(6), Slot::B(5), Slot::A(0), Slot::A(1)],
];

#[derive(Clone, Copy)]
enum Slot {
    A(usize),
    B(usize),
}

fn texts(arena: &FragmentArena, ids: &[FragmentId]) -> Vec<String> {
    ids.iter().map(|id| arena.text(*id).to_string()).collect()
}

/// A single untitled stanza following `scheme`.
pub fn custom_rhyme<R: Rng + ?Sized>(
    arena: &FragmentArena,
    groups: RhymeGroups,
    scheme: &RhymeScheme,
    rng: &mut R,
) -> Result<Poem, InsufficientCorpus> {
    let ids = fulfill_rhyme(groups, scheme, rng)?;
    Ok(Poem::from_lines(texts(arena, &ids)))
}

/// A single untitled stanza following `pattern`.
pub fn custom_syllables<R: Rng + ?Sized>(
    arena: &FragmentArena,
    groups: &mut SyllableGroups,
    pattern: &SyllablePattern,
    rng: &mut R,
) -> Result<Poem, InsufficientCorpus> {
    let ids = fulfill_syllables(groups, pattern, rng)?;
    Ok(Poem::from_lines(texts(arena, &ids)))
}

/// Three rhyming couplets, one per stanza.
pub fn couplets<R: Rng + ?Sized>(
    arena: &FragmentArena,
    groups: RhymeGroups,
    rng: &mut R,
) -> Result<Poem, InsufficientCorpus> {
    let scheme = RhymeScheme::parse(COUPLET_SCHEME)
        .map_err(|err| InsufficientCorpus::new(err.to_string()))?;
    let ids = fulfill_rhyme(groups, &scheme, rng)?;
    let stanzas = ids.chunks(2).map(|pair| texts(arena, pair)).collect();
    Ok(Poem::titled(COUPLETS_TITLE, stanzas))
}

/// Three lines of five, seven and five syllables.
pub fn haiku<R: Rng + ?Sized>(
    arena: &FragmentArena,
    groups: &mut SyllableGroups,
    rng: &mut R,
) -> Result<Poem, InsufficientCorpus> {
    let pattern = SyllablePattern::from_counts(HAIKU_PATTERN.to_vec())
        .map_err(|err| InsufficientCorpus::new(err.to_string()))?;
    let ids = fulfill_syllables(groups, &pattern, rng)?;
    Ok(Poem::titled(HAIKU_TITLE, vec![texts(arena, &ids)]))
}

/// Nineteen lines: five tercets and a quatrain on two rhymes, with the first
/// and third lines returning as alternating refrains.
pub fn villanelle<R: Rng + ?Sized>(
    arena: &FragmentArena,
    groups: RhymeGroups,
    rng: &mut R,
) -> Result<Poem, InsufficientCorpus> {
    let mut qualifying: Pool<RhymeGroup> = groups
        .into_groups()
        .into_iter()
        .filter(|g| g.len() >= VILLANELLE_A_LINES)
        .collect();
    debug!("{} rhyme groups large enough for a villanelle", qualifying.len());

    let pair = qualifying.take_random(2, rng).ok_or_else(|| {
        InsufficientCorpus::new(format!(
            "need two rhyme groups with at least {VILLANELLE_A_LINES} distinct words"
        ))
    })?;
    let [a_group, b_group] = <[RhymeGroup; 2]>::try_from(pair)
        .map_err(|_| InsufficientCorpus::new("rhyme group draw came up short"))?;

    let mut a_pool: Pool<FragmentId> = a_group.fragments().collect();
    let mut b_pool: Pool<FragmentId> = b_group.fragments().collect();
    let (Some(a), Some(b)) = (
        a_pool.take_random(VILLANELLE_A_LINES, rng),
        b_pool.take_random(VILLANELLE_B_LINES, rng),
    ) else {
        return Err(InsufficientCorpus::new("villanelle rhyme group ran out of lines"));
    };

    let stanzas = VILLANELLE_LAYOUT
        .iter()
        .map(|stanza| {
            stanza
                .iter()
                .map(|slot| match *slot {
                    Slot::A(i) => arena.text(a[i]).to_string(),
                    Slot::B(i) => arena.text(b[i]).to_string(),
                })
                .collect()
        })
        .collect();
    Ok(Poem::titled(VILLANELLE_TITLE, stanzas))
}

/// Fragments bucketed by lowercased initial letter: ASCII letters in a fixed
/// array, every other letter in a map.
struct InitialPools {
    ascii: [Pool<FragmentId>; 26],
    other: BTreeMap<char, Pool<FragmentId>>,
}

impl InitialPools {
    fn build(candidates: &Candidates) -> Self {
        let mut pools = Self {
            ascii: array_init::array_init(|_| Pool::new()),
            other: BTreeMap::new(),
        };
        for (fragment, initial) in candidates.initials() {
            pools.pool_mut(initial).push(fragment);
        }
        pools
    }

    fn pool_mut(&mut self, letter: char) -> &mut Pool<FragmentId> {
        if letter.is_ascii_lowercase() {
            &mut self.ascii[usize::from(letter as u8 - b'a')]
        } else {
            self.other.entry(letter).or_default()
        }
    }

    fn pop_random<R: Rng + ?Sized>(&mut self, letter: char, rng: &mut R) -> Option<FragmentId> {
        if letter.is_ascii_lowercase() {
            self.ascii[usize::from(letter as u8 - b'a')].pop_random(rng)
        } else {
            self.other.get_mut(&letter)?.pop_random(rng)
        }
    }
}

/// One line per key letter, each starting with that letter.
pub fn acrostic<R: Rng + ?Sized>(
    arena: &FragmentArena,
    candidates: &Candidates,
    key: &AcrosticKey,
    rng: &mut R,
) -> Result<Poem, InsufficientCorpus> {
    let mut pools = InitialPools::build(candidates);

    let mut lines = Vec::with_capacity(key.letters().len());
    for &letter in key.letters() {
        let fragment = pools.pop_random(letter, rng).ok_or_else(|| {
            InsufficientCorpus::new(format!("no fragments left starting with {letter:?}"))
        })?;
        lines.push(arena.text(fragment).to_string());
    }
    Ok(Poem::titled(ACROSTIC_TITLE, vec![lines]))
}

/// `lines` fragments that each scan as iambic pentameter.
pub fn metered<O, R>(
    arena: &FragmentArena,
    oracle: &O,
    lines: usize,
    rng: &mut R,
) -> Result<Poem, InsufficientCorpus>
where
    O: PronunciationOracle + ?Sized,
    R: Rng + ?Sized,
{
    let meter = Meter::iambic_pentameter();
    let mut matching: Pool<FragmentId> = arena
        .iter()
        .filter(|(_, text)| scans(&meter, text, oracle))
        .map(|(id, _)| id)
        .collect();
    debug!("{} fragments scan as {}", matching.len(), meter.name());

    let ids = matching.take_random(lines, rng).ok_or_else(|| {
        InsufficientCorpus::new(format!(
            "only {} fragments scan as {}, need {lines}",
            matching.len(),
            meter.name()
        ))
    })?;
    Ok(Poem::titled(METERED_TITLE, vec![texts(arena, &ids)]))
}

fn scans<O>(meter: &Meter, text: &str, oracle: &O) -> bool
where
    O: PronunciationOracle + ?Sized,
{
    if text.chars().any(char::is_numeric) {
        return false;
    }
    meter
        .scan(text, |word| {
            oracle
                .pronunciations(word)
                .into_iter()
                .map(|phones| oracle.stresses(phones))
                .collect()
        })
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MapOracle;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    /// Seven `-ay` words, seven `-ight` words, and padding.
    fn oracle() -> MapOracle {
        let mut o = MapOracle::new();
        for w in ["day", "way", "say", "play", "stay", "gray", "may"] {
            o.insert(w, &format!("{} EY1", w.chars().next().unwrap().to_ascii_uppercase()));
        }
        for w in ["night", "light", "bright", "fight", "sight", "might", "tight"] {
            o.insert(w, &format!("{} AY1 T", w.chars().next().unwrap().to_ascii_uppercase()));
        }
        for (w, p) in [
            ("the", "DH AH0"),
            ("a", "AH0"),
            ("cat", "K AE1 T"),
            ("hat", "HH AE1 T"),
            ("about", "AH0 B AW1 T"),
            ("and", "AH0 N D"),
            ("alone", "AH0 L OW1 N"),
            ("it", "IH1 T"),
            ("was", "W AA1 Z"),
            ("end", "EH1 N D"),
            ("of", "AH1 V"),
        ] {
            o.insert(w, p);
        }
        o
    }

    fn villanelle_corpus() -> Vec<String> {
        let mut corpus = Vec::new();
        for w in ["day", "way", "say", "play", "stay", "gray", "may"] {
            corpus.push(format!("and so it goes at the end of the {w}"));
        }
        for w in ["night", "light", "bright", "fight", "sight", "might", "tight"] {
            corpus.push(format!("we kept on talking well into the {w}"));
        }
        corpus
    }

    fn setup(corpus: &[String]) -> (FragmentArena, Candidates, MapOracle) {
        let o = oracle();
        let arena = FragmentArena::from_corpus(corpus);
        let candidates = Candidates::scan(&arena, &o);
        (arena, candidates, o)
    }

    #[test]
    fn villanelle_has_nineteen_lines_with_refrains() {
        let (arena, candidates, o) = setup(&villanelle_corpus());
        let groups = RhymeGroups::build(&candidates, &o);
        let mut rng = StdRng::seed_from_u64(11);
        let poem = villanelle(&arena, groups, &mut rng).expect("two groups of seven");

        let sizes: Vec<usize> = poem.stanzas.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 3, 3, 3, 4]);
        assert_eq!(poem.line_count(), 19);

        let lines: Vec<&str> = poem.lines().collect();
        let (a0, a1) = (lines[0], lines[2]);
        assert_ne!(a0, a1);
        for i in [5, 11, 17] {
            assert_eq!(lines[i], a0);
        }
        for i in [8, 14, 18] {
            assert_eq!(lines[i], a1);
        }
        let distinct: HashSet<&str> = lines.iter().copied().collect();
        assert_eq!(distinct.len(), VILLANELLE_A_LINES + VILLANELLE_B_LINES);
        assert_eq!(poem.title.as_deref(), Some(VILLANELLE_TITLE));
    }

    #[test]
    fn villanelle_needs_two_large_groups() {
        let mut corpus = villanelle_corpus();
        corpus.truncate(13);
        let (arena, candidates, o) = setup(&corpus);
        let groups = RhymeGroups::build(&candidates, &o);
        let mut rng = StdRng::seed_from_u64(11);
        assert!(villanelle(&arena, groups, &mut rng).is_err());
    }

    #[test]
    fn couplets_rhyme_in_pairs() {
        let mut corpus = villanelle_corpus();
        corpus.push("somebody please go feed the cat".to_string());
        corpus.push("I left it sitting in my hat".to_string());
        let (arena, candidates, o) = setup(&corpus);
        let groups = RhymeGroups::build(&candidates, &o);
        let mut rng = StdRng::seed_from_u64(2);
        let poem = couplets(&arena, groups, &mut rng).expect("three rhymes");
        assert_eq!(poem.title.as_deref(), Some(COUPLETS_TITLE));
        assert_eq!(poem.stanzas.len(), 3);
        assert!(poem.stanzas.iter().all(|s| s.len() == 2));
        let distinct: HashSet<&str> = poem.lines().collect();
        assert_eq!(distinct.len(), 6);
    }

    #[test]
    fn acrostic_follows_key_letters() {
        let corpus: Vec<String> = [
            "cats are better than dogs, obviously",
            "a long time ago in a galaxy far away",
            "there is no such thing as a free lunch",
            "Cooking is just chemistry you can eat",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let (arena, candidates, _) = setup(&corpus);
        let key = AcrosticKey::parse("Cat").unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let poem = acrostic(&arena, &candidates, &key, &mut rng).expect("c, a and t present");
        let initials: Vec<char> = poem
            .lines()
            .map(|l| l.chars().find(|c| c.is_alphabetic()).unwrap().to_ascii_lowercase())
            .collect();
        assert_eq!(initials, vec!['c', 'a', 't']);

        let key = AcrosticKey::parse("tat").unwrap();
        let err = acrostic(&arena, &candidates, &key, &mut rng).unwrap_err();
        assert_eq!(err.reason, "no fragments left starting with 't'");
    }

    #[test]
    fn acrostic_groups_non_ascii_initials() {
        let corpus: Vec<String> = [
            "Élan vital is what keeps us all going",
            "every single day is a brand new start",
            "ñandú sightings are rare around here",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let (arena, candidates, _) = setup(&corpus);
        let key = AcrosticKey::parse("éÑe").unwrap();
        assert_eq!(key.letters(), &['é', 'ñ', 'e']);
        let mut rng = StdRng::seed_from_u64(6);
        let poem = acrostic(&arena, &candidates, &key, &mut rng).expect("é, ñ and e present");
        assert_eq!(
            poem.lines().collect::<Vec<_>>(),
            vec![
                "Élan vital is what keeps us all going",
                "ñandú sightings are rare around here",
                "every single day is a brand new start",
            ]
        );

        let key = AcrosticKey::parse("éé").unwrap();
        let err = acrostic(&arena, &candidates, &key, &mut rng).unwrap_err();
        assert_eq!(err.reason, "no fragments left starting with 'é'");
    }

    #[test]
    fn haiku_reports_missing_counts() {
        let (arena, candidates, _) = setup(&villanelle_corpus());
        let mut groups = SyllableGroups::build(&candidates);
        let mut rng = StdRng::seed_from_u64(4);
        let err = haiku(&arena, &mut groups, &mut rng).unwrap_err();
        assert!(err.reason.contains("5-syllable"));
    }

    #[test]
    fn metered_draws_scanning_lines() {
        let corpus: Vec<String> = [
            "About, about, about, about, about!",
            "alone, alone, alone, alone, alone",
            "the cat",
            "about 5 about about about about",
            "about, about ٣, about, about, about",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let (arena, _, o) = setup(&corpus);
        let mut rng = StdRng::seed_from_u64(8);
        let poem = metered(&arena, &o, 2, &mut rng).expect("two iambic lines");
        let mut lines: Vec<&str> = poem.lines().collect();
        lines.sort_unstable();
        assert_eq!(
            lines,
            vec!["About, about, about, about, about!", "alone, alone, alone, alone, alone"]
        );
        let err = metered(&arena, &o, 3, &mut rng).unwrap_err();
        assert_eq!(err.reason, "only 2 fragments scan as iambic pentameter, need 3");
    }
}

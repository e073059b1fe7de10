//! Pattern fulfilment: draw disjoint fragments so that each line of the
//! output satisfies its slot in a rhyme scheme or syllable pattern.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use tracing::debug;

use crate::corpus::FragmentId;
use crate::pattern::{RhymeScheme, SyllablePattern};
use crate::poem::InsufficientCorpus;
use crate::pool::Pool;
use crate::rhyme::{RhymeGroup, RhymeGroups};
use crate::syllable::SyllableGroups;

/// Rhyme groups bucketed by size, each group drawable exactly once.
struct SizeBuckets {
    buckets: BTreeMap<usize, Vec<RhymeGroup>>,
}

impl SizeBuckets {
    fn new(groups: RhymeGroups) -> Self {
        let mut buckets: BTreeMap<usize, Vec<RhymeGroup>> = BTreeMap::new();
        for group in groups.into_groups() {
            buckets.entry(group.len()).or_default().push(group);
        }
        Self { buckets }
    }

    /// Remove a group holding at least `need` entries, chosen uniformly among
    /// all such groups.
    fn pop_at_least<R: Rng + ?Sized>(&mut self, need: usize, rng: &mut R) -> Option<RhymeGroup> {
        let available: usize = self.buckets.range(need..).map(|(_, b)| b.len()).sum();
        if available == 0 {
            return None;
        }
        let mut pick = rng.random_range(0..available);
        let mut chosen = None;
        for (size, bucket) in self.buckets.range_mut(need..) {
            if pick < bucket.len() {
                chosen = Some((*size, bucket.swap_remove(pick)));
                break;
            }
            pick -= bucket.len();
        }
        let (size, group) = chosen?;
        if self.buckets.get(&size).is_some_and(Vec::is_empty) {
            self.buckets.remove(&size);
        }
        Some(group)
    }
}

/// Fill `scheme` from `groups`, one fragment per symbol occurrence.
///
/// Each distinct symbol (in order of first appearance) is assigned its own
/// rhyme group with at least as many distinct final words as the symbol has
/// occurrences; lines are then drawn from the assigned groups without
/// replacement. Consumes the groups.
///
/// Any unused group at least that large qualifies, so a symbol used twice
/// may draw from a group of six.
pub fn fulfill_rhyme<R: Rng + ?Sized>(
    groups: RhymeGroups,
    scheme: &RhymeScheme,
    rng: &mut R,
) -> Result<Vec<FragmentId>, InsufficientCorpus> {
    let mut buckets = SizeBuckets::new(groups);
    let mut assigned: HashMap<char, Pool<FragmentId>> = HashMap::new();

    for (symbol, need) in scheme.symbol_counts() {
        let group = buckets.pop_at_least(need, rng).ok_or_else(|| {
            InsufficientCorpus::new(format!(
                "no rhyme group left with {need} distinct words for {symbol:?}"
            ))
        })?;
        debug!("assigned rhyme {:?} ({} entries) to {symbol:?}", group.key(), group.len());
        assigned.insert(symbol, group.fragments().collect());
    }

    scheme
        .symbols()
        .iter()
        .map(|symbol| {
            assigned
                .get_mut(symbol)
                .and_then(|pool| pool.pop_random(rng))
                .ok_or_else(|| {
                    InsufficientCorpus::new(format!("rhyme group for {symbol:?} ran out of lines"))
                })
        })
        .collect()
}

/// Fill `pattern` from `groups`, one fragment per required syllable count.
pub fn fulfill_syllables<R: Rng + ?Sized>(
    groups: &mut SyllableGroups,
    pattern: &SyllablePattern,
    rng: &mut R,
) -> Result<Vec<FragmentId>, InsufficientCorpus> {
    pattern
        .counts()
        .iter()
        .map(|&total| {
            groups.pop_random(total, rng).ok_or_else(|| {
                InsufficientCorpus::new(format!("not enough {total}-syllable fragments"))
            })
        })
        .collect()
}

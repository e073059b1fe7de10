use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use crate::corpus::FragmentId;
use crate::filter::Candidates;
use crate::pool::Pool;

/// Fragments keyed by their total syllable count.
#[derive(Debug, Clone, Default)]
pub struct SyllableGroups {
    groups: BTreeMap<usize, Pool<FragmentId>>,
}

impl SyllableGroups {
    pub fn build(candidates: &Candidates) -> Self {
        let mut groups: BTreeMap<usize, Pool<FragmentId>> = BTreeMap::new();
        for (fragment, total) in candidates.syllable_totals() {
            groups.entry(total).or_default().push(fragment);
        }
        debug!(
            "grouped {} syllable candidates into {} counts",
            candidates.syllable_count(),
            groups.len()
        );
        Self { groups }
    }

    /// Number of fragments remaining with exactly `total` syllables.
    pub fn count(&self, total: usize) -> usize {
        self.groups.get(&total).map_or(0, Pool::len)
    }

    /// Distinct totals present, ascending.
    pub fn totals(&self) -> impl Iterator<Item = usize> + '_ {
        self.groups.keys().copied()
    }

    /// Remove and return a random fragment with exactly `total` syllables.
    pub fn pop_random<R: Rng + ?Sized>(&mut self, total: usize, rng: &mut R) -> Option<FragmentId> {
        self.groups.get_mut(&total)?.pop_random(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::FragmentArena;
    use crate::oracle::MapOracle;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn groups_by_total_and_draws_without_replacement() {
        let oracle: MapOracle = [
            ("old", "OW1 L D"),
            ("pond", "P AA1 N D"),
            ("frog", "F R AA1 G"),
            ("jumps", "JH AH1 M P S"),
            ("in", "IH0 N"),
            ("water", "W AO1 T ER0"),
        ]
        .into_iter()
        .collect();
        let arena = FragmentArena::from_corpus(&[
            "old pond",
            "frog jumps in",
            "water, water!",
            "old frog jumps in water",
            "pond 9",
        ]);
        let candidates = Candidates::scan(&arena, &oracle);
        let mut groups = SyllableGroups::build(&candidates);

        assert_eq!(groups.totals().collect::<Vec<_>>(), vec![2, 3, 4, 6]);
        assert_eq!(groups.count(4), 1);
        assert_eq!(groups.count(7), 0);

        let mut rng = StdRng::seed_from_u64(3);
        let id = groups.pop_random(4, &mut rng).expect("one 4-syllable line");
        assert_eq!(arena.text(id), "water, water!");
        assert_eq!(groups.pop_random(4, &mut rng), None);
        assert_eq!(groups.pop_random(7, &mut rng), None);
    }
}

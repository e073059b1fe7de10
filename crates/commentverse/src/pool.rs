use rand::Rng;

/// A live set of items drawn uniformly at random without replacement.
///
/// Removal is `swap_remove`, so order inside the pool changes as items are
/// drawn; with a seeded RNG the sequence of draws is reproducible.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    items: Vec<T>,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Remove and return one item, or `None` once the pool is exhausted.
    pub fn pop_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..self.items.len());
        Some(self.items.swap_remove(idx))
    }

    /// Draw `n` items, or none at all if fewer than `n` remain.
    pub fn take_random<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Option<Vec<T>> {
        if self.items.len() < n {
            return None;
        }
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.extend(self.pop_random(rng));
        }
        Some(out)
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for Pool<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn draws_every_item_exactly_once() {
        let mut pool: Pool<u32> = (0..50).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        while let Some(item) = pool.pop_random(&mut rng) {
            assert!(seen.insert(item));
        }
        assert_eq!(seen.len(), 50);
        assert!(pool.is_empty());
        assert_eq!(pool.pop_random(&mut rng), None);
    }

    #[test]
    fn take_random_is_all_or_nothing() {
        let mut pool: Pool<u32> = (0..3).collect();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pool.take_random(4, &mut rng), None);
        assert_eq!(pool.len(), 3);
        let drawn = pool.take_random(3, &mut rng).expect("enough items");
        assert_eq!(drawn.len(), 3);
        assert!(pool.is_empty());
    }

    #[test]
    fn seeded_draws_repeat() {
        let draw = |seed| {
            let mut pool: Pool<u32> = (0..20).collect();
            let mut rng = StdRng::seed_from_u64(seed);
            pool.take_random(10, &mut rng).unwrap()
        };
        assert_eq!(draw(42), draw(42));
    }
}

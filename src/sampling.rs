//! Room sampling for the oversight walk: each stop inspects a random subset
//! of the site's rooms rather than every room.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::session::RoomId;

/// Pick `count` distinct rooms from the pool. Asking for more rooms than the
/// pool holds returns the whole pool. The result is sorted so a sampled plan
/// walks rooms in a stable order.
pub fn sample_rooms<R: Rng + ?Sized>(pool: &[RoomId], count: usize, rng: &mut R) -> Vec<RoomId> {
    let mut picked: Vec<RoomId> = pool
        .choose_multiple(rng, count.min(pool.len()))
        .cloned()
        .collect();
    picked.sort();
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool() -> Vec<RoomId> {
        (1..=10)
            .map(|n| RoomId::new("classroom", format!("{n:03}")))
            .collect()
    }

    #[test]
    fn samples_are_distinct_and_from_the_pool() {
        let pool = pool();
        let mut rng = StdRng::seed_from_u64(7);
        let picked = sample_rooms(&pool, 4, &mut rng);
        assert_eq!(picked.len(), 4);
        for room in &picked {
            assert!(pool.contains(room));
        }
        let mut deduped = picked.clone();
        deduped.dedup();
        assert_eq!(deduped, picked);
    }

    #[test]
    fn oversampling_returns_the_whole_pool() {
        let pool = pool();
        let mut rng = StdRng::seed_from_u64(7);
        let picked = sample_rooms(&pool, 50, &mut rng);
        assert_eq!(picked.len(), pool.len());
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(sample_rooms(&[], 3, &mut rng).is_empty());
    }
}

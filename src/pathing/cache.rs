//! Direct-mapped cache for shortest-path queries (spec.md §4.3).

use super::{compute, PathQuery, PathTable};

struct Slot {
    query: PathQuery,
    table: PathTable,
}

/// A direct-mapped cache of `entries` slots, keyed by a hash of the
/// query. Collisions simply evict; entries is expected to be a power of
/// two, with `1` selecting "small cache" mode for bulk-pipeline startup
/// (spec.md §4.3).
pub struct PathCache {
    slots: Vec<Option<Slot>>,
    mask: u64,
    hits: u64,
    misses: u64,
}

impl PathCache {
    #[must_use]
    pub fn new(entries: usize) -> Self {
        let entries = entries.max(1).next_power_of_two();
        let mut slots = Vec::with_capacity(entries);
        slots.resize_with(entries, || None);
        PathCache { slots, mask: (entries - 1) as u64, hits: 0, misses: 0 }
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn get_or_compute(&mut self, query: PathQuery) -> &PathTable {
        let idx = (query.hash_key() & self.mask) as usize;
        let fresh = !matches!(&self.slots[idx], Some(slot) if slot.query == query);
        if fresh {
            self.misses += 1;
            self.slots[idx] = Some(Slot { query, table: compute(&query) });
        } else {
            self.hits += 1;
        }
        &self.slots[idx].as_ref().unwrap().table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::types::{Bitboard, Color, Piece, Square};

    #[test]
    fn repeated_query_hits_cache() {
        let mut cache = PathCache::new(8);
        let query = PathQuery {
            piece: Piece::Knight,
            color: Color::White,
            to: Square::new(0, 0),
            max_captures: 0,
            blocked: Bitboard::EMPTY,
        };
        cache.get_or_compute(query);
        cache.get_or_compute(query);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }
}

//! Direct-mapped proof-kernel transposition table with a generation
//! counter for replacement, grounded on the teacher's
//! `src/transposition_table.rs` replacement policy (spec.md §4.6).

struct Entry {
    key: u64,
    generation: u32,
    /// This state is already known to have no solution within its
    /// recorded `remaining_moves` budget.
    proven_unsolvable: bool,
}

pub struct KernelTt {
    entries: Vec<Option<Entry>>,
    buckets_mask: u64,
    generation: u32,
    max_entries: usize,
    probes: u64,
    hits: u64,
}

const SLOTS_PER_BUCKET: usize = 4;

impl KernelTt {
    #[must_use]
    pub fn new(initial_entries: usize, max_entries: usize) -> Self {
        let buckets = (initial_entries.max(SLOTS_PER_BUCKET) / SLOTS_PER_BUCKET).next_power_of_two();
        let mut entries = Vec::with_capacity(buckets * SLOTS_PER_BUCKET);
        entries.resize_with(buckets * SLOTS_PER_BUCKET, || None);
        KernelTt { entries, buckets_mask: (buckets - 1) as u64, generation: 0, max_entries, probes: 0, hits: 0 }
    }

    pub fn new_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn grow_if_needed(&mut self) {
        let occupied = self.entries.iter().filter(|e| e.is_some()).count();
        if occupied * 4 >= self.entries.len() && self.entries.len() * 2 <= self.max_entries {
            let new_buckets = (self.entries.len() / SLOTS_PER_BUCKET) * 2;
            let mut new_entries = Vec::with_capacity(new_buckets * SLOTS_PER_BUCKET);
            new_entries.resize_with(new_buckets * SLOTS_PER_BUCKET, || None);
            let old_mask = self.buckets_mask;
            let new_mask = (new_buckets - 1) as u64;
            for slot in self.entries.drain(..) {
                if let Some(entry) = slot {
                    let bucket = (entry.key & new_mask) as usize * SLOTS_PER_BUCKET;
                    for i in 0..SLOTS_PER_BUCKET {
                        if new_entries[bucket + i].is_none() {
                            new_entries[bucket + i] = Some(entry);
                            break;
                        }
                    }
                }
            }
            let _ = old_mask;
            self.entries = new_entries;
            self.buckets_mask = new_mask;
        }
    }

    #[must_use]
    pub fn probe_unsolvable(&mut self, key: u64) -> bool {
        self.probes += 1;
        let bucket = (key & self.buckets_mask) as usize * SLOTS_PER_BUCKET;
        for slot in &self.entries[bucket..bucket + SLOTS_PER_BUCKET] {
            if let Some(entry) = slot {
                if entry.key == key && entry.proven_unsolvable {
                    self.hits += 1;
                    return true;
                }
            }
        }
        false
    }

    pub fn store_unsolvable(&mut self, key: u64) {
        self.grow_if_needed();
        let bucket = (key & self.buckets_mask) as usize * SLOTS_PER_BUCKET;
        let generation = self.generation;
        let slots = &mut self.entries[bucket..bucket + SLOTS_PER_BUCKET];

        if let Some(idx) = slots.iter().position(|s| matches!(s, Some(e) if e.key == key)) {
            slots[idx] = Some(Entry { key, generation, proven_unsolvable: true });
            return;
        }
        if let Some(idx) = slots.iter().position(|s| s.is_none()) {
            slots[idx] = Some(Entry { key, generation, proven_unsolvable: true });
            return;
        }
        let shallowest = slots
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.as_ref().map_or(0, |e| e.generation))
            .map(|(i, _)| i)
            .unwrap();
        slots[shallowest] = Some(Entry { key, generation, proven_unsolvable: true });
    }

    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        if self.probes == 0 {
            0.0
        } else {
            self.hits as f64 / self.probes as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_probes_unsolvable_state() {
        let mut tt = KernelTt::new(16, 64);
        assert!(!tt.probe_unsolvable(42));
        tt.store_unsolvable(42);
        assert!(tt.probe_unsolvable(42));
        assert!(!tt.probe_unsolvable(7));
    }
}

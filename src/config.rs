//! Tunable configuration threaded through every component at
//! construction. Nothing in this crate reads global or thread-local
//! mutable state for these values.

/// Construction-time tunables for the proof-game engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Hard ceiling on proof-kernel DFS nodes before giving up as `Unknown`.
    pub kernel_node_budget: u64,
    /// Initial A* node budget for the first pipeline iteration.
    pub astar_initial_budget: u64,
    /// Ceiling A* node budget across retries.
    pub astar_max_budget: u64,
    /// Multiplicative growth factor applied to the A* budget between
    /// pipeline retries (spec default 19/16).
    pub astar_budget_growth_num: u64,
    pub astar_budget_growth_den: u64,
    /// Number of entries in the proof-kernel transposition table,
    /// rounded up to a power of two. Doubles when >= 25% full, up to
    /// `kernel_tt_max_entries`.
    pub kernel_tt_initial_entries: usize,
    pub kernel_tt_max_entries: usize,
    /// Number of entries in the shortest-path oracle's direct-mapped
    /// cache. `1` selects "small cache" mode for bulk-pipeline startup.
    pub path_cache_entries: usize,
    /// A* priority weights `a*ply + b*bound`.
    pub astar_weight_ply: u32,
    pub astar_weight_bound: u32,
    /// Use the non-admissible heuristic augmentation (spec.md §4.9).
    pub heuristic_non_admissible: bool,
    /// Stop at the first accepted solution rather than continuing to
    /// search for a shorter one.
    pub accept_first: bool,
    /// Also retract irreversible (capture/pawn) forced last moves when no
    /// quiet predecessor exists (spec.md §4.5).
    pub retract_irreversible: bool,
    /// Worker count for `pipeline::run_many`. Ignored by
    /// `pipeline::Driver::run_lines`, which is strictly sequential.
    pub worker_count: usize,
    /// Per-task random seed, XORed into kernel move-ordering and A*
    /// tie-break randomization (spec.md §9).
    pub random_seed: u64,
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        EngineConfig::default()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            kernel_node_budget: 1_000_000,
            astar_initial_budget: 50_000,
            astar_max_budget: 800_000,
            astar_budget_growth_num: 19,
            astar_budget_growth_den: 16,
            kernel_tt_initial_entries: 1 << 19,
            kernel_tt_max_entries: 1 << 24,
            path_cache_entries: 1 << 19,
            astar_weight_ply: 1,
            astar_weight_bound: 1,
            heuristic_non_admissible: false,
            accept_first: true,
            retract_irreversible: false,
            worker_count: 1,
            random_seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budgets_match_spec_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.astar_initial_budget, 50_000);
        assert_eq!(cfg.astar_max_budget, 800_000);
        assert_eq!(cfg.astar_budget_growth_num, 19);
        assert_eq!(cfg.astar_budget_growth_den, 16);
    }
}

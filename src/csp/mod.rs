//! Integer CSP solver over bounded-domain variables with preference
//! orderings and parity constraints (C3, spec.md §4.2).
//!
//! Used by [`crate::extended_kernel`] to lift abstract kernel moves to
//! concrete pawn ranks.

mod domain;

pub use domain::Domain;

/// How a variable's remaining domain should be tried during search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preference {
    /// Try the smallest values first.
    Small,
    /// Try the largest values first.
    Large,
    /// Try the lower-middle of the domain first.
    MiddleSmall,
    /// Try the upper-middle of the domain first.
    MiddleLarge,
}

/// A binary constraint `x <= y + k` (the other relational constraints in
/// spec.md §4.2 are expressed as combinations of this and
/// [`Constraint::Bound`]/[`Constraint::Parity`]).
#[derive(Clone, Copy, Debug)]
pub enum Constraint {
    /// `vars[x] <= vars[y] + k`
    LessEq { x: usize, y: usize, k: i32 },
    /// `vars[x] == vars[y] + k`
    Eq { x: usize, y: usize, k: i32 },
    /// `vars[x] >= c`
    GeConst { x: usize, c: i32 },
    /// `vars[x] <= c`
    LeConst { x: usize, c: i32 },
    /// `vars[x]` is even (`even = true`) or odd (`even = false`).
    Parity { x: usize, even: bool },
}

#[derive(Clone, Debug)]
pub struct Variable {
    pub domain: Domain,
    pub preference: Preference,
}

impl Variable {
    #[must_use]
    pub fn new(min: i32, max: i32, preference: Preference) -> Self {
        Variable { domain: Domain::full(min, max), preference }
    }
}

#[derive(Clone, Debug)]
pub struct Solver {
    vars: Vec<Variable>,
    constraints: Vec<Constraint>,
    nodes_explored: u64,
}

/// A complete assignment, one value per variable, in variable-index order.
pub type Solution = Vec<i32>;

impl Solver {
    #[must_use]
    pub fn new(vars: Vec<Variable>, constraints: Vec<Constraint>) -> Self {
        Solver { vars, constraints, nodes_explored: 0 }
    }

    #[must_use]
    pub fn nodes_explored(&self) -> u64 {
        self.nodes_explored
    }

    /// Run propagation to a fixed point, then search for the first
    /// feasible assignment consistent with variable preferences.
    /// Preferences are ordering heuristics, not an objective: the first
    /// feasible assignment found is returned (spec.md §4.2).
    pub fn solve(mut self) -> Option<Solution> {
        if !self.propagate() {
            return None;
        }
        self.search()
    }

    fn propagate(&mut self) -> bool {
        loop {
            let mut changed = false;
            for constraint in self.constraints.clone() {
                match constraint {
                    Constraint::LessEq { x, y, k } => {
                        let (Some(y_max), Some(x_min)) = (self.vars[y].domain.max(), self.vars[x].domain.min())
                        else {
                            return false;
                        };
                        changed |= self.vars[x].domain.restrict_max(y_max + k);
                        changed |= self.vars[y].domain.restrict_min(x_min - k);
                    }
                    Constraint::Eq { x, y, k } => {
                        let (Some(y_min), Some(y_max), Some(x_min), Some(x_max)) = (
                            self.vars[y].domain.min(),
                            self.vars[y].domain.max(),
                            self.vars[x].domain.min(),
                            self.vars[x].domain.max(),
                        ) else {
                            return false;
                        };
                        changed |= self.vars[x].domain.restrict_min(y_min + k);
                        changed |= self.vars[x].domain.restrict_max(y_max + k);
                        changed |= self.vars[y].domain.restrict_min(x_min - k);
                        changed |= self.vars[y].domain.restrict_max(x_max - k);
                    }
                    Constraint::GeConst { x, c } => {
                        changed |= self.vars[x].domain.restrict_min(c);
                    }
                    Constraint::LeConst { x, c } => {
                        changed |= self.vars[x].domain.restrict_max(c);
                    }
                    Constraint::Parity { x, even } => {
                        changed |= self.vars[x].domain.restrict_parity(even);
                    }
                }
                if self.vars[x_of(&constraint)].domain.is_empty() {
                    return false;
                }
            }
            for v in &self.vars {
                if v.domain.is_empty() {
                    return false;
                }
            }
            if !changed {
                return true;
            }
        }
    }

    fn search(&mut self) -> Option<Solution> {
        self.nodes_explored += 1;

        if self.vars.iter().any(|v| v.domain.is_empty()) {
            return None;
        }
        if self.vars.iter().all(|v| v.domain.is_singleton()) {
            return Some(self.vars.iter().map(|v| v.domain.min().unwrap()).collect());
        }

        let pick = self
            .vars
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.domain.is_singleton())
            .min_by_key(|(_, v)| v.domain.size())
            .map(|(i, _)| i)?;

        for value in self.vars[pick].domain.ordered_values(self.vars[pick].preference) {
            let saved = self.vars.clone();
            self.vars[pick].domain = Domain::fixed(value);
            if self.propagate() {
                if let Some(solution) = self.search() {
                    return Some(solution);
                }
            }
            self.vars = saved;
        }
        None
    }
}

/// Helper to recover the "primary" variable of a constraint for the
/// post-propagation emptiness check in [`Solver::propagate`].
fn x_of(c: &Constraint) -> usize {
    match *c {
        Constraint::LessEq { x, .. }
        | Constraint::Eq { x, .. }
        | Constraint::GeConst { x, .. }
        | Constraint::LeConst { x, .. }
        | Constraint::Parity { x, .. } => x,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_simple_offset_equality() {
        let vars = vec![Variable::new(0, 7, Preference::Small), Variable::new(0, 7, Preference::Small)];
        let constraints = vec![Constraint::Eq { x: 1, y: 0, k: 1 }, Constraint::GeConst { x: 0, c: 3 }];
        let solution = Solver::new(vars, constraints).solve().unwrap();
        assert_eq!(solution[0], 3);
        assert_eq!(solution[1], 4);
    }

    #[test]
    fn respects_parity_constraint() {
        let vars = vec![Variable::new(0, 7, Preference::Small)];
        let constraints = vec![Constraint::Parity { x: 0, even: false }];
        let solution = Solver::new(vars, constraints).solve().unwrap();
        assert_eq!(solution[0] % 2, 1);
    }

    #[test]
    fn large_preference_picks_maximum_first() {
        let vars = vec![Variable::new(0, 7, Preference::Large)];
        let solution = Solver::new(vars, vec![]).solve().unwrap();
        assert_eq!(solution[0], 7);
    }

    #[test]
    fn detects_infeasible_bounds() {
        let vars = vec![Variable::new(0, 7, Preference::Small)];
        let constraints = vec![Constraint::GeConst { x: 0, c: 5 }, Constraint::LeConst { x: 0, c: 3 }];
        assert!(Solver::new(vars, constraints).solve().is_none());
    }
}

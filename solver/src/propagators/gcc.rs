//! `GlobalCardinality`: each tracked value `v` must be taken by a number of variables
//! within `[lo_v, hi_v]`. This is the bound-consistent half of the full generalized
//! arc-consistent GCC (which would need a Hall-interval flow argument akin to
//! [`AllDifferent`](super::all_different::AllDifferent)'s matching): forced/possible counts
//! per value are checked for feasibility, and a value is pruned from the remaining
//! undetermined variables as soon as its quota is already met.

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;
use hashbrown::HashMap;

#[derive(Debug, Clone)]
pub struct Gcc {
    pub vars: Vec<VarId>,
    /// `value -> (min_occurrences, max_occurrences)`.
    pub cardinalities: HashMap<IntCst, (IntCst, IntCst)>,
}

impl Propagator for Gcc {
    fn variables(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mut state = state.clone();
        for (&value, &(lo, hi)) in &self.cardinalities {
            let mut forced = 0i64;
            let mut possible = 0i64;
            for &v in &self.vars {
                let d = state.get_domain(v);
                if d.contains(value) {
                    possible += 1;
                    if d.is_singleton() {
                        forced += 1;
                    }
                }
            }
            if forced > hi as i64 || possible < lo as i64 {
                return Err(Inconsistent);
            }
            if forced == hi as i64 {
                for &v in &self.vars {
                    let d = state.get_domain(v);
                    if !d.is_singleton() && d.contains(value) {
                        let mut new_d = d.clone();
                        new_d.remove(value);
                        let (s, _) = state.set_domain(v, new_d, false)?;
                        state = s;
                    }
                }
            }
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Gcc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    fn vid(i: usize) -> VarId {
        VarId::from(i)
    }

    #[test]
    fn prunes_value_once_its_quota_is_met() {
        let state = SolverState::new(vec![Domain::singleton(1, 5), Domain::full(5), Domain::full(5)]);
        let mut cardinalities = HashMap::new();
        cardinalities.insert(1, (0, 1));
        let p = Gcc {
            vars: vec![vid(0), vid(1), vid(2)],
            cardinalities,
        };
        let out = p.propagate(&state).unwrap();
        assert!(!out.get_domain(vid(1)).contains(1));
        assert!(!out.get_domain(vid(2)).contains(1));
    }

    #[test]
    fn detects_unreachable_minimum() {
        let state = SolverState::new(vec![Domain::singleton(2, 5), Domain::singleton(3, 5)]);
        let mut cardinalities = HashMap::new();
        cardinalities.insert(1, (1, 2));
        let p = Gcc {
            vars: vec![vid(0), vid(1)],
            cardinalities,
        };
        assert!(p.propagate(&state).is_err());
    }
}

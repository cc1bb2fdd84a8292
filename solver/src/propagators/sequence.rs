//! `Sequence`: every contiguous window of `window_len` consecutive variables contains a
//! number of values from `values` within `[min_count, max_count]`. Decomposed into one
//! [`Among`](super::among::Among) constraint per window and propagated in sequence, the
//! same way a sliding-window sum constraint decomposes into one bounded-sum constraint per
//! window rather than a single bespoke global propagator.

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::propagators::among::Among;
use crate::propagators::linear::Relation;
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct Sequence {
    pub vars: Vec<VarId>,
    pub window_len: usize,
    pub values: Vec<IntCst>,
    pub min_count: IntCst,
    pub max_count: IntCst,
}

impl Sequence {
    fn windows(&self) -> Vec<Among> {
        if self.window_len == 0 || self.window_len > self.vars.len() {
            return Vec::new();
        }
        self.vars
            .windows(self.window_len)
            .flat_map(|w| {
                [
                    Among { vars: w.to_vec(), values: self.values.clone(), relation: Relation::Ge, constant: self.min_count },
                    Among { vars: w.to_vec(), values: self.values.clone(), relation: Relation::Le, constant: self.max_count },
                ]
            })
            .collect()
    }
}

impl Propagator for Sequence {
    fn variables(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mut state = state.clone();
        for window in self.windows() {
            state = window.propagate(&state)?;
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Sequence"
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
    fn forces_exclusion_when_window_quota_already_met() {
        let state = SolverState::new(vec![Domain::singleton(1, 5), Domain::singleton(1, 5), Domain::full(5)]);
        let p = Sequence {
            vars: vec![vid(0), vid(1), vid(2)],
            window_len: 3,
            values: vec![1],
            min_count: 0,
            max_count: 2,
        };
        let out = p.propagate(&state).unwrap();
        assert!(!out.get_domain(vid(2)).contains(1));
    }

    #[test]
    fn detects_infeasible_window() {
        let state = SolverState::new(vec![Domain::singleton(2, 5), Domain::singleton(2, 5)]);
        let p = Sequence {
            vars: vec![vid(0), vid(1)],
            window_len: 2,
            values: vec![1],
            min_count: 1,
            max_count: 2,
        };
        assert!(p.propagate(&state).is_err());
    }
}

//! `LexLeq`: `[a_0, ..., a_{n-1}] <=_lex [b_0, ..., b_{n-1}]`, propagated position by
//! position: once a prefix is forced strictly less at some position, every later position
//! is unconstrained; otherwise each position is bounded by the other sequence's matching
//! bound, stopping at the first position where the two domains are not both singletons.

use crate::core::VarId;
use crate::error::{Inconsistent, ModelError};
use crate::propagator::Propagator;
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct LexLeq {
    pub a: Vec<VarId>,
    pub b: Vec<VarId>,
}

impl Propagator for LexLeq {
    fn variables(&self) -> Vec<VarId> {
        self.a.iter().chain(self.b.iter()).copied().collect()
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.a.is_empty() || self.b.is_empty() {
            return Err(ModelError::EmptySequence);
        }
        Ok(())
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        assert_eq!(self.a.len(), self.b.len(), "LexLeq requires equal-length sequences");
        let n = self.a.len();
        let mut state = state.clone();

        for i in 0..n {
            let da = state.get_domain(self.a[i]).clone();
            let db = state.get_domain(self.b[i]).clone();
            let a_min = da.min().ok_or(Inconsistent)?;
            let a_max = da.max().ok_or(Inconsistent)?;
            let b_min = db.min().ok_or(Inconsistent)?;
            let b_max = db.max().ok_or(Inconsistent)?;

            if a_max < b_min {
                // prefix is already strictly less at this position, nothing further to enforce.
                return Ok(state);
            }
            if a_min > b_max {
                return Err(Inconsistent);
            }

            // a[i] cannot exceed b's max (else the prefix could only tie or exceed, and a
            // later position could not recover once a[i] > b[i]).
            let mut new_da = da.clone();
            new_da.remove_above(b_max);
            let mut new_db = db.clone();
            new_db.remove_below(a_min);
            let (s, _) = state.set_domain(self.a[i], new_da, false)?;
            state = s;
            let (s, _) = state.set_domain(self.b[i], new_db, false)?;
            state = s;

            let da = state.get_domain(self.a[i]);
            let db = state.get_domain(self.b[i]);
            if !(da.is_singleton() && db.is_singleton() && da.min() == db.min()) {
                // positions are not known-equal yet: stop, since later positions only
                // matter if this one ties exactly.
                break;
            }
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "LexLeq"
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
    fn tightens_first_differing_position() {
        let state = SolverState::new(vec![Domain::interval(1, 10, 10), Domain::singleton(5, 10)]);
        let p = LexLeq { a: vec![vid(0)], b: vec![vid(1)] };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).max(), Some(5));
    }

    #[test]
    fn detects_infeasible_prefix() {
        let state = SolverState::new(vec![Domain::singleton(9, 10), Domain::singleton(3, 10)]);
        let p = LexLeq { a: vec![vid(0)], b: vec![vid(1)] };
        assert!(p.propagate(&state).is_err());
    }
}

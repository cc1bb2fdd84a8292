//! `y = (x mod c)` for a fixed strictly positive integer constant `c`.
//!
//! Domains are one-indexed, so the remainder is reported in `[1..=c]` rather than the
//! conventional `[0..=c-1]`: `remainder(x) = ((x - 1) mod c) + 1`. Full support-based
//! consistency (not just bounds) is cheap here since `c` is typically small.

use crate::core::{IntCst, VarId};
use crate::domain::Domain;
use crate::error::{Inconsistent, ModelError};
use crate::propagator::Propagator;
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct Modulo {
    pub x: VarId,
    pub y: VarId,
    pub c: IntCst,
}

fn remainder(x: IntCst, c: IntCst) -> IntCst {
    ((x - 1).rem_euclid(c)) + 1
}

impl Propagator for Modulo {
    fn variables(&self) -> Vec<VarId> {
        vec![self.x, self.y]
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.c <= 0 {
            return Err(ModelError::NonPositiveDivisor(self.c));
        }
        Ok(())
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let dx = state.get_domain(self.x).clone();
        let dy = state.get_domain(self.y).clone();

        let mut new_dx = Domain::empty(dx.capacity());
        let mut new_dy = Domain::empty(dy.capacity());
        for v in dx.iter() {
            let r = remainder(v, self.c);
            if dy.contains(r) {
                new_dx.insert(v);
                new_dy.insert(r);
            }
        }
        let (state, _) = state.set_domain(self.x, new_dx, false)?;
        let (state, _) = state.set_domain(self.y, new_dy, false)?;
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Modulo"
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
    fn narrows_to_matching_remainders() {
        let state = SolverState::new(vec![Domain::interval(1, 10, 10), Domain::singleton(1, 3)]);
        let p = Modulo { x: vid(0), y: vid(1), c: 3 };
        let out = p.propagate(&state).unwrap();
        // remainder 1 (1-indexed) corresponds to x in {1,4,7,10}
        assert_eq!(out.get_domain(vid(0)).iter().collect::<Vec<_>>(), vec![1, 4, 7, 10]);
    }

    #[test]
    fn inconsistent_when_no_remainder_matches() {
        let state = SolverState::new(vec![Domain::singleton(2, 10), Domain::singleton(1, 3)]);
        let p = Modulo { x: vid(0), y: vid(1), c: 3 };
        assert!(p.propagate(&state).is_err());
    }
}

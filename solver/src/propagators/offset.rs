//! `y = x + c`, propagated on bounds in both directions.

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct Offset {
    pub x: VarId,
    pub y: VarId,
    pub c: IntCst,
}

impl Propagator for Offset {
    fn variables(&self) -> Vec<VarId> {
        vec![self.x, self.y]
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let dx = state.get_domain(self.x).clone();
        let dy = state.get_domain(self.y).clone();

        let mut new_dy = dy.clone();
        new_dy.remove_above(dx.max().unwrap_or(IntCst::MIN) + self.c);
        new_dy.remove_below(dx.min().unwrap_or(IntCst::MAX) + self.c);
        let (state, _) = state.set_domain(self.y, new_dy, false)?;

        let dy = state.get_domain(self.y).clone();
        let mut new_dx = dx;
        new_dx.remove_above(dy.max().unwrap_or(IntCst::MIN) - self.c);
        new_dx.remove_below(dy.min().unwrap_or(IntCst::MAX) - self.c);
        let (state, _) = state.set_domain(self.x, new_dx, false)?;

        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Offset"
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
    fn narrows_both_directions() {
        let state = SolverState::new(vec![Domain::interval(1, 5, 20), Domain::full(20)]);
        let p = Offset { x: vid(0), y: vid(1), c: 10 };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(1)).min(), Some(11));
        assert_eq!(out.get_domain(vid(1)).max(), Some(15));
    }

    #[test]
    fn empty_result_is_inconsistent() {
        let state = SolverState::new(vec![Domain::interval(1, 5, 20), Domain::interval(1, 3, 20)]);
        let p = Offset { x: vid(0), y: vid(1), c: 10 };
        assert!(p.propagate(&state).is_err());
    }
}

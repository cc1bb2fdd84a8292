//! `y = floor(x / c)` for a fixed strictly positive integer constant `c`.

use crate::core::{IntCst, VarId};
use crate::error::{Inconsistent, ModelError};
use crate::propagator::Propagator;
use crate::state::SolverState;
use num_integer::Integer;

#[derive(Debug, Clone)]
pub struct ScaledDivision {
    pub x: VarId,
    pub y: VarId,
    pub c: IntCst,
}

impl Propagator for ScaledDivision {
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

        let (xmin, xmax) = match (dx.min(), dx.max()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(Inconsistent),
        };
        let mut new_dy = dy;
        new_dy.remove_below(xmin.div_floor(&self.c));
        new_dy.remove_above(xmax.div_floor(&self.c));
        let (state, _) = state.set_domain(self.y, new_dy, false)?;

        let dy = state.get_domain(self.y).clone();
        let (ymin, ymax) = match (dy.min(), dy.max()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(Inconsistent),
        };
        let mut new_dx = dx;
        new_dx.remove_below(ymin * self.c);
        new_dx.remove_above(ymax * self.c + self.c - 1);
        let (state, _) = state.set_domain(self.x, new_dx, false)?;

        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "ScaledDivision"
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
    fn narrows_quotient_from_dividend() {
        let state = SolverState::new(vec![Domain::interval(7, 10, 50), Domain::full(50)]);
        let p = ScaledDivision { x: vid(0), y: vid(1), c: 3 };
        let out = p.propagate(&state).unwrap();
        // floor(7/3)=2, floor(10/3)=3
        assert_eq!(out.get_domain(vid(1)).min(), Some(2));
        assert_eq!(out.get_domain(vid(1)).max(), Some(3));
    }

    #[test]
    fn narrows_dividend_from_quotient() {
        let state = SolverState::new(vec![Domain::full(50), Domain::singleton(4, 50)]);
        let p = ScaledDivision { x: vid(0), y: vid(1), c: 3 };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).min(), Some(12));
        assert_eq!(out.get_domain(vid(0)).max(), Some(14));
    }
}

//! `x <= y + c` (or `x < y + c` when `strict`), propagated on bounds.

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct Inequality {
    pub x: VarId,
    pub y: VarId,
    pub c: IntCst,
    pub strict: bool,
}

impl Propagator for Inequality {
    fn variables(&self) -> Vec<VarId> {
        vec![self.x, self.y]
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let margin = if self.strict { 1 } else { 0 };
        let dx = state.get_domain(self.x).clone();
        let dy = state.get_domain(self.y).clone();

        let mut new_dx = dx;
        if let Some(y_max) = dy.max() {
            new_dx.remove_above(y_max + self.c - margin);
        }
        let (state, _) = state.set_domain(self.x, new_dx, false)?;

        let dx = state.get_domain(self.x).clone();
        let mut new_dy = dy;
        if let Some(x_min) = dx.min() {
            new_dy.remove_below(x_min - self.c + margin);
        }
        let (state, _) = state.set_domain(self.y, new_dy, false)?;

        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Inequality"
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
    fn non_strict_allows_equality() {
        let state = SolverState::new(vec![Domain::interval(1, 10, 10), Domain::interval(1, 5, 10)]);
        let p = Inequality { x: vid(0), y: vid(1), c: 0, strict: false };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).max(), Some(5));
    }

    #[test]
    fn strict_excludes_equality() {
        let state = SolverState::new(vec![Domain::singleton(5, 10), Domain::singleton(5, 10)]);
        let p = Inequality { x: vid(0), y: vid(1), c: 0, strict: true };
        assert!(p.propagate(&state).is_err());
    }
}

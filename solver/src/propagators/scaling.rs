//! `y = x * c` for a fixed non-zero integer constant `c`, propagated on bounds.

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;
use num_integer::Integer;

#[derive(Debug, Clone)]
pub struct Scaling {
    pub x: VarId,
    pub y: VarId,
    pub c: IntCst,
}

impl Propagator for Scaling {
    fn variables(&self) -> Vec<VarId> {
        vec![self.x, self.y]
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        assert_ne!(self.c, 0, "Scaling constant must be non-zero");
        let dx = state.get_domain(self.x).clone();
        let dy = state.get_domain(self.y).clone();

        let (xmin, xmax) = match (dx.min(), dx.max()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(Inconsistent),
        };
        let (bound_lo, bound_hi) = if self.c > 0 {
            (xmin * self.c, xmax * self.c)
        } else {
            (xmax * self.c, xmin * self.c)
        };
        let mut new_dy = dy;
        new_dy.remove_below(bound_lo);
        new_dy.remove_above(bound_hi);
        let (state, _) = state.set_domain(self.y, new_dy, false)?;

        let dy = state.get_domain(self.y).clone();
        let (ymin, ymax) = match (dy.min(), dy.max()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(Inconsistent),
        };
        let (xlo, xhi) = if self.c > 0 {
            (ymin.div_ceil(&self.c), ymax.div_floor(&self.c))
        } else {
            (ymax.div_ceil(&self.c), ymin.div_floor(&self.c))
        };
        let mut new_dx = dx;
        new_dx.remove_below(xlo);
        new_dx.remove_above(xhi);
        // Only multiples of `c`'s reciprocal image are reachable; filter out remaining
        // values whose product isn't in range exactly (bounds pruning alone admits some
        // values where x*c lands between integers of dy, which cannot occur since dy is
        // itself integral, but a stray value could still fail to map onto a kept element
        // of dy after the bound tightening above in degenerate cases with |c| > 1).
        if self.c.abs() > 1 {
            let kept: Vec<IntCst> = new_dx.iter().filter(|&v| state.get_domain(self.y).contains(v * self.c)).collect();
            let mut filtered = crate::domain::Domain::empty(new_dx.capacity());
            for v in kept {
                filtered.insert(v);
            }
            new_dx = filtered;
        }
        let (state, _) = state.set_domain(self.x, new_dx, false)?;
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Scaling"
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
    fn positive_constant_narrows_both() {
        let state = SolverState::new(vec![Domain::interval(1, 5, 50), Domain::full(50)]);
        let p = Scaling { x: vid(0), y: vid(1), c: 3 };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(1)).min(), Some(3));
        assert_eq!(out.get_domain(vid(1)).max(), Some(15));
    }

    #[test]
    fn non_multiple_values_pruned_from_x() {
        let state = SolverState::new(vec![Domain::interval(1, 5, 50), Domain::singleton(6, 50)]);
        let p = Scaling { x: vid(0), y: vid(1), c: 3 };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).min(), Some(2));
        assert_eq!(out.get_domain(vid(0)).max(), Some(2));
    }
}

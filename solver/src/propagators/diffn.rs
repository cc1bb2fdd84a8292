//! `Diffn`: the standard name for non-overlap among axis-aligned rectangles, built directly
//! on [`Disjoint2`](super::disjoint::Disjoint2)'s pairwise separation filter.

use crate::core::VarId;
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::propagators::disjoint::{Disjoint2, Rectangle};
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct Diffn {
    pub rectangles: Vec<Rectangle>,
}

impl Propagator for Diffn {
    fn variables(&self) -> Vec<VarId> {
        self.rectangles.iter().flat_map(|r| [r.x, r.y]).collect()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        Disjoint2 {
            rectangles: self.rectangles.clone(),
        }
        .propagate(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Diffn"
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
    fn forbids_fully_overlapping_placement() {
        let state = SolverState::new(vec![
            Domain::singleton(1, 20),
            Domain::singleton(1, 20),
            Domain::singleton(1, 20),
            Domain::singleton(1, 20),
        ]);
        let p = Diffn {
            rectangles: vec![
                Rectangle { x: vid(0), y: vid(1), width: 5, height: 5 },
                Rectangle { x: vid(2), y: vid(3), width: 5, height: 5 },
            ],
        };
        assert!(p.propagate(&state).is_err());
    }
}

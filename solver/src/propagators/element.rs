//! `ElementValues`: `result = values[index]` for a fixed array of constants `values`
//! (1-indexed, matching `index`'s domain convention), propagated by support counting in
//! both directions.

use crate::core::{IntCst, VarId};
use crate::domain::Domain;
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct ElementValues {
    pub index: VarId,
    pub values: Vec<IntCst>,
    pub result: VarId,
}

impl Propagator for ElementValues {
    fn variables(&self) -> Vec<VarId> {
        vec![self.index, self.result]
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let d_index = state.get_domain(self.index).clone();
        let d_result = state.get_domain(self.result).clone();

        let mut new_index = Domain::empty(d_index.capacity());
        let mut new_result = Domain::empty(d_result.capacity());
        for i in d_index.iter() {
            let pos = (i - 1) as usize;
            let Some(&value) = self.values.get(pos) else {
                continue;
            };
            if d_result.contains(value) {
                new_index.insert(i);
                new_result.insert(value);
            }
        }

        let (state, _) = state.clone().set_domain(self.index, new_index, false)?;
        let (state, _) = state.set_domain(self.result, new_result, false)?;
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "ElementValues"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(i: usize) -> VarId {
        VarId::from(i)
    }

    #[test]
    fn narrows_result_to_reachable_values() {
        let state = SolverState::new(vec![Domain::interval(1, 3, 3), Domain::full(50)]);
        let p = ElementValues {
            index: vid(0),
            values: vec![10, 20, 30],
            result: vid(1),
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(1)).iter().collect::<Vec<_>>(), vec![10, 20, 30]);
    }

    #[test]
    fn narrows_index_from_result() {
        let state = SolverState::new(vec![Domain::interval(1, 3, 3), Domain::singleton(20, 50)]);
        let p = ElementValues {
            index: vid(0),
            values: vec![10, 20, 30],
            result: vid(1),
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).iter().collect::<Vec<_>>(), vec![2]);
    }
}

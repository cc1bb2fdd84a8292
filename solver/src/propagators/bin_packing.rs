//! `BinPacking`: item `i` (of fixed weight `weights[i]`) is assigned to bin `bins[i]`
//! (1-indexed), and the total weight of items assigned to each bin must not exceed that
//! bin's `capacity`. Propagated by a load-sum argument: if an item's forced plus already
//! assigned weight would overflow a bin, that bin is removed from the item's domain.

use crate::core::{IntCst, VarId};
use crate::error::{Inconsistent, ModelError};
use crate::propagator::Propagator;
use crate::state::SolverState;
use hashbrown::HashMap;

#[derive(Debug, Clone)]
pub struct BinPacking {
    pub bins: Vec<VarId>,
    pub weights: Vec<IntCst>,
    pub capacities: Vec<IntCst>,
}

impl Propagator for BinPacking {
    fn variables(&self) -> Vec<VarId> {
        self.bins.clone()
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.bins.len() != self.weights.len() {
            return Err(ModelError::CoefficientVariableMismatch {
                coefficients: self.weights.len(),
                variables: self.bins.len(),
            });
        }
        for &cap in &self.capacities {
            if cap < 0 {
                return Err(ModelError::NegativeCapacity(cap));
            }
        }
        Ok(())
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mut forced_load: HashMap<usize, i64> = HashMap::new();
        for (i, &bin_var) in self.bins.iter().enumerate() {
            let d = state.get_domain(bin_var);
            if d.is_singleton() {
                let bin = d.min().unwrap() as usize;
                *forced_load.entry(bin).or_insert(0) += self.weights[i] as i64;
            }
        }
        for (&bin, &load) in &forced_load {
            let cap = self.capacities.get(bin - 1).copied().unwrap_or(0) as i64;
            if load > cap {
                return Err(Inconsistent);
            }
        }

        let mut state = state.clone();
        for (i, &bin_var) in self.bins.iter().enumerate() {
            let d = state.get_domain(bin_var);
            if d.is_singleton() {
                continue;
            }
            let mut new_d = d.clone();
            for candidate in d.iter() {
                let bin = candidate as usize;
                let cap = self.capacities.get(bin - 1).copied().unwrap_or(0) as i64;
                let already = forced_load.get(&bin).copied().unwrap_or(0);
                if already + self.weights[i] as i64 > cap {
                    new_d.remove(candidate);
                }
            }
            if new_d.is_empty() {
                return Err(Inconsistent);
            }
            let (s, _) = state.set_domain(bin_var, new_d, false)?;
            state = s;
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "BinPacking"
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
    fn removes_overcapacity_bin_choices() {
        // bin 1 has capacity 5. item 0 (weight 5) is forced into bin 1, filling it.
        // item 1 (weight 1) cannot also go into bin 1.
        let state = SolverState::new(vec![Domain::singleton(1, 2), Domain::interval(1, 2, 2)]);
        let p = BinPacking {
            bins: vec![vid(0), vid(1)],
            weights: vec![5, 1],
            capacities: vec![5, 10],
        };
        let out = p.propagate(&state).unwrap();
        assert!(!out.get_domain(vid(1)).contains(1));
        assert!(out.get_domain(vid(1)).contains(2));
    }

    #[test]
    fn detects_forced_overflow() {
        let state = SolverState::new(vec![Domain::singleton(1, 2), Domain::singleton(1, 2)]);
        let p = BinPacking {
            bins: vec![vid(0), vid(1)],
            weights: vec![5, 5],
            capacities: vec![6, 10],
        };
        assert!(p.propagate(&state).is_err());
    }
}

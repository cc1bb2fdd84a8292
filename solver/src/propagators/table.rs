//! Extensional constraint: each allowed tuple is a row of values, one per variable in
//! `vars`, and only domain values that appear in at least one surviving tuple (a tuple
//! whose other positions are all still supported) are kept — generalized arc consistency
//! by direct support counting.

use crate::core::{IntCst, VarId};
use crate::domain::Domain;
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct Table {
    pub vars: Vec<VarId>,
    pub tuples: Vec<Vec<IntCst>>,
}

impl Propagator for Table {
    fn variables(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let domains: Vec<Domain> = self.vars.iter().map(|&v| state.get_domain(v).clone()).collect();

        let surviving: Vec<&Vec<IntCst>> = self
            .tuples
            .iter()
            .filter(|tuple| tuple.iter().zip(&domains).all(|(&val, d)| d.contains(val)))
            .collect();
        if surviving.is_empty() {
            return Err(Inconsistent);
        }

        let mut new_domains: Vec<Domain> = domains.iter().map(|d| Domain::empty(d.capacity())).collect();
        for tuple in &surviving {
            for (i, &val) in tuple.iter().enumerate() {
                new_domains[i].insert(val);
            }
        }

        let mut state = state.clone();
        for (i, &var) in self.vars.iter().enumerate() {
            if new_domains[i].is_empty() {
                return Err(Inconsistent);
            }
            let (s, _) = state.set_domain(var, new_domains[i].clone(), false)?;
            state = s;
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Table"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(i: usize) -> VarId {
        VarId::from(i)
    }

    #[test]
    fn keeps_only_values_appearing_in_a_live_tuple() {
        let state = SolverState::new(vec![Domain::full(3), Domain::full(3)]);
        let p = Table {
            vars: vec![vid(0), vid(1)],
            tuples: vec![vec![1, 2], vec![2, 3]],
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(out.get_domain(vid(1)).iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn prior_restriction_can_eliminate_all_tuples() {
        let state = SolverState::new(vec![Domain::singleton(1, 3), Domain::singleton(3, 3)]);
        let p = Table {
            vars: vec![vid(0), vid(1)],
            tuples: vec![vec![1, 2], vec![2, 3]],
        };
        assert!(p.propagate(&state).is_err());
    }
}

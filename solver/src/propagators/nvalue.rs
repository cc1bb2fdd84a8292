//! `NValue`: the number of distinct values taken by `vars` satisfies `REL constant`. This
//! is a bounds-only generalization of [`AllDifferent`](super::all_different::AllDifferent)'s
//! matching argument: it tracks how many values are *already forced* distinct and how many
//! values could *possibly* still be used, without running a full matching/flow argument
//! for this more permissive constraint.

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::propagators::linear::Relation;
use crate::state::SolverState;
use hashbrown::HashSet;

#[derive(Debug, Clone)]
pub struct NValue {
    pub vars: Vec<VarId>,
    pub relation: Relation,
    pub constant: IntCst,
}

impl Propagator for NValue {
    fn variables(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mut forced_values: HashSet<IntCst> = HashSet::new();
        let mut union_values: HashSet<IntCst> = HashSet::new();
        for &v in &self.vars {
            let d = state.get_domain(v);
            if d.is_singleton() {
                forced_values.insert(d.min().unwrap());
            }
            for val in d.iter() {
                union_values.insert(val);
            }
        }
        let min_nvalue = forced_values.len() as i64;
        let max_nvalue = (union_values.len() as i64).min(self.vars.len() as i64);
        let constant = self.constant as i64;

        match self.relation {
            Relation::Le => {
                if min_nvalue > constant {
                    return Err(Inconsistent);
                }
            }
            Relation::Ge => {
                if max_nvalue < constant {
                    return Err(Inconsistent);
                }
            }
            Relation::Eq => {
                if min_nvalue > constant || max_nvalue < constant {
                    return Err(Inconsistent);
                }
            }
        }

        let must_reuse_forced_values = match self.relation {
            Relation::Le | Relation::Eq => min_nvalue == constant,
            Relation::Ge => false,
        };

        let mut state = state.clone();
        if must_reuse_forced_values {
            for &v in &self.vars {
                let d = state.get_domain(v);
                if d.is_singleton() {
                    continue;
                }
                let mut new_d = d.clone();
                for val in d.iter() {
                    if !forced_values.contains(&val) {
                        new_d.remove(val);
                    }
                }
                if new_d.is_empty() {
                    return Err(Inconsistent);
                }
                let (s, _) = state.set_domain(v, new_d, false)?;
                state = s;
            }
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "NValue"
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
    fn restricts_to_already_forced_values_once_quota_met() {
        let state = SolverState::new(vec![Domain::singleton(2, 5), Domain::full(5), Domain::full(5)]);
        let p = NValue {
            vars: vec![vid(0), vid(1), vid(2)],
            relation: Relation::Eq,
            constant: 1,
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(1)).iter().collect::<Vec<_>>(), vec![2]);
        assert_eq!(out.get_domain(vid(2)).iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn detects_unreachable_minimum_distinct_count() {
        let state = SolverState::new(vec![Domain::singleton(1, 5), Domain::singleton(1, 5)]);
        let p = NValue {
            vars: vec![vid(0), vid(1)],
            relation: Relation::Ge,
            constant: 2,
        };
        assert!(p.propagate(&state).is_err());
    }
}

//! `count(vars that are true) REL constant`, a specialised, cheaper `LinearSum` over
//! reified booleans that avoids going through `IntCst` coefficients entirely.

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::propagators::linear::Relation;
use crate::reif::{BOOL_FALSE, BOOL_TRUE};
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct BoolSum {
    pub vars: Vec<VarId>,
    pub relation: Relation,
    pub constant: IntCst,
}

impl Propagator for BoolSum {
    fn variables(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mut forced_true = 0usize;
        let mut undetermined = Vec::new();
        for &v in &self.vars {
            let d = state.get_domain(v);
            let can_true = d.contains(BOOL_TRUE);
            let can_false = d.contains(BOOL_FALSE);
            if !can_true && !can_false {
                return Err(Inconsistent);
            }
            if can_true && !can_false {
                forced_true += 1;
            } else if can_true && can_false {
                undetermined.push(v);
            }
        }
        let min_true = forced_true as i64;
        let max_true = (forced_true + undetermined.len()) as i64;
        let constant = self.constant as i64;

        let needs_all_undetermined_false = match self.relation {
            Relation::Le => min_true == constant,
            Relation::Eq => min_true == constant,
            Relation::Ge => false,
        };
        let needs_all_undetermined_true = match self.relation {
            Relation::Ge => max_true == constant,
            Relation::Eq => max_true == constant,
            Relation::Le => false,
        };
        match self.relation {
            Relation::Le => {
                if min_true > constant {
                    return Err(Inconsistent);
                }
            }
            Relation::Ge => {
                if max_true < constant {
                    return Err(Inconsistent);
                }
            }
            Relation::Eq => {
                if min_true > constant || max_true < constant {
                    return Err(Inconsistent);
                }
            }
        }

        let mut state = state.clone();
        if needs_all_undetermined_false && needs_all_undetermined_true {
            // Both can't hold unless there are no undetermined vars left.
            if !undetermined.is_empty() {
                return Err(Inconsistent);
            }
        } else if needs_all_undetermined_false {
            for v in undetermined {
                let cap = state.get_domain(v).capacity();
                let (s, _) = state.set_domain(v, crate::domain::Domain::singleton(BOOL_FALSE, cap), false)?;
                state = s;
            }
        } else if needs_all_undetermined_true {
            for v in undetermined {
                let cap = state.get_domain(v).capacity();
                let (s, _) = state.set_domain(v, crate::domain::Domain::singleton(BOOL_TRUE, cap), false)?;
                state = s;
            }
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "BoolSum"
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
    fn exact_count_forces_remaining_false() {
        let state = SolverState::new(vec![
            Domain::singleton(BOOL_TRUE, 2),
            Domain::full(2),
            Domain::full(2),
        ]);
        let p = BoolSum {
            vars: vec![vid(0), vid(1), vid(2)],
            relation: Relation::Eq,
            constant: 1,
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(1)).min(), Some(BOOL_FALSE));
        assert_eq!(out.get_domain(vid(1)).max(), Some(BOOL_FALSE));
        assert_eq!(out.get_domain(vid(2)).max(), Some(BOOL_FALSE));
    }

    #[test]
    fn too_few_possible_trues_is_inconsistent() {
        let state = SolverState::new(vec![Domain::singleton(BOOL_FALSE, 2), Domain::singleton(BOOL_FALSE, 2)]);
        let p = BoolSum {
            vars: vec![vid(0), vid(1)],
            relation: Relation::Ge,
            constant: 1,
        };
        assert!(p.propagate(&state).is_err());
    }
}

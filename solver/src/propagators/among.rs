//! `Among`: the number of variables in `vars` whose value lands in `values` satisfies
//! `REL constant`. `Count` is the single-value specialization of this constraint.

use crate::core::{IntCst, VarId};
use crate::domain::Domain;
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::propagators::linear::Relation;
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct Among {
    pub vars: Vec<VarId>,
    pub values: Vec<IntCst>,
    pub relation: Relation,
    pub constant: IntCst,
}

fn overlaps(d: &Domain, values: &[IntCst]) -> bool {
    values.iter().any(|&v| d.contains(v))
}

fn subset_of(d: &Domain, values: &[IntCst]) -> bool {
    d.iter().all(|v| values.contains(&v))
}

fn remove_values(d: &mut Domain, values: &[IntCst]) {
    for &v in values {
        d.remove(v);
    }
}

fn restrict_to_values(d: &Domain, values: &[IntCst]) -> Domain {
    let mut out = Domain::empty(d.capacity());
    for v in d.iter() {
        if values.contains(&v) {
            out.insert(v);
        }
    }
    out
}

impl Propagator for Among {
    fn variables(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mut forced_in = 0i64;
        let mut undetermined = Vec::new();
        for &v in &self.vars {
            let d = state.get_domain(v);
            let can_be_in = overlaps(d, &self.values);
            let forced_member = subset_of(d, &self.values);
            if forced_member {
                forced_in += 1;
            } else if can_be_in {
                undetermined.push(v);
            }
        }
        let min_count = forced_in;
        let max_count = forced_in + undetermined.len() as i64;
        let constant = self.constant as i64;

        match self.relation {
            Relation::Le => {
                if min_count > constant {
                    return Err(Inconsistent);
                }
            }
            Relation::Ge => {
                if max_count < constant {
                    return Err(Inconsistent);
                }
            }
            Relation::Eq => {
                if min_count > constant || max_count < constant {
                    return Err(Inconsistent);
                }
            }
        }

        let force_exclude = match self.relation {
            Relation::Le | Relation::Eq => min_count == constant,
            Relation::Ge => false,
        };
        let force_include = match self.relation {
            Relation::Ge | Relation::Eq => max_count == constant,
            Relation::Le => false,
        };

        let mut state = state.clone();
        if force_exclude && force_include {
            if !undetermined.is_empty() {
                return Err(Inconsistent);
            }
        } else if force_exclude {
            for v in undetermined {
                let mut d = state.get_domain(v).clone();
                remove_values(&mut d, &self.values);
                let (s, _) = state.set_domain(v, d, false)?;
                state = s;
            }
        } else if force_include {
            for v in undetermined {
                let d = state.get_domain(v).clone();
                let restricted = restrict_to_values(&d, &self.values);
                let (s, _) = state.set_domain(v, restricted, false)?;
                state = s;
            }
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Among"
    }
}

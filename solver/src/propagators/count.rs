//! `Count`: the number of variables in `vars` equal to `value` satisfies `REL constant`,
//! the single-value specialization of [`Among`](super::among::Among).

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::propagators::among::Among;
use crate::propagators::linear::Relation;
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct Count {
    pub vars: Vec<VarId>,
    pub value: IntCst,
    pub relation: Relation,
    pub constant: IntCst,
}

impl Count {
    fn as_among(&self) -> Among {
        Among {
            vars: self.vars.clone(),
            values: vec![self.value],
            relation: self.relation,
            constant: self.constant,
        }
    }
}

impl Propagator for Count {
    fn variables(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        self.as_among().propagate(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Count"
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
    fn forces_remaining_off_value_once_quota_met() {
        let state = SolverState::new(vec![Domain::singleton(7, 10), Domain::full(10)]);
        let p = Count {
            vars: vec![vid(0), vid(1)],
            value: 7,
            relation: Relation::Eq,
            constant: 1,
        };
        let out = p.propagate(&state).unwrap();
        assert!(!out.get_domain(vid(1)).contains(7));
    }
}

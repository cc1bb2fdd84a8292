//! Reification: tying a boolean variable to the truth value of another constraint.
//!
//! The general mechanism ([`ReifiedConstraint`]) wraps any [`Reifiable`] propagator with a
//! boolean "half-reification" in both directions: when the boolean is fixed, the wrapped
//! constraint (or its negation) propagates as usual; when the wrapped constraint becomes
//! entailed or disentailed on its own, the boolean gets fixed in turn. The three eager
//! forms below skip the generic dispatch for the common cases where a direct propagator is
//! cheap to write by hand.

use crate::core::{IntCst, VarId};
use crate::domain::Domain;
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;

/// Reified boolean `false`.
pub const BOOL_FALSE: IntCst = 1;
/// Reified boolean `true`.
pub const BOOL_TRUE: IntCst = 2;

fn bool_value(state: &SolverState, b: VarId) -> Option<bool> {
    let d = state.get_domain(b);
    if d.contains(BOOL_TRUE) && !d.contains(BOOL_FALSE) {
        Some(true)
    } else if d.contains(BOOL_FALSE) && !d.contains(BOOL_TRUE) {
        Some(false)
    } else {
        None
    }
}

fn force_bool(state: &SolverState, b: VarId, value: bool, detect: bool) -> Result<(SolverState, bool), Inconsistent> {
    let cap = state.get_domain(b).capacity();
    let target = if value {
        Domain::singleton(BOOL_TRUE, cap)
    } else {
        Domain::singleton(BOOL_FALSE, cap)
    };
    state.set_domain(b, state.get_domain(b).intersect(&target), detect)
}

/// A propagator that additionally knows its own negation and whether it is currently
/// entailed, disentailed, or undetermined by a state. Required to build a generic
/// [`ReifiedConstraint`] around it.
pub trait Reifiable: Propagator {
    /// A propagator equivalent to "not this constraint".
    fn negated(&self) -> Box<dyn Propagator>;

    /// `Some(true)` if the constraint necessarily holds given `state`, `Some(false)` if it
    /// necessarily doesn't, `None` if it depends on not-yet-fixed variables.
    fn entailment(&self, state: &SolverState) -> Option<bool>;
}

/// Ties `bool_var` to "the wrapped constraint holds".
pub struct ReifiedConstraint<P> {
    inner: P,
    negated: Box<dyn Propagator>,
    bool_var: VarId,
}

impl<P: Clone> Clone for ReifiedConstraint<P> {
    fn clone(&self) -> Self {
        ReifiedConstraint {
            inner: self.inner.clone(),
            negated: self.negated.clone_box(),
            bool_var: self.bool_var,
        }
    }
}

impl<P> std::fmt::Debug for ReifiedConstraint<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReifiedConstraint(bool_var={:?})", self.bool_var)
    }
}

impl<P: Reifiable + Clone + 'static> ReifiedConstraint<P> {
    pub fn new(inner: P, bool_var: VarId) -> Self {
        let negated = inner.negated();
        ReifiedConstraint {
            inner,
            negated,
            bool_var,
        }
    }
}

impl<P: Reifiable + Clone + 'static> Propagator for ReifiedConstraint<P> {
    fn variables(&self) -> Vec<VarId> {
        let mut vars = self.inner.variables();
        vars.push(self.bool_var);
        vars
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        match bool_value(state, self.bool_var) {
            Some(true) => self.inner.propagate(state),
            Some(false) => self.negated.propagate(state),
            None => match self.inner.entailment(state) {
                Some(true) => Ok(force_bool(state, self.bool_var, true, false)?.0),
                Some(false) => Ok(force_bool(state, self.bool_var, false, false)?.0),
                None => Ok(state.clone()),
            },
        }
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "ReifiedConstraint"
    }
}

/// `b <=> (x == y)`.
#[derive(Clone, Debug)]
pub struct EqualityReified {
    pub x: VarId,
    pub y: VarId,
    pub b: VarId,
}

impl Propagator for EqualityReified {
    fn variables(&self) -> Vec<VarId> {
        vec![self.x, self.y, self.b]
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let dx = state.get_domain(self.x).clone();
        let dy = state.get_domain(self.y).clone();
        match bool_value(state, self.b) {
            Some(true) => {
                let merged = dx.intersect(&dy);
                let (s, _) = state.set_domain(self.x, merged.clone(), false)?;
                let (s, _) = s.set_domain(self.y, merged, false)?;
                Ok(s)
            }
            Some(false) => {
                if dx.is_singleton() && dy.is_singleton() && dx == dy {
                    return Err(Inconsistent);
                }
                if let Some(v) = dx.min().filter(|_| dx.is_singleton()) {
                    if dy.contains(v) {
                        let mut d = dy;
                        d.remove(v);
                        return Ok(state.set_domain(self.y, d, false)?.0);
                    }
                }
                if let Some(v) = dy.min().filter(|_| dy.is_singleton()) {
                    if dx.contains(v) {
                        let mut d = dx;
                        d.remove(v);
                        return Ok(state.set_domain(self.x, d, false)?.0);
                    }
                }
                Ok(state.clone())
            }
            None => {
                if dx.intersect(&dy).is_empty() {
                    Ok(force_bool(state, self.b, false, false)?.0)
                } else if dx.is_singleton() && dy.is_singleton() && dx == dy {
                    Ok(force_bool(state, self.b, true, false)?.0)
                } else {
                    Ok(state.clone())
                }
            }
        }
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "EqualityReified"
    }
}

/// `b <=> (x == value)`.
#[derive(Clone, Debug)]
pub struct ValueEqualsReified {
    pub x: VarId,
    pub value: IntCst,
    pub b: VarId,
}

impl Propagator for ValueEqualsReified {
    fn variables(&self) -> Vec<VarId> {
        vec![self.x, self.b]
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let dx = state.get_domain(self.x).clone();
        match bool_value(state, self.b) {
            Some(true) => {
                let cap = dx.capacity();
                Ok(state.set_domain(self.x, Domain::singleton(self.value, cap), false)?.0)
            }
            Some(false) => {
                if dx.contains(self.value) && dx.is_singleton() {
                    return Err(Inconsistent);
                }
                if dx.contains(self.value) {
                    let mut d = dx;
                    d.remove(self.value);
                    Ok(state.set_domain(self.x, d, false)?.0)
                } else {
                    Ok(state.clone())
                }
            }
            None => {
                if !dx.contains(self.value) {
                    Ok(force_bool(state, self.b, false, false)?.0)
                } else if dx.is_singleton() {
                    Ok(force_bool(state, self.b, true, false)?.0)
                } else {
                    Ok(state.clone())
                }
            }
        }
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "ValueEqualsReified"
    }
}

/// `b <=> (x in values)`.
#[derive(Clone, Debug)]
pub struct InSetReified {
    pub x: VarId,
    pub values: Vec<IntCst>,
    pub b: VarId,
}

impl Propagator for InSetReified {
    fn variables(&self) -> Vec<VarId> {
        vec![self.x, self.b]
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let dx = state.get_domain(self.x).clone();
        let cap = dx.capacity();
        let mut set_domain = Domain::empty(cap);
        for &v in &self.values {
            set_domain.insert(v);
        }
        match bool_value(state, self.b) {
            Some(true) => Ok(state.set_domain(self.x, dx.intersect(&set_domain), false)?.0),
            Some(false) => {
                let mut d = dx.clone();
                for &v in &self.values {
                    d.remove(v);
                }
                if d.is_empty() {
                    return Err(Inconsistent);
                }
                Ok(state.set_domain(self.x, d, false)?.0)
            }
            None => {
                let overlap = dx.intersect(&set_domain);
                if overlap.is_empty() {
                    Ok(force_bool(state, self.b, false, false)?.0)
                } else if overlap == dx {
                    Ok(force_bool(state, self.b, true, false)?.0)
                } else {
                    Ok(state.clone())
                }
            }
        }
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "InSetReified"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VarId;

    fn vid(i: usize) -> VarId {
        VarId::from(i)
    }

    #[test]
    fn value_equals_reified_forces_bool_when_singleton() {
        let state = SolverState::new(vec![Domain::singleton(4, 10), Domain::full(10)]);
        let p = ValueEqualsReified {
            x: vid(0),
            value: 4,
            b: vid(1),
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(bool_value(&out, vid(1)), Some(true));
    }

    #[test]
    fn value_equals_reified_narrows_x_when_bool_true() {
        let state = SolverState::new(vec![Domain::full(10), Domain::singleton(BOOL_TRUE, 2)]);
        let p = ValueEqualsReified {
            x: vid(0),
            value: 7,
            b: vid(1),
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).min(), Some(7));
        assert_eq!(out.get_domain(vid(0)).max(), Some(7));
    }

    #[test]
    fn in_set_reified_forces_false_on_disjoint() {
        let state = SolverState::new(vec![Domain::interval(1, 3, 10), Domain::full(10)]);
        let p = InSetReified {
            x: vid(0),
            values: vec![7, 8, 9],
            b: vid(1),
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(bool_value(&out, vid(1)), Some(false));
    }
}

//! `sum(coef_i * x_i) REL constant` for `REL` in `{<=, >=, ==}`, propagated on bounds.
//!
//! Bounds are accumulated in `i64` to avoid overflow across long sums of moderate-size
//! domains, matching the saturating-arithmetic discipline the teacher's own linear
//! propagator uses against its integer-constant bounds.

use crate::core::{IntCst, VarId};
use crate::domain::Domain;
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone)]
pub struct LinearSum {
    /// `(coefficient, variable)` pairs; zero coefficients are allowed and simply ignored.
    pub terms: Vec<(IntCst, VarId)>,
    pub relation: Relation,
    pub constant: IntCst,
}

struct TermBounds {
    min: i64,
    max: i64,
}

fn term_bounds(coef: IntCst, domain: &Domain) -> Option<TermBounds> {
    let (lo, hi) = (domain.min()? as i64, domain.max()? as i64);
    let c = coef as i64;
    if c >= 0 {
        Some(TermBounds { min: c * lo, max: c * hi })
    } else {
        Some(TermBounds { min: c * hi, max: c * lo })
    }
}

fn clamp_to_cst(v: i64) -> IntCst {
    v.clamp(IntCst::MIN as i64, IntCst::MAX as i64) as IntCst
}

/// Floor division for a strictly positive divisor.
fn floor_div(a: i64, b: i64) -> i64 {
    debug_assert!(b > 0);
    a.div_euclid(b)
}

/// Ceiling division for a strictly positive divisor.
fn ceil_div(a: i64, b: i64) -> i64 {
    debug_assert!(b > 0);
    let q = a.div_euclid(b);
    if a.rem_euclid(b) == 0 {
        q
    } else {
        q + 1
    }
}

impl LinearSum {
    /// Narrows each variable so that `coef_i * var_i <= upper_target - sum_of_others_min`.
    fn tighten_upper(&self, state: SolverState, sum_min: i64, term_mins: &[i64], upper_target: i64) -> Result<SolverState, Inconsistent> {
        let mut state = state;
        for (i, &(coef, var)) in self.terms.iter().enumerate() {
            if coef == 0 {
                continue;
            }
            let others_min = sum_min - term_mins[i];
            let allowed = upper_target - others_min;
            let mut new_d = state.get_domain(var).clone();
            if coef > 0 {
                new_d.remove_above(clamp_to_cst(floor_div(allowed, coef as i64)));
            } else {
                let k = -(coef as i64);
                new_d.remove_below(clamp_to_cst(ceil_div(-allowed, k)));
            }
            let (s, _) = state.set_domain(var, new_d, false)?;
            state = s;
        }
        Ok(state)
    }

    /// Narrows each variable so that `coef_i * var_i >= lower_target - sum_of_others_max`.
    fn tighten_lower(&self, state: SolverState, sum_max: i64, term_maxs: &[i64], lower_target: i64) -> Result<SolverState, Inconsistent> {
        let mut state = state;
        for (i, &(coef, var)) in self.terms.iter().enumerate() {
            if coef == 0 {
                continue;
            }
            let others_max = sum_max - term_maxs[i];
            let needed = lower_target - others_max;
            let mut new_d = state.get_domain(var).clone();
            if coef > 0 {
                new_d.remove_below(clamp_to_cst(ceil_div(needed, coef as i64)));
            } else {
                let k = -(coef as i64);
                new_d.remove_above(clamp_to_cst(floor_div(-needed, k)));
            }
            let (s, _) = state.set_domain(var, new_d, false)?;
            state = s;
        }
        Ok(state)
    }
}

impl Propagator for LinearSum {
    fn variables(&self) -> Vec<VarId> {
        self.terms.iter().map(|(_, v)| *v).collect()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mut term_mins = Vec::with_capacity(self.terms.len());
        let mut term_maxs = Vec::with_capacity(self.terms.len());
        let mut sum_min: i64 = 0;
        let mut sum_max: i64 = 0;
        for &(coef, var) in &self.terms {
            let d = state.get_domain(var);
            let b = term_bounds(coef, d).ok_or(Inconsistent)?;
            sum_min += b.min;
            sum_max += b.max;
            term_mins.push(b.min);
            term_maxs.push(b.max);
        }
        let constant = self.constant as i64;

        let mut state = state.clone();
        match self.relation {
            Relation::Le => {
                if sum_min > constant {
                    return Err(Inconsistent);
                }
                state = self.tighten_upper(state, sum_min, &term_mins, constant)?;
            }
            Relation::Ge => {
                if sum_max < constant {
                    return Err(Inconsistent);
                }
                state = self.tighten_lower(state, sum_max, &term_maxs, constant)?;
            }
            Relation::Eq => {
                if sum_min > constant || sum_max < constant {
                    return Err(Inconsistent);
                }
                state = self.tighten_upper(state, sum_min, &term_mins, constant)?;
                state = self.tighten_lower(state, sum_max, &term_maxs, constant)?;
            }
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "LinearSum"
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
    fn equality_narrows_both_variables() {
        // x + y = 10, x in [1,8], y in [1,8] -> x in [2,9]∩[1,8], y symmetric
        let state = SolverState::new(vec![Domain::interval(1, 8, 20), Domain::interval(1, 8, 20)]);
        let p = LinearSum {
            terms: vec![(1, vid(0)), (1, vid(1))],
            relation: Relation::Eq,
            constant: 10,
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).min(), Some(2));
        assert_eq!(out.get_domain(vid(1)).min(), Some(2));
    }

    #[test]
    fn negative_coefficient() {
        // x - y = 3 i.e. x + (-1)*y = 3, x in [1,20], y in [1,5]
        let state = SolverState::new(vec![Domain::interval(1, 20, 20), Domain::interval(1, 5, 20)]);
        let p = LinearSum {
            terms: vec![(1, vid(0)), (-1, vid(1))],
            relation: Relation::Eq,
            constant: 3,
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).min(), Some(4));
        assert_eq!(out.get_domain(vid(0)).max(), Some(8));
    }

    #[test]
    fn infeasible_bound_detected() {
        let state = SolverState::new(vec![Domain::interval(5, 10, 20), Domain::interval(5, 10, 20)]);
        let p = LinearSum {
            terms: vec![(1, vid(0)), (1, vid(1))],
            relation: Relation::Le,
            constant: 5,
        };
        assert!(p.propagate(&state).is_err());
    }
}

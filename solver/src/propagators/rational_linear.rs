//! `sum(coef_i * x_i) REL constant` with rational coefficients and constant.
//!
//! Coefficients and the constant are scaled to a common denominator (their LCM) and
//! delegated to the integer [`LinearSum`] propagator, exactly as a caller would hand-scale
//! a rational constraint before handing it to an integer solver: `num-rational`/
//! `num-integer` supply the exact arithmetic (`Ratio::denom`, `lcm`) needed to do this
//! without introducing rounding error.

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::propagators::linear::{LinearSum, Relation};
use crate::state::SolverState;
use num_integer::Integer;
use num_rational::Ratio;

#[derive(Debug, Clone)]
pub struct RationalLinearSum {
    pub terms: Vec<(Ratio<i64>, VarId)>,
    pub relation: Relation,
    pub constant: Ratio<i64>,
}

impl RationalLinearSum {
    /// Scales every coefficient and the constant by the LCM of all denominators, producing
    /// an equivalent integer [`LinearSum`]. Panics if the scaled coefficients overflow
    /// `IntCst`, which would indicate a pathologically ill-conditioned constraint.
    fn to_integer_linear(&self) -> LinearSum {
        let mut denom_lcm: i64 = *self.constant.denom();
        for (coef, _) in &self.terms {
            denom_lcm = denom_lcm.lcm(coef.denom());
        }
        let terms = self
            .terms
            .iter()
            .map(|(coef, v)| {
                let scaled = coef * Ratio::from_integer(denom_lcm);
                debug_assert!(scaled.is_integer());
                (scaled.to_integer() as IntCst, *v)
            })
            .collect();
        let scaled_constant = self.constant * Ratio::from_integer(denom_lcm);
        debug_assert!(scaled_constant.is_integer());
        LinearSum {
            terms,
            relation: self.relation,
            constant: scaled_constant.to_integer() as IntCst,
        }
    }
}

impl Propagator for RationalLinearSum {
    fn variables(&self) -> Vec<VarId> {
        self.terms.iter().map(|(_, v)| *v).collect()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        self.to_integer_linear().propagate(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "RationalLinearSum"
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
    fn half_coefficients_scale_to_integers() {
        // (1/2)x + (1/2)y = 5  <=>  x + y = 10
        let state = SolverState::new(vec![Domain::interval(1, 8, 20), Domain::interval(1, 8, 20)]);
        let p = RationalLinearSum {
            terms: vec![(Ratio::new(1, 2), vid(0)), (Ratio::new(1, 2), vid(1))],
            relation: Relation::Eq,
            constant: Ratio::from_integer(5),
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).min(), Some(2));
    }
}

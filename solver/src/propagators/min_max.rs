//! `MinOf`/`MaxOf`: `result = min(vars)` / `result = max(vars)`, propagated bidirectionally
//! between `result` and every member of `vars`.

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;

#[derive(Debug, Clone)]
pub struct MinOf {
    pub vars: Vec<VarId>,
    pub result: VarId,
}

impl Propagator for MinOf {
    fn variables(&self) -> Vec<VarId> {
        let mut vs = self.vars.clone();
        vs.push(self.result);
        vs
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mins: Vec<IntCst> = self.vars.iter().map(|&v| state.get_domain(v).min().ok_or(Inconsistent)).collect::<Result<_, _>>()?;
        let maxs: Vec<IntCst> = self.vars.iter().map(|&v| state.get_domain(v).max().ok_or(Inconsistent)).collect::<Result<_, _>>()?;
        let lower = *mins.iter().min().unwrap();
        let upper = *maxs.iter().min().unwrap();

        let mut state = state.clone();
        let mut new_result = state.get_domain(self.result).clone();
        new_result.remove_below(lower);
        new_result.remove_above(upper);
        let (s, _) = state.set_domain(self.result, new_result, false)?;
        state = s;

        for &v in &self.vars {
            let mut d = state.get_domain(v).clone();
            d.remove_below(state.get_domain(self.result).min().ok_or(Inconsistent)?);
            let (s, _) = state.set_domain(v, d, false)?;
            state = s;
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "MinOf"
    }
}

#[derive(Debug, Clone)]
pub struct MaxOf {
    pub vars: Vec<VarId>,
    pub result: VarId,
}

impl Propagator for MaxOf {
    fn variables(&self) -> Vec<VarId> {
        let mut vs = self.vars.clone();
        vs.push(self.result);
        vs
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mins: Vec<IntCst> = self.vars.iter().map(|&v| state.get_domain(v).min().ok_or(Inconsistent)).collect::<Result<_, _>>()?;
        let maxs: Vec<IntCst> = self.vars.iter().map(|&v| state.get_domain(v).max().ok_or(Inconsistent)).collect::<Result<_, _>>()?;
        let lower = *mins.iter().max().unwrap();
        let upper = *maxs.iter().max().unwrap();

        let mut state = state.clone();
        let mut new_result = state.get_domain(self.result).clone();
        new_result.remove_below(lower);
        new_result.remove_above(upper);
        let (s, _) = state.set_domain(self.result, new_result, false)?;
        state = s;

        for &v in &self.vars {
            let mut d = state.get_domain(v).clone();
            d.remove_above(state.get_domain(self.result).max().ok_or(Inconsistent)?);
            let (s, _) = state.set_domain(v, d, false)?;
            state = s;
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "MaxOf"
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
    fn min_of_narrows_result_bounds() {
        let state = SolverState::new(vec![Domain::interval(3, 8, 10), Domain::interval(5, 9, 10), Domain::full(10)]);
        let p = MinOf { vars: vec![vid(0), vid(1)], result: vid(2) };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(2)).min(), Some(3));
        assert_eq!(out.get_domain(vid(2)).max(), Some(8));
    }

    #[test]
    fn max_of_narrows_members_from_result() {
        let state = SolverState::new(vec![Domain::interval(1, 10, 10), Domain::interval(1, 10, 10), Domain::singleton(4, 10)]);
        let p = MaxOf { vars: vec![vid(0), vid(1)], result: vid(2) };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).max(), Some(4));
        assert_eq!(out.get_domain(vid(1)).max(), Some(4));
    }
}

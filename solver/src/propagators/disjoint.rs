//! Supplemented pairwise disjointness constraints: `Disjoint1` for one-dimensional
//! intervals and `Disjoint2` for axis-aligned rectangles, via direct "not-first/not-last"
//! precedence reasoning between each pair rather than the resource time-tabling
//! [`Cumulative`](super::cumulative::Cumulative) uses — appropriate here since there is no
//! shared resource capacity to reason about, only geometric non-overlap.

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;

#[derive(Debug, Clone, Copy)]
pub struct Interval {
    pub start: VarId,
    pub length: IntCst,
}

/// Enforces that two one-dimensional intervals, each `[start, start+length)`, do not
/// overlap: `end_a <= start_b` or `end_b <= start_a`.
fn separate_pair(state: SolverState, a: Interval, b: Interval) -> Result<SolverState, Inconsistent> {
    let da = state.get_domain(a.start).clone();
    let db = state.get_domain(b.start).clone();
    let (a_min, a_max) = (da.min().ok_or(Inconsistent)?, da.max().ok_or(Inconsistent)?);
    let (b_min, b_max) = (db.min().ok_or(Inconsistent)?, db.max().ok_or(Inconsistent)?);

    let a_before_b_possible = a_min + a.length <= b_max;
    let b_before_a_possible = b_min + b.length <= a_max;

    if !a_before_b_possible && !b_before_a_possible {
        return Err(Inconsistent);
    }

    let mut state = state;
    if !a_before_b_possible {
        // b must come before a: b.start + b.length <= a.start, and a.start + a.length <= b.start is impossible.
        let mut new_da = da;
        new_da.remove_below(b_min + b.length);
        let mut new_db = db;
        new_db.remove_above(a_max - b.length);
        let (s, _) = state.set_domain(a.start, new_da, false)?;
        state = s;
        let (s, _) = state.set_domain(b.start, new_db, false)?;
        state = s;
    } else if !b_before_a_possible {
        let mut new_db = db;
        new_db.remove_below(a_min + a.length);
        let mut new_da = da;
        new_da.remove_above(b_max - a.length);
        let (s, _) = state.set_domain(b.start, new_db, false)?;
        state = s;
        let (s, _) = state.set_domain(a.start, new_da, false)?;
        state = s;
    }
    Ok(state)
}

#[derive(Debug, Clone)]
pub struct Disjoint1 {
    pub intervals: Vec<Interval>,
}

impl Propagator for Disjoint1 {
    fn variables(&self) -> Vec<VarId> {
        self.intervals.iter().map(|i| i.start).collect()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mut state = state.clone();
        for i in 0..self.intervals.len() {
            for j in (i + 1)..self.intervals.len() {
                state = separate_pair(state, self.intervals[i], self.intervals[j])?;
            }
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Disjoint1"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rectangle {
    pub x: VarId,
    pub y: VarId,
    pub width: IntCst,
    pub height: IntCst,
}

#[derive(Debug, Clone)]
pub struct Disjoint2 {
    pub rectangles: Vec<Rectangle>,
}

impl Propagator for Disjoint2 {
    fn variables(&self) -> Vec<VarId> {
        self.rectangles.iter().flat_map(|r| [r.x, r.y]).collect()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mut state = state.clone();
        for i in 0..self.rectangles.len() {
            for j in (i + 1)..self.rectangles.len() {
                let ri = self.rectangles[i];
                let rj = self.rectangles[j];
                let x_sep = Interval { start: ri.x, length: ri.width };
                let x_sep_j = Interval { start: rj.x, length: rj.width };
                let y_sep = Interval { start: ri.y, length: ri.height };
                let y_sep_j = Interval { start: rj.y, length: rj.height };

                let dxi = state.get_domain(ri.x).clone();
                let dxj = state.get_domain(rj.x).clone();
                let dyi = state.get_domain(ri.y).clone();
                let dyj = state.get_domain(rj.y).clone();
                let x_before = dxi.min().zip(dxj.max()).is_some_and(|(a, b)| a + ri.width <= b)
                    || dxj.min().zip(dxi.max()).is_some_and(|(a, b)| a + rj.width <= b);
                let y_before = dyi.min().zip(dyj.max()).is_some_and(|(a, b)| a + ri.height <= b)
                    || dyj.min().zip(dyi.max()).is_some_and(|(a, b)| a + rj.height <= b);

                if !x_before && !y_before {
                    return Err(Inconsistent);
                }
                if x_before && !y_before {
                    state = separate_pair(state, x_sep, x_sep_j)?;
                } else if y_before && !x_before {
                    state = separate_pair(state, y_sep, y_sep_j)?;
                }
            }
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Disjoint2"
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
    fn forces_order_when_one_direction_is_infeasible() {
        // a: start fixed at 1, length 5 -> occupies [1,6). b: length 2, domain [1,10].
        // b cannot come before a (would need b.start+2<=1), so a must come before b.
        let state = SolverState::new(vec![Domain::singleton(1, 20), Domain::interval(1, 10, 20)]);
        let p = Disjoint1 {
            intervals: vec![
                Interval { start: vid(0), length: 5 },
                Interval { start: vid(1), length: 2 },
            ],
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(1)).min(), Some(6));
    }

    #[test]
    fn detects_infeasible_overlap() {
        let state = SolverState::new(vec![Domain::singleton(1, 20), Domain::singleton(2, 20)]);
        let p = Disjoint1 {
            intervals: vec![
                Interval { start: vid(0), length: 5 },
                Interval { start: vid(1), length: 5 },
            ],
        };
        assert!(p.propagate(&state).is_err());
    }

    #[test]
    fn rectangles_separate_along_feasible_axis() {
        let state = SolverState::new(vec![
            Domain::singleton(1, 20),
            Domain::singleton(1, 20),
            Domain::interval(1, 20, 20),
            Domain::interval(1, 20, 20),
        ]);
        let p = Disjoint2 {
            rectangles: vec![
                Rectangle { x: vid(0), y: vid(1), width: 5, height: 5 },
                Rectangle { x: vid(2), y: vid(3), width: 3, height: 3 },
            ],
        };
        assert!(p.propagate(&state).is_ok());
    }
}

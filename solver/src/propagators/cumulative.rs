//! `Cumulative`: a set of tasks with fixed durations and resource demands, whose starts
//! must keep total resource usage at or under `capacity` at every instant.
//!
//! Propagation follows the standard time-table technique: each task's *compulsory part*
//! (the interval, possibly empty, during which it must be running no matter which of its
//! remaining start times is chosen) contributes to a resource-usage profile; any candidate
//! start time that would push the profile over capacity anywhere in the task's own
//! footprint is removed. This is the textbook "time-tabling" filter, not full
//! edge-finding, matching the scope the rest of this crate's global constraints keep to.

use crate::core::{IntCst, VarId};
use crate::error::{Inconsistent, ModelError};
use crate::propagator::Propagator;
use crate::state::SolverState;
use hashbrown::HashMap;

#[derive(Debug, Clone)]
pub struct Task {
    pub start: VarId,
    pub duration: IntCst,
    pub demand: IntCst,
}

#[derive(Debug, Clone)]
pub struct Cumulative {
    pub tasks: Vec<Task>,
    pub capacity: IntCst,
}

fn compulsory_profile(state: &SolverState, tasks: &[Task], skip: usize) -> HashMap<IntCst, IntCst> {
    let mut profile = HashMap::new();
    for (i, t) in tasks.iter().enumerate() {
        if i == skip {
            continue;
        }
        let d = state.get_domain(t.start);
        let (s_min, s_max) = match (d.min(), d.max()) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };
        let compulsory_start = s_max;
        let compulsory_end = s_min + t.duration;
        let mut time = compulsory_start;
        while time < compulsory_end {
            *profile.entry(time).or_insert(0) += t.demand;
            time += 1;
        }
    }
    profile
}

impl Propagator for Cumulative {
    fn variables(&self) -> Vec<VarId> {
        self.tasks.iter().map(|t| t.start).collect()
    }

    fn validate(&self) -> Result<(), ModelError> {
        for task in &self.tasks {
            if task.duration <= 0 {
                return Err(ModelError::NonPositiveDuration(task.duration));
            }
        }
        Ok(())
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let mut state = state.clone();
        for i in 0..self.tasks.len() {
            let task = &self.tasks[i];
            let profile = compulsory_profile(&state, &self.tasks, i);
            let mut new_domain = state.get_domain(task.start).clone();
            let candidates: Vec<IntCst> = new_domain.iter().collect();
            for t in candidates {
                let mut time = t;
                let end = t + task.duration;
                let mut feasible = true;
                while time < end {
                    let usage = profile.get(&time).copied().unwrap_or(0) + task.demand;
                    if usage > self.capacity {
                        feasible = false;
                        break;
                    }
                    time += 1;
                }
                if !feasible {
                    new_domain.remove(t);
                }
            }
            if new_domain.is_empty() {
                return Err(Inconsistent);
            }
            let (s, _) = state.set_domain(task.start, new_domain, false)?;
            state = s;
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Cumulative"
    }
}

/// `NoOverlap`: a set of tasks that cannot run concurrently at all, expressed as a
/// [`Cumulative`] whose demands are all `1` against a capacity of `1`.
#[derive(Debug, Clone)]
pub struct NoOverlap {
    pub cumulative: Cumulative,
}

impl NoOverlap {
    pub fn new(tasks: Vec<(VarId, IntCst)>) -> Self {
        NoOverlap {
            cumulative: Cumulative {
                tasks: tasks
                    .into_iter()
                    .map(|(start, duration)| Task { start, duration, demand: 1 })
                    .collect(),
                capacity: 1,
            },
        }
    }
}

impl Propagator for NoOverlap {
    fn variables(&self) -> Vec<VarId> {
        self.cumulative.variables()
    }

    fn validate(&self) -> Result<(), ModelError> {
        self.cumulative.validate()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        self.cumulative.propagate(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "NoOverlap"
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
    fn excludes_starts_that_would_overbook_capacity() {
        // task 0 is pinned to start at 1, duration 3, demand 2; capacity 3. task 1 has
        // demand 2 and duration 2, so it cannot start anywhere in [1,3) (overlap window).
        let state = SolverState::new(vec![Domain::singleton(1, 10), Domain::interval(1, 10, 10)]);
        let p = Cumulative {
            tasks: vec![
                Task { start: vid(0), duration: 3, demand: 2 },
                Task { start: vid(1), duration: 2, demand: 2 },
            ],
            capacity: 3,
        };
        let out = p.propagate(&state).unwrap();
        for forbidden in 1..=3 {
            assert!(!out.get_domain(vid(1)).contains(forbidden));
        }
    }

    #[test]
    fn no_overlap_forbids_concurrent_starts() {
        let state = SolverState::new(vec![Domain::singleton(1, 10), Domain::interval(1, 10, 10)]);
        let p = NoOverlap::new(vec![(vid(0), 5), (vid(1), 2)]);
        let out = p.propagate(&state).unwrap();
        assert!(!out.get_domain(vid(1)).contains(1));
    }
}

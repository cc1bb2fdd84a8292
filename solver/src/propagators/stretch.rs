//! `Stretch`: each maximal run ("stretch") of a repeated value in the sequence `vars` must
//! have length within that value's `[min_len, max_len]`, and (optionally) only certain
//! value-to-value transitions between stretches are allowed. Compiled directly to a
//! [`Regular`](super::regular::Regular) automaton over `(value, run_length_so_far)` states,
//! the same way a regular-expression engine compiles a bounded repetition into explicit
//! states rather than special-casing it.

use crate::core::{IntCst, VarId};
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::propagators::regular::{Dfa, Regular};
use crate::state::SolverState;
use hashbrown::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct Stretch {
    pub vars: Vec<VarId>,
    /// `value -> (min_len, max_len)`.
    pub specs: HashMap<IntCst, (IntCst, IntCst)>,
    /// If present, restricts which value may directly follow which at a stretch boundary.
    pub allowed_transitions: Option<HashSet<(IntCst, IntCst)>>,
}

impl Stretch {
    fn compile(&self) -> Dfa {
        const START: usize = 0;
        let mut state_id: HashMap<(IntCst, IntCst), usize> = HashMap::new();
        let mut next_id = 1usize;
        for (&value, &(_, max_len)) in &self.specs {
            for len in 1..=max_len {
                state_id.insert((value, len), next_id);
                next_id += 1;
            }
        }

        let mut transitions = HashMap::new();
        let mut accepting = HashSet::new();

        for (&value, &(min_len, max_len)) in &self.specs {
            let first = state_id[&(value, 1)];
            transitions.insert((START, value), first);
            if min_len <= 1 {
                accepting.insert(first);
            }
            for len in 1..max_len {
                let from = state_id[&(value, len)];
                let to = state_id[&(value, len + 1)];
                transitions.insert((from, value), to);
                if min_len <= len + 1 {
                    accepting.insert(to);
                }
            }
        }

        // cross-value transitions: from (v, len) reading w != v, allowed once v's minimum
        // stretch length is met and (if restricted) the transition v -> w is permitted.
        for (&from_value, &(from_min, from_max)) in &self.specs {
            for len in from_min.max(1)..=from_max {
                let Some(&from_state) = state_id.get(&(from_value, len)) else { continue };
                for &to_value in self.specs.keys() {
                    if to_value == from_value {
                        continue;
                    }
                    if let Some(allowed) = &self.allowed_transitions {
                        if !allowed.contains(&(from_value, to_value)) {
                            continue;
                        }
                    }
                    let to_state = state_id[&(to_value, 1)];
                    transitions.insert((from_state, to_value), to_state);
                }
            }
        }

        Dfa {
            start: START,
            accepting,
            transitions,
        }
    }
}

impl Propagator for Stretch {
    fn variables(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let regular = Regular {
            vars: self.vars.clone(),
            dfa: self.compile(),
        };
        regular.propagate(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Stretch"
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
    fn forbids_stretch_shorter_than_minimum() {
        // value 1 needs runs of length >= 2; a lone "1" surrounded by "2"s is forbidden.
        let mut specs = HashMap::new();
        specs.insert(1, (2, 3));
        specs.insert(2, (1, 3));
        let state = SolverState::new(vec![
            Domain::singleton(2, 2),
            Domain::singleton(1, 2),
            Domain::singleton(2, 2),
        ]);
        let p = Stretch {
            vars: vec![vid(0), vid(1), vid(2)],
            specs,
            allowed_transitions: None,
        };
        assert!(p.propagate(&state).is_err());
    }

    #[test]
    fn accepts_stretch_meeting_minimum() {
        let mut specs = HashMap::new();
        specs.insert(1, (2, 3));
        specs.insert(2, (1, 3));
        let state = SolverState::new(vec![
            Domain::singleton(1, 2),
            Domain::singleton(1, 2),
            Domain::singleton(2, 2),
        ]);
        let p = Stretch {
            vars: vec![vid(0), vid(1), vid(2)],
            specs,
            allowed_transitions: None,
        };
        assert!(p.propagate(&state).is_ok());
    }
}

//! `Regular`: the sequence `vars[0], vars[1], ..., vars[n-1]` must spell a word accepted by
//! a given DFA, generalized arc consistency via the classic layered two-pass reachability
//! (forward from the start state, backward from the accepting states), as a deterministic
//! automaton admits no ambiguity about which states are actually reachable on a support.

use crate::core::{IntCst, VarId};
use crate::domain::Domain;
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;
use hashbrown::HashSet;

pub type State = usize;

#[derive(Debug, Clone)]
pub struct Dfa {
    pub start: State,
    pub accepting: HashSet<State>,
    /// `transitions[(state, value)] = next_state`.
    pub transitions: hashbrown::HashMap<(State, IntCst), State>,
}

#[derive(Debug, Clone)]
pub struct Regular {
    pub vars: Vec<VarId>,
    pub dfa: Dfa,
}

impl Propagator for Regular {
    fn variables(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let n = self.vars.len();
        let domains: Vec<Domain> = self.vars.iter().map(|&v| state.get_domain(v).clone()).collect();

        // layers[i] = set of DFA states reachable after reading vars[0..i] through a
        // domain-consistent path. layers[0] = {start}.
        let mut layers: Vec<HashSet<State>> = vec![HashSet::new(); n + 1];
        layers[0].insert(self.dfa.start);
        for i in 0..n {
            let mut next = HashSet::new();
            for &s in &layers[i] {
                for v in domains[i].iter() {
                    if let Some(&t) = self.dfa.transitions.get(&(s, v)) {
                        next.insert(t);
                    }
                }
            }
            layers[i + 1] = next;
        }
        if !layers[n].iter().any(|s| self.dfa.accepting.contains(s)) {
            return Err(Inconsistent);
        }

        // back[i] = set of states from which an accepting state is reachable reading
        // vars[i..n].
        let mut back: Vec<HashSet<State>> = vec![HashSet::new(); n + 1];
        back[n] = self.dfa.accepting.clone();
        for i in (0..n).rev() {
            let mut prev = HashSet::new();
            for (&(s, v), &t) in &self.dfa.transitions {
                if domains[i].contains(v) && back[i + 1].contains(&t) {
                    prev.insert(s);
                }
            }
            back[i] = prev;
        }

        let mut new_domains = domains.clone();
        for i in 0..n {
            let mut kept = Domain::empty(domains[i].capacity());
            for v in domains[i].iter() {
                let supported = layers[i].iter().any(|&s| {
                    self.dfa
                        .transitions
                        .get(&(s, v))
                        .is_some_and(|t| back[i + 1].contains(t))
                });
                if supported {
                    kept.insert(v);
                }
            }
            if kept.is_empty() {
                return Err(Inconsistent);
            }
            new_domains[i] = kept;
        }

        let mut state = state.clone();
        for (i, &var) in self.vars.iter().enumerate() {
            let (s, _) = state.set_domain(var, new_domains[i].clone(), false)?;
            state = s;
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Regular"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(i: usize) -> VarId {
        VarId::from(i)
    }

    /// Accepts exactly sequences ending with value 1 (i.e. any word over {1,2} of length 2
    /// where the last symbol is 1). States: 0 = start/non-accepting, 1 = just-saw-a-1
    /// (accepting).
    fn ends_with_one_dfa() -> Dfa {
        let mut transitions = hashbrown::HashMap::new();
        transitions.insert((0, 1), 1);
        transitions.insert((0, 2), 0);
        transitions.insert((1, 1), 1);
        transitions.insert((1, 2), 0);
        Dfa {
            start: 0,
            accepting: HashSet::from_iter([1]),
            transitions,
        }
    }

    #[test]
    fn forces_last_symbol_to_one() {
        let state = SolverState::new(vec![Domain::interval(1, 2, 2), Domain::interval(1, 2, 2)]);
        let p = Regular {
            vars: vec![vid(0), vid(1)],
            dfa: ends_with_one_dfa(),
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(1)).iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn no_accepting_path_is_inconsistent() {
        let state = SolverState::new(vec![Domain::singleton(2, 2), Domain::singleton(2, 2)]);
        let p = Regular {
            vars: vec![vid(0), vid(1)],
            dfa: ends_with_one_dfa(),
        };
        assert!(p.propagate(&state).is_err());
    }
}

//! `Circuit`: `vars[i]` is the 1-indexed successor of node `i` in a single Hamiltonian
//! circuit over `{1..n}`.
//!
//! This propagator only enforces the "no premature subtour" half of the constraint: it is
//! meant to be posted alongside an [`AllDifferent`](super::all_different::AllDifferent) over
//! `vars`, which gives the permutation half. Forced (singleton) successor edges are chased
//! into chains; closing a chain back to its own origin is forbidden unless the chain already
//! spans every node, which is exactly the rule that rules out subtours without needing a
//! fully dynamic strongly-connected-components argument on every call.

use crate::core::VarId;
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;
use hashbrown::HashMap;

#[derive(Debug, Clone)]
pub struct Circuit {
    pub vars: Vec<VarId>,
}

impl Propagator for Circuit {
    fn variables(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let n = self.vars.len();

        // forced[i] = j means node (i+1) is known to point to node j.
        let mut forced: HashMap<usize, i32> = HashMap::new();
        for (i, &var) in self.vars.iter().enumerate() {
            let d = state.get_domain(var);
            if d.is_singleton() {
                forced.insert(i + 1, d.min().unwrap());
            }
        }

        // Reject any already-closed loop among forced edges that doesn't span every node.
        // A chain that starts from a node with no predecessor is caught below by refusing
        // to close it early, but a sub-cycle can also form with every one of its nodes
        // simultaneously forced to a singleton in the same propagation step, in which case
        // every node in it has a predecessor and the no-predecessor search below never
        // visits it at all.
        let mut visited: std::collections::HashSet<usize> = std::collections::HashSet::new();
        for &start in forced.keys() {
            if visited.contains(&start) {
                continue;
            }
            let mut path = vec![start];
            let mut node = start;
            let mut closed = false;
            while let Some(&next) = forced.get(&node) {
                let next = next as usize;
                if next == start {
                    closed = true;
                    break;
                }
                if path.contains(&next) || visited.contains(&next) {
                    break;
                }
                path.push(next);
                node = next;
            }
            visited.extend(path.iter().copied());
            if closed && path.len() < n {
                return Err(Inconsistent);
            }
        }

        // For each forced chain, find its origin (walking backward) and its current
        // endpoint (walking forward), plus the chain's length.
        let mut origin_of: HashMap<usize, i32> = HashMap::new();
        let mut end_of: HashMap<usize, usize> = HashMap::new();
        let mut length_of: HashMap<usize, usize> = HashMap::new();

        for &start in forced.keys() {
            let has_predecessor = forced.values().any(|&succ| succ as usize == start);
            if has_predecessor {
                continue;
            }
            let mut node = start;
            let mut len = 1;
            while let Some(&next) = forced.get(&node) {
                if next as usize == start {
                    break;
                }
                node = next as usize;
                len += 1;
            }
            origin_of.insert(node, start as i32);
            end_of.insert(start, node);
            length_of.insert(start, len);
        }

        let mut state = state.clone();
        for (&end, &origin) in &origin_of {
            let start = *end_of.iter().find(|(_, &e)| e == end).map(|(s, _)| s).unwrap_or(&end);
            let len = *length_of.get(&start).unwrap_or(&1);
            if len < n {
                let var = self.vars[end - 1];
                let mut d = state.get_domain(var).clone();
                d.remove(origin);
                let (s, _) = state.set_domain(var, d, false)?;
                state = s;
            }
        }
        Ok(state)
    }

    fn clone_box(&self) -> Box<dyn Propagator> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "Circuit"
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
    fn forbids_closing_a_partial_chain_early() {
        // 4 nodes; 1->2->3 forced. vars[2] (node 3's successor) must not be able to close
        // back to 1 since that would make a 3-cycle instead of the required 4-cycle.
        let state = SolverState::new(vec![
            Domain::singleton(2, 4),
            Domain::singleton(3, 4),
            Domain::full(4),
            Domain::full(4),
        ]);
        let p = Circuit {
            vars: vec![vid(0), vid(1), vid(2), vid(3)],
        };
        let out = p.propagate(&state).unwrap();
        assert!(!out.get_domain(vid(2)).contains(1));
    }

    #[test]
    fn rejects_a_premature_cycle_closed_in_a_single_step() {
        // 4 nodes; 1->2 and 2->1 are forced simultaneously, closing a 2-cycle with nodes
        // 3 and 4 left out entirely. Neither node has a "no predecessor" origin to chase
        // forward from, so this can only be caught by detecting the closed loop itself.
        let state = SolverState::new(vec![
            Domain::singleton(2, 4),
            Domain::singleton(1, 4),
            Domain::full(4),
            Domain::full(4),
        ]);
        let p = Circuit {
            vars: vec![vid(0), vid(1), vid(2), vid(3)],
        };
        assert!(p.propagate(&state).is_err());
    }

    #[test]
    fn allows_closing_when_chain_spans_all_nodes() {
        let state = SolverState::new(vec![
            Domain::singleton(2, 3),
            Domain::singleton(3, 3),
            Domain::full(3),
        ]);
        let p = Circuit { vars: vec![vid(0), vid(1), vid(2)] };
        let out = p.propagate(&state).unwrap();
        assert!(out.get_domain(vid(2)).contains(1));
    }
}

//! `SolverState`: an immutable, persistent representation of "the current domain of every
//! variable", implemented as an `Arc`-linked chain of single-variable updates.
//!
//! Cloning a `SolverState` is an `Arc` clone (O(1)); branching search keeps a `SolverState`
//! per open node without copying any domain data, and propagators that touch disjoint sets
//! of variables can run against the same parent state without interfering with each other.
//! The price is that `get_domain` walks the chain until it finds the variable's most recent
//! update, which is linear in chain depth; `Solver::get_domain(None, ...)` instead reads a
//! flattened snapshot taken once after the root fixed point (see `snapshot`).

pub mod pool;

use crate::core::VarId;
use crate::domain::Domain;
use crate::error::Inconsistent;
use hashbrown::HashMap;
use std::sync::Arc;

enum Node {
    /// The initial domains, one per variable, indexed by `VarId`.
    Root(Vec<Domain>),
    /// `var`'s domain was narrowed to `domain` on top of `parent`.
    Update {
        var: VarId,
        domain: Domain,
        parent: Arc<Node>,
    },
}

/// A persistent snapshot of every variable's domain. Cheap to clone, cheap to extend with
/// a single variable's new domain; not cheap to query many variables from deep in a long
/// chain of updates, which is why [`Solver`](crate::solver::Solver) flattens the root state
/// into a [`Snapshot`] once propagation reaches a fixed point.
#[derive(Clone)]
pub struct SolverState {
    node: Arc<Node>,
}

impl SolverState {
    /// Builds the root state from the model's initial per-variable domains.
    pub fn new(initial_domains: Vec<Domain>) -> Self {
        SolverState {
            node: Arc::new(Node::Root(initial_domains)),
        }
    }

    /// The current domain of `var`. Walks the update chain back to the root.
    pub fn get_domain(&self, var: VarId) -> &Domain {
        let mut node = self.node.as_ref();
        loop {
            match node {
                Node::Update { var: v, domain, parent } => {
                    if *v == var {
                        return domain;
                    }
                    node = parent.as_ref();
                }
                Node::Root(domains) => return &domains[usize::from(var)],
            }
        }
    }

    /// Narrows `var`'s domain to `new_domain`.
    ///
    /// Returns the successor state and whether the domain actually changed (always `true`
    /// unless `Config::enable_change_detection` is set and the domain is unchanged, in which
    /// case `self` is returned unmodified to avoid growing the chain for a no-op write).
    /// Fails with [`Inconsistent`] if `new_domain` is empty.
    pub fn set_domain(
        &self,
        var: VarId,
        new_domain: Domain,
        detect_no_change: bool,
    ) -> Result<(SolverState, bool), Inconsistent> {
        if new_domain.is_empty() {
            return Err(Inconsistent);
        }
        if detect_no_change && new_domain == *self.get_domain(var) {
            return Ok((self.clone(), false));
        }
        let node = Arc::new(Node::Update {
            var,
            domain: new_domain,
            parent: self.node.clone(),
        });
        Ok((SolverState { node }, true))
    }

    /// Flattens the chain into a [`Snapshot`] for O(1) repeated lookups, e.g. after the root
    /// fixed point or before returning a solution to the caller.
    pub fn snapshot(&self, num_vars: usize) -> Snapshot {
        let mut domains: HashMap<VarId, Domain> = HashMap::new();
        let mut node = self.node.as_ref();
        loop {
            match node {
                Node::Update { var, domain, parent } => {
                    domains.entry(*var).or_insert_with(|| domain.clone());
                    node = parent.as_ref();
                }
                Node::Root(root_domains) => {
                    let mut flat = Vec::with_capacity(num_vars);
                    for (i, d) in root_domains.iter().enumerate() {
                        let v = VarId::from(i);
                        flat.push(domains.get(&v).cloned().unwrap_or_else(|| d.clone()));
                    }
                    return Snapshot { domains: flat };
                }
            }
        }
    }
}

/// A flattened, `Vec`-indexed view of a [`SolverState`], for repeated O(1) reads once search
/// has settled (a solution, or the state after root propagation).
#[derive(Clone)]
pub struct Snapshot {
    domains: Vec<Domain>,
}

impl Snapshot {
    pub fn get_domain(&self, var: VarId) -> &Domain {
        &self.domains[usize::from(var)]
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
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
    fn chain_lookup_returns_most_recent_update() {
        let root = vec![Domain::full(10), Domain::full(10)];
        let s0 = SolverState::new(root);
        let (s1, changed) = s0.set_domain(vid(0), Domain::interval(1, 5, 10), false).unwrap();
        assert!(changed);
        assert_eq!(s1.get_domain(vid(0)).max(), Some(5));
        assert_eq!(s1.get_domain(vid(1)).max(), Some(10));

        let (s2, _) = s1.set_domain(vid(0), Domain::interval(1, 2, 10), false).unwrap();
        assert_eq!(s2.get_domain(vid(0)).max(), Some(2));
        // s1 is untouched: this is the persistence guarantee branching search relies on.
        assert_eq!(s1.get_domain(vid(0)).max(), Some(5));
    }

    #[test]
    fn empty_domain_is_inconsistent() {
        let s0 = SolverState::new(vec![Domain::full(10)]);
        let err = s0.set_domain(vid(0), Domain::empty(10), false).unwrap_err();
        assert_eq!(err, Inconsistent);
    }

    #[test]
    fn snapshot_matches_chain() {
        let s0 = SolverState::new(vec![Domain::full(3), Domain::full(3), Domain::full(3)]);
        let (s1, _) = s0.set_domain(vid(1), Domain::singleton(2, 3), false).unwrap();
        let snap = s1.snapshot(3);
        assert_eq!(snap.get_domain(vid(0)), s1.get_domain(vid(0)));
        assert_eq!(snap.get_domain(vid(1)), s1.get_domain(vid(1)));
        assert_eq!(snap.get_domain(vid(2)), s1.get_domain(vid(2)));
    }
}

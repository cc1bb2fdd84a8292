//! `AllDifferent`: generalized arc-consistent pairwise distinctness via Régin's algorithm
//! (maximum bipartite matching between variables and values, then Tarjan's SCC
//! decomposition of the matching's residual graph to find every value-edge that can still
//! participate in some maximum matching).

use crate::core::VarId;
use crate::domain::Domain;
use crate::error::Inconsistent;
use crate::propagator::Propagator;
use crate::state::SolverState;
use hashbrown::HashMap;

#[derive(Debug, Clone)]
pub struct AllDifferent {
    pub vars: Vec<VarId>,
}

/// A node in the bipartite-matching residual graph: either a variable or a value, plus a
/// single node standing in for every currently-unmatched value (they are mutually
/// reachable via an alternating path through any of them, so merging them is equivalent
/// and keeps the SCC computation linear in the number of edges instead of quadratic).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Node {
    Var(usize),
    Val(usize),
    FreeSink,
}

/// Finds a maximum bipartite matching between `vars` (by index) and the values in
/// `domains`, via repeated augmenting-path search (Kuhn's algorithm). Returns
/// `match_var[i] = Some(value)` for each matched variable.
fn max_matching(domains: &[Domain]) -> Vec<Option<i32>> {
    let n = domains.len();
    let mut match_var: Vec<Option<i32>> = vec![None; n];
    let mut match_val: HashMap<i32, usize> = HashMap::new();

    fn try_augment(
        i: usize,
        domains: &[Domain],
        match_var: &mut [Option<i32>],
        match_val: &mut HashMap<i32, usize>,
        visited: &mut HashMap<i32, ()>,
    ) -> bool {
        for val in domains[i].iter() {
            if visited.contains_key(&val) {
                continue;
            }
            visited.insert(val, ());
            let free_or_augmentable = match match_val.get(&val) {
                None => true,
                Some(&owner) => try_augment(owner, domains, match_var, match_val, visited),
            };
            if free_or_augmentable {
                match_val.insert(val, i);
                match_var[i] = Some(val);
                return true;
            }
        }
        false
    }

    for i in 0..n {
        let mut visited = HashMap::new();
        try_augment(i, domains, &mut match_var, &mut match_val, &mut visited);
    }
    match_var
}

impl Propagator for AllDifferent {
    fn variables(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent> {
        let n = self.vars.len();
        let domains: Vec<Domain> = self.vars.iter().map(|&v| state.get_domain(v).clone()).collect();

        let matching = max_matching(&domains);
        if matching.iter().any(|m| m.is_none()) {
            return Err(Inconsistent);
        }

        // value -> compact index, and which variable (if any) it is matched to.
        let mut value_index: HashMap<i32, usize> = HashMap::new();
        for d in &domains {
            for v in d.iter() {
                let next = value_index.len();
                value_index.entry(v).or_insert(next);
            }
        }
        let num_values = value_index.len();
        let matched_var_of_value: HashMap<i32, usize> = matching
            .iter()
            .enumerate()
            .map(|(i, v)| (v.unwrap(), i))
            .collect();

        // Build adjacency for the residual graph described above.
        let mut adj: HashMap<Node, Vec<Node>> = HashMap::new();
        let free_sink = Node::FreeSink;
        for v in 0..num_values {
            adj.entry(Node::Val(v)).or_default();
        }
        for i in 0..n {
            let matched_value = matching[i].unwrap();
            for val in domains[i].iter() {
                let vi = value_index[&val];
                if val == matched_value {
                    adj.entry(Node::Val(vi)).or_default().push(Node::Var(i));
                } else {
                    adj.entry(Node::Var(i)).or_default().push(Node::Val(vi));
                }
            }
        }
        for (&val, _vi) in value_index.iter() {
            if !matched_var_of_value.contains_key(&val) {
                let vi = value_index[&val];
                adj.entry(Node::Val(vi)).or_default().push(free_sink);
                adj.entry(free_sink).or_default().push(Node::Val(vi));
            }
        }

        let scc = tarjan_scc(&adj);

        let mut new_domains = domains.clone();
        for i in 0..n {
            let matched_value = matching[i].unwrap();
            let mut kept = Domain::empty(domains[i].capacity());
            for val in domains[i].iter() {
                let vi = value_index[&val];
                let same_scc = scc.get(&Node::Var(i)) == scc.get(&Node::Val(vi));
                if val == matched_value || same_scc {
                    kept.insert(val);
                }
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
        "AllDifferent"
    }
}

/// Tarjan's strongly-connected-components algorithm, returning each node's component id.
fn tarjan_scc(adj: &HashMap<Node, Vec<Node>>) -> HashMap<Node, usize> {
    struct State {
        index_counter: usize,
        stack: Vec<Node>,
        on_stack: HashMap<Node, bool>,
        index: HashMap<Node, usize>,
        lowlink: HashMap<Node, usize>,
        comp: HashMap<Node, usize>,
        comp_counter: usize,
    }

    fn strongconnect(v: Node, adj: &HashMap<Node, Vec<Node>>, st: &mut State) {
        st.index.insert(v, st.index_counter);
        st.lowlink.insert(v, st.index_counter);
        st.index_counter += 1;
        st.stack.push(v);
        st.on_stack.insert(v, true);

        if let Some(neighbors) = adj.get(&v) {
            for &w in neighbors {
                if !st.index.contains_key(&w) {
                    strongconnect(w, adj, st);
                    let wl = st.lowlink[&w];
                    let vl = st.lowlink[&v];
                    st.lowlink.insert(v, vl.min(wl));
                } else if *st.on_stack.get(&w).unwrap_or(&false) {
                    let wi = st.index[&w];
                    let vl = st.lowlink[&v];
                    st.lowlink.insert(v, vl.min(wi));
                }
            }
        }

        if st.lowlink[&v] == st.index[&v] {
            let id = st.comp_counter;
            st.comp_counter += 1;
            loop {
                let w = st.stack.pop().unwrap();
                st.on_stack.insert(w, false);
                st.comp.insert(w, id);
                if w == v {
                    break;
                }
            }
        }
    }

    let mut st = State {
        index_counter: 0,
        stack: Vec::new(),
        on_stack: HashMap::new(),
        index: HashMap::new(),
        lowlink: HashMap::new(),
        comp: HashMap::new(),
        comp_counter: 0,
    };
    let nodes: Vec<Node> = adj.keys().copied().collect();
    for v in nodes {
        if !st.index.contains_key(&v) {
            strongconnect(v, adj, &mut st);
        }
    }
    st.comp
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(i: usize) -> VarId {
        VarId::from(i)
    }

    #[test]
    fn detects_infeasibility_by_pigeonhole() {
        // three variables, each restricted to {1,2}: no matching of size 3 exists.
        let state = SolverState::new(vec![Domain::interval(1, 2, 5), Domain::interval(1, 2, 5), Domain::interval(1, 2, 5)]);
        let p = AllDifferent {
            vars: vec![vid(0), vid(1), vid(2)],
        };
        assert!(p.propagate(&state).is_err());
    }

    #[test]
    fn prunes_singleton_from_others() {
        let state = SolverState::new(vec![Domain::singleton(1, 5), Domain::interval(1, 2, 5), Domain::interval(1, 3, 5)]);
        let p = AllDifferent {
            vars: vec![vid(0), vid(1), vid(2)],
        };
        let out = p.propagate(&state).unwrap();
        // x1 is forced to 1, so it cannot remain a candidate for the other two.
        assert!(!out.get_domain(vid(1)).contains(1));
        assert!(!out.get_domain(vid(2)).contains(1));
    }

    #[test]
    fn leaves_fully_free_domains_untouched() {
        let state = SolverState::new(vec![Domain::full(10), Domain::full(10), Domain::full(10)]);
        let p = AllDifferent {
            vars: vec![vid(0), vid(1), vid(2)],
        };
        let out = p.propagate(&state).unwrap();
        assert_eq!(out.get_domain(vid(0)).count(), 10);
    }
}

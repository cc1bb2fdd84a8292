//! Adapter between the relational surface and the FD solver (spec.md §6's "Hybrid
//! adapter"): [`HybridStore`] is a [`RelationalState`] that also carries a `Model` under
//! construction plus the `rel var -> FD var` correspondence, so a relational goal can read
//! and narrow FD domains and an FD solution can be walked back out as relational bindings.
//!
//! [`fd_solve`] packages "finish building the model, run `Solver::solve`" as a single
//! relational goal; the `fd_*` functions below are one thin goal wrapper per propagator
//! constructor (spec.md §6: "individual FD-goal wrappers, one per propagator").

use std::sync::{Arc, Mutex};

use hashbrown::HashMap;

use crate::core::{IntCst, VarId};
use crate::domain::Domain;
use crate::model::Model;
use crate::propagators::all_different::AllDifferent;
use crate::propagators::among::Among;
use crate::propagators::inequality::Inequality;
use crate::propagators::linear::{LinearSum, Relation};
use crate::propagators::offset::Offset;
use crate::propagators::table::Table;
use crate::relational::{Goal, RelationalState, Stream, Substitution, Term};
use crate::signals::Cancel;
use crate::solver::Solver;

/// The state a hybrid goal runs over: a relational substitution plus a `Model` under
/// construction and the logic-var/FD-var correspondence [`HybridStore::map_vars`]
/// registers. Shared behind `Arc<Mutex<_>>` so goals running on different OS threads (the
/// parallel relational disjunction spec.md §5 asks for) can post to the same model.
#[derive(Clone)]
pub struct HybridStore {
    subst: Substitution,
    model: Arc<Mutex<Model>>,
    bindings: Arc<Mutex<HashMap<crate::relational::LVarId, VarId>>>,
    next_var: Arc<Mutex<u32>>,
}

impl HybridStore {
    pub fn new(model: Model) -> Self {
        HybridStore {
            subst: Substitution::new(),
            model: Arc::new(Mutex::new(model)),
            bindings: Arc::new(Mutex::new(HashMap::new())),
            next_var: Arc::new(Mutex::new(0)),
        }
    }

    /// The FD variable `rel_var` currently corresponds to, if [`map_vars`](Self::map_vars)
    /// has registered one.
    pub fn get_binding(&self, rel_var: crate::relational::LVarId) -> Option<VarId> {
        self.bindings.lock().expect("hybrid store mutex poisoned").get(&rel_var).copied()
    }

    /// Registers that `rel_var` corresponds to `fd_var`; later FD-goal wrappers resolve
    /// `rel_var` through this to reach the variable they should constrain.
    pub fn add_binding(&self, rel_var: crate::relational::LVarId, fd_var: VarId) {
        self.bindings.lock().expect("hybrid store mutex poisoned").insert(rel_var, fd_var);
    }

    pub fn get_substitution(&self) -> &Substitution {
        &self.subst
    }

    /// Reads `fd_var`'s current domain out of the model under construction. Since
    /// propagation only runs once [`fd_solve`] builds a `Solver`, this is always the
    /// variable's initial domain, not a propagated one.
    pub fn get_domain(&self, fd_var: VarId) -> Domain {
        self.model.lock().expect("hybrid store mutex poisoned").initial_domain(fd_var).clone()
    }

    /// Declares a fresh FD variable over `[lb..=ub]` in the model under construction and
    /// records the correspondence with `rel_var` in one step.
    pub fn map_vars(&self, rel_var: crate::relational::LVarId, lb: IntCst, ub: IntCst) -> Result<VarId, crate::error::ModelError> {
        let fd_var = self.model.lock().expect("hybrid store mutex poisoned").new_var(lb, ub)?;
        self.add_binding(rel_var, fd_var);
        Ok(fd_var)
    }

    /// Posts a propagator directly, for `fd_*` wrappers that build one themselves. Surfaces
    /// the propagator's own [`validate`](crate::propagator::Propagator::validate) failure
    /// rather than panicking, so a goal can turn it into an empty stream.
    pub fn add_constraint(&self, propagator: Box<dyn crate::propagator::Propagator>) -> Result<(), crate::error::ModelError> {
        self.model.lock().expect("hybrid store mutex poisoned").post(propagator)
    }

    /// Walks `result`'s FD solution back into a relational substitution: every rel-var
    /// bound via `map_vars` gets unified with its solved integer value (spec.md §6:
    /// "`auto_bind(result, store)` propagates bindings relational -> FD after a query").
    pub fn auto_bind(&self, assignment: &crate::solver::Assignment) -> Option<Substitution> {
        let mut subst = self.subst.clone();
        let bindings = self.bindings.lock().expect("hybrid store mutex poisoned");
        for (&rel_var, &fd_var) in bindings.iter() {
            let value = *assignment.get(&fd_var)?;
            subst = crate::relational::unify(&Term::Var(rel_var), &Term::int(value), &subst)?;
        }
        Some(subst)
    }

    fn with_model_and_bindings(&self, subst: Substitution) -> HybridStore {
        HybridStore {
            subst,
            model: Arc::clone(&self.model),
            bindings: Arc::clone(&self.bindings),
            next_var: Arc::clone(&self.next_var),
        }
    }
}

impl RelationalState for HybridStore {
    fn substitution(&self) -> &Substitution {
        &self.subst
    }

    fn with_substitution(self, subst: Substitution) -> Self {
        self.with_model_and_bindings(subst)
    }

    fn fresh_var(self) -> (Self, crate::relational::LVarId) {
        let mut next = self.next_var.lock().expect("hybrid store mutex poisoned");
        let id = crate::relational::LVarId::from(*next as usize);
        *next += 1;
        drop(next);
        (self.clone(), id)
    }
}

/// Packages "finish building the model, run `Solver::solve`" as a relational goal (spec.md
/// §6: the FD layer "exposes the goal `fd_solve(goal)` that packages model construction
/// plus `solve`"). Every solution is streamed through [`HybridStore::auto_bind`], so
/// downstream relational goals see FD bindings as ordinary unifications.
pub fn fd_solve(limit: usize) -> Goal<HybridStore> {
    Arc::new(move |s: HybridStore| {
        let model = s.model.lock().expect("hybrid store mutex poisoned").clone();
        let solver = Solver::new(model);
        let cancel = Cancel::new();
        let solutions = match solver.solve(&cancel, limit) {
            Ok(solutions) => solutions,
            Err(_) => return Stream::Empty,
        };
        let mut stream = Stream::Empty;
        for assignment in solutions.into_iter().rev() {
            if let Some(subst) = s.auto_bind(&assignment) {
                let bound = s.clone().with_substitution(subst);
                stream = Stream::unit(bound).mplus(stream);
            }
        }
        stream
    })
}

fn resolve(store: &HybridStore, rel_var: crate::relational::LVarId) -> Option<VarId> {
    store.get_binding(rel_var)
}

/// `fd_all_different(vars)`: the FD vars bound to `vars` must take pairwise distinct
/// values. Fails the goal (empty stream) if any `vars` entry has no FD binding yet.
pub fn fd_all_different(vars: Vec<crate::relational::LVarId>) -> Goal<HybridStore> {
    Arc::new(move |s: HybridStore| {
        let resolved: Option<Vec<VarId>> = vars.iter().map(|&v| resolve(&s, v)).collect();
        match resolved {
            Some(vars) => match s.add_constraint(Box::new(AllDifferent { vars })) {
                Ok(()) => Stream::unit(s),
                Err(_) => Stream::Empty,
            },
            None => Stream::Empty,
        }
    })
}

/// `fd_inequality(x, y, c, strict)`: `x <= y + c` (or `x < y + c` when `strict`).
pub fn fd_inequality(x: crate::relational::LVarId, y: crate::relational::LVarId, c: IntCst, strict: bool) -> Goal<HybridStore> {
    Arc::new(move |s: HybridStore| match (resolve(&s, x), resolve(&s, y)) {
        (Some(x), Some(y)) => match s.add_constraint(Box::new(Inequality { x, y, c, strict })) {
            Ok(()) => Stream::unit(s),
            Err(_) => Stream::Empty,
        },
        _ => Stream::Empty,
    })
}

/// `fd_offset(x, y, c)`: `y = x + c`.
pub fn fd_offset(x: crate::relational::LVarId, y: crate::relational::LVarId, c: IntCst) -> Goal<HybridStore> {
    Arc::new(move |s: HybridStore| match (resolve(&s, x), resolve(&s, y)) {
        (Some(x), Some(y)) => match s.add_constraint(Box::new(Offset { x, y, c })) {
            Ok(()) => Stream::unit(s),
            Err(_) => Stream::Empty,
        },
        _ => Stream::Empty,
    })
}

/// `fd_linear_sum(terms, relation, constant)`: `sum(coef_i * x_i) relation constant`.
pub fn fd_linear_sum(terms: Vec<(IntCst, crate::relational::LVarId)>, relation: Relation, constant: IntCst) -> Goal<HybridStore> {
    Arc::new(move |s: HybridStore| {
        let resolved: Option<Vec<(IntCst, VarId)>> = terms.iter().map(|&(c, v)| resolve(&s, v).map(|fd| (c, fd))).collect();
        match resolved {
            Some(terms) => match s.add_constraint(Box::new(LinearSum { terms, relation, constant })) {
                Ok(()) => Stream::unit(s),
                Err(_) => Stream::Empty,
            },
            None => Stream::Empty,
        }
    })
}

/// `fd_among(vars, values, relation, constant)`: the count of `vars` taking a value in
/// `values` stands in `relation` to `constant`.
pub fn fd_among(vars: Vec<crate::relational::LVarId>, values: Vec<IntCst>, relation: Relation, constant: IntCst) -> Goal<HybridStore> {
    Arc::new(move |s: HybridStore| {
        let resolved: Option<Vec<VarId>> = vars.iter().map(|&v| resolve(&s, v)).collect();
        match resolved {
            Some(vars) => match s.add_constraint(Box::new(Among { vars, values: values.clone(), relation, constant })) {
                Ok(()) => Stream::unit(s),
                Err(_) => Stream::Empty,
            },
            None => Stream::Empty,
        }
    })
}

/// `fd_table(vars, tuples)`: the FD vars bound to `vars` must jointly match one of
/// `tuples`.
pub fn fd_table(vars: Vec<crate::relational::LVarId>, tuples: Vec<Vec<IntCst>>) -> Goal<HybridStore> {
    Arc::new(move |s: HybridStore| {
        let resolved: Option<Vec<VarId>> = vars.iter().map(|&v| resolve(&s, v)).collect();
        match resolved {
            Some(vars) => match s.add_constraint(Box::new(Table { vars, tuples: tuples.clone() })) {
                Ok(()) => Stream::unit(s),
                Err(_) => Stream::Empty,
            },
            None => Stream::Empty,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Config;
    use crate::relational::{conj, eq, fresh, run_in};

    #[test]
    fn fd_solve_finds_every_assignment_of_a_small_domain() {
        let store = HybridStore::new(Model::new(Config::default()));
        let results = run_in(
            0,
            store,
            |q| {
                fresh(move |x| {
                    let q = q.clone();
                    let x_for_binding = x.clone();
                    conj(vec![
                        Arc::new(move |s: HybridStore| {
                            let rel_var = match &x_for_binding {
                                Term::Var(v) => *v,
                                _ => unreachable!(),
                            };
                            match s.map_vars(rel_var, 1, 3) {
                                Ok(_) => Stream::unit(s),
                                Err(_) => Stream::Empty,
                            }
                        }),
                        eq(q, x),
                        fd_solve(0),
                    ])
                })
            },
            &Cancel::new(),
        );
        let mut values: Vec<IntCst> = results
            .into_iter()
            .map(|(_, t)| match t {
                Term::Atom(crate::relational::Atom::Int(v)) => v,
                other => panic!("expected a bound int, got {other:?}"),
            })
            .collect();
        values.sort();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn fd_all_different_rejects_a_model_with_no_matching_binding() {
        let store = HybridStore::new(Model::new(Config::default()));
        let missing = crate::relational::LVarId::from(0usize);
        let goal = fd_all_different(vec![missing]);
        let stream = goal(store);
        let solutions = crate::relational::take(stream, 0, &Cancel::new());
        assert!(solutions.is_empty());
    }
}

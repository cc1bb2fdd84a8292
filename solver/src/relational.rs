//! A small miniKanren-style relational surface: terms, unification, goals, lazy streams,
//! and the `run`/`run_star` entry points spec.md §1/§6 ask for "to describe how the two
//! worlds compose". This is deliberately minimal — no tabling, no constraint-specific
//! attribute stores beyond what [`hybrid`](crate::hybrid) layers on top — grounded in
//! `proto-vulcan`'s `state`/`lterm` modules (the pack's only miniKanren-family
//! implementation), adapted to this crate's idiom: `Arc` instead of `Rc` (goals and
//! streams cross OS-thread boundaries, spec.md §5), explicit ownership instead of
//! `RefCell`, and no unsafe.

use hashbrown::HashMap;
use std::sync::Arc;

use crate::create_ref_type;
use crate::signals::Cancel;

create_ref_type!(LVarId);

impl std::fmt::Debug for LVarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LVarId({})", self.to_u32())
    }
}

/// A relational term: an opaque atom, a logic variable, or a pair (the relational
/// surface's only structured value — enough to build lists via nested pairs).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Var(LVarId),
    Atom(Atom),
    Pair(Arc<Term>, Arc<Term>),
}

/// An opaque, comparable leaf value. `Int` covers the FD boundary (spec.md's "Terms...
/// used by the relational surface to carry FD bindings out of the solver"); `Sym` covers
/// everything else a relational program wants to unify on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Atom {
    Int(crate::core::IntCst),
    Sym(Arc<str>),
}

impl Term {
    pub fn int(v: crate::core::IntCst) -> Term {
        Term::Atom(Atom::Int(v))
    }

    pub fn sym(s: &str) -> Term {
        Term::Atom(Atom::Sym(Arc::from(s)))
    }

    pub fn cons(a: Term, b: Term) -> Term {
        Term::Pair(Arc::new(a), Arc::new(b))
    }
}

/// `logic-var id -> term` bindings. Cloning is `O(n)` in the number of bound variables
/// (a plain `HashMap` clone, not a persistent tree) — acceptable for the modest
/// substitution sizes this minimal surface targets; see `DESIGN.md`.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    bindings: HashMap<LVarId, Term>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution::default()
    }

    pub fn get(&self, v: LVarId) -> Option<Term> {
        self.bindings.get(&v).cloned()
    }

    fn extend(&self, v: LVarId, term: Term) -> Substitution {
        let mut bindings = self.bindings.clone();
        bindings.insert(v, term);
        Substitution { bindings }
    }
}

/// Follows a variable's binding chain until it reaches an unbound variable, an atom, or a
/// pair. Does not recurse into pairs (use [`deep_walk`] for that).
pub fn walk(term: &Term, subst: &Substitution) -> Term {
    let mut current = term.clone();
    while let Term::Var(v) = current {
        match subst.get(v) {
            Some(next) => current = next,
            None => return Term::Var(v),
        }
    }
    current
}

/// As [`walk`], but also walks recursively into the two sides of a pair, producing a term
/// with every reachable variable resolved as far as the substitution allows.
pub fn deep_walk(term: &Term, subst: &Substitution) -> Term {
    match walk(term, subst) {
        Term::Pair(a, b) => Term::cons(deep_walk(&a, subst), deep_walk(&b, subst)),
        other => other,
    }
}

/// Unifies `a` and `b` under `subst`, returning the extended substitution or `None` on
/// mismatch. Pure: never mutates `subst`, always returns a (possibly identical) copy.
pub fn unify(a: &Term, b: &Term, subst: &Substitution) -> Option<Substitution> {
    let a = walk(a, subst);
    let b = walk(b, subst);
    match (&a, &b) {
        (Term::Var(x), Term::Var(y)) if x == y => Some(subst.clone()),
        (Term::Var(x), _) => Some(subst.extend(*x, b)),
        (_, Term::Var(y)) => Some(subst.extend(*y, a)),
        (Term::Atom(x), Term::Atom(y)) => {
            if x == y {
                Some(subst.clone())
            } else {
                None
            }
        }
        (Term::Pair(a1, a2), Term::Pair(b1, b2)) => {
            let s = unify(a1, b1, subst)?;
            unify(a2, b2, &s)
        }
        _ => None,
    }
}

/// A relational constraint store: whatever a goal needs to carry besides the
/// substitution (spec.md §3's "constraint store"). [`RelState`] is the plain relational
/// implementation; [`crate::hybrid::HybridStore`] implements it too, pairing a
/// substitution with an FD [`Model`](crate::model::Model) under construction.
pub trait RelationalState: Clone + Send + Sync + 'static {
    fn substitution(&self) -> &Substitution;
    fn with_substitution(self, subst: Substitution) -> Self;
    /// Allocates a fresh logic variable, returning the updated state and the variable.
    fn fresh_var(self) -> (Self, LVarId);
}

/// The plain relational constraint store: nothing but a substitution and a variable
/// counter.
#[derive(Debug, Clone, Default)]
pub struct RelState {
    subst: Substitution,
    next_var: u32,
}

impl RelState {
    pub fn new() -> Self {
        RelState::default()
    }
}

impl RelationalState for RelState {
    fn substitution(&self) -> &Substitution {
        &self.subst
    }

    fn with_substitution(self, subst: Substitution) -> Self {
        RelState { subst, next_var: self.next_var }
    }

    fn fresh_var(mut self) -> (Self, LVarId) {
        let id = LVarId::from(self.next_var as usize);
        self.next_var += 1;
        (self, id)
    }
}

/// A lazy sequence of constraint stores. `Suspend` defers work until a consumer actually
/// asks for the next element, which is what keeps `disj`/`bind` fair on goals that would
/// otherwise recurse forever (spec.md §3: "Streams... may be finite or unbounded").
pub enum Stream<S> {
    Empty,
    Cons(S, Box<Stream<S>>),
    Suspend(Box<dyn FnOnce() -> Stream<S> + Send>),
}

impl<S> Stream<S> {
    pub fn unit(s: S) -> Self {
        Stream::Cons(s, Box::new(Stream::Empty))
    }
}

impl<S: Send + 'static> Stream<S> {
    /// Interleaves `self` and `other`, deferring `other` behind a `Suspend` so that an
    /// infinite `self` does not starve `other` forever.
    pub fn mplus(self, other: Stream<S>) -> Stream<S> {
        match self {
            Stream::Empty => other,
            Stream::Cons(s, rest) => Stream::Cons(s, Box::new(rest.mplus(other))),
            Stream::Suspend(f) => Stream::Suspend(Box::new(move || other.mplus(f()))),
        }
    }

    /// Applies `goal` to every element of `self`, flattening the resulting streams in
    /// fairness-preserving (interleaved) order.
    pub fn bind(self, goal: &Goal<S>) -> Stream<S> {
        match self {
            Stream::Empty => Stream::Empty,
            Stream::Cons(s, rest) => {
                let goal = goal.clone();
                goal(s).mplus(Stream::Suspend(Box::new(move || rest.bind(&goal))))
            }
            Stream::Suspend(f) => {
                let goal = goal.clone();
                Stream::Suspend(Box::new(move || f().bind(&goal)))
            }
        }
    }
}

/// Pulls up to `n` elements out of `stream` (`n == 0` means unbounded), trampolining
/// through `Suspend` thunks iteratively rather than recursively so an unbounded stream
/// doesn't blow the call stack. Stops early if `cancel` is triggered mid-pull.
pub fn take<S>(mut stream: Stream<S>, n: usize, cancel: &Cancel) -> Vec<S> {
    let mut out = Vec::new();
    loop {
        if cancel.is_cancelled() || (n != 0 && out.len() >= n) {
            break;
        }
        match stream {
            Stream::Empty => break,
            Stream::Cons(s, rest) => {
                out.push(s);
                stream = *rest;
            }
            Stream::Suspend(f) => stream = f(),
        }
    }
    out
}

/// A relational goal: a function from a constraint store to the stream of stores it's
/// satisfiable in. `Arc` (not a plain `Box<dyn Fn>`) so goals can be cloned cheaply into
/// the closures `bind`/`disj` build, and shared across the OS-thread workers spec.md §5
/// uses for relational disjunction.
pub type Goal<S> = Arc<dyn Fn(S) -> Stream<S> + Send + Sync>;

/// `eq(a, b)`: succeeds (with the unifying substitution) wherever `a` and `b` unify,
/// fails otherwise.
pub fn eq<S: RelationalState>(a: Term, b: Term) -> Goal<S> {
    Arc::new(move |s: S| match unify(&a, &b, s.substitution()) {
        Some(subst) => Stream::unit(s.with_substitution(subst)),
        None => Stream::Empty,
    })
}

/// Introduces a fresh logic variable and passes it to `f`, which builds the goal that uses
/// it. Mirrors Scheme miniKanren's `fresh` macro without needing variadic macro support.
pub fn fresh<S, F>(f: F) -> Goal<S>
where
    S: RelationalState,
    F: Fn(Term) -> Goal<S> + Send + Sync + 'static,
{
    Arc::new(move |s: S| {
        let (s2, v) = s.fresh_var();
        (f(Term::Var(v)))(s2)
    })
}

/// Sequences two goals: a state satisfies `conj2(g1, g2)` iff it satisfies `g1` and the
/// result satisfies `g2`.
pub fn conj2<S: RelationalState>(g1: Goal<S>, g2: Goal<S>) -> Goal<S> {
    Arc::new(move |s: S| g1(s).bind(&g2))
}

/// Left-folds [`conj2`] over `goals`; the empty conjunction always succeeds (the identity
/// goal).
pub fn conj<S: RelationalState>(goals: Vec<Goal<S>>) -> Goal<S> {
    goals.into_iter().reduce(conj2).unwrap_or_else(|| Arc::new(Stream::unit))
}

/// Offers two alternatives: a state satisfies `disj2(g1, g2)` iff it satisfies `g1` or
/// `g2`, interleaved fairly via `mplus`.
pub fn disj2<S: RelationalState>(g1: Goal<S>, g2: Goal<S>) -> Goal<S> {
    Arc::new(move |s: S| {
        let g2 = g2.clone();
        let s2 = s.clone();
        g1(s).mplus(Stream::Suspend(Box::new(move || g2(s2))))
    })
}

/// Left-folds [`disj2`] over `goals`; the empty disjunction always fails.
pub fn disj<S: RelationalState>(goals: Vec<Goal<S>>) -> Goal<S> {
    goals.into_iter().reduce(disj2).unwrap_or_else(|| Arc::new(|_s: S| Stream::Empty))
}

/// Runs `build` (applied to a fresh query term `q`) for up to `n` solutions (`0` =
/// unbounded) starting from `initial`, returning each solution's full resulting state
/// alongside its deep-walked binding for `q`. Generic over any [`RelationalState`], so
/// [`crate::hybrid::HybridStore`] can drive the same engine as the plain [`RelState`].
pub fn run_in<S: RelationalState>(n: usize, initial: S, build: impl FnOnce(Term) -> Goal<S>, cancel: &Cancel) -> Vec<(S, Term)> {
    let (s1, qvar) = initial.fresh_var();
    let q = Term::Var(qvar);
    let goal = build(q.clone());
    let stream = goal(s1);
    take(stream, n, cancel).into_iter().map(|s| { let t = deep_walk(&q, s.substitution()); (s, t) }).collect()
}

/// Runs `build` (applied to a fresh query term `q`) for up to `n` solutions (`0` =
/// unbounded), returning each solution's deep-walked binding for `q`.
pub fn run(n: usize, build: impl FnOnce(Term) -> Goal<RelState>) -> Vec<Term> {
    run_with_cancel(n, build, &Cancel::new())
}

/// As [`run`], but cancellation-aware: useful when `build` may describe an unbounded
/// relation and the caller wants to stop pulling early.
pub fn run_with_cancel(n: usize, build: impl FnOnce(Term) -> Goal<RelState>, cancel: &Cancel) -> Vec<Term> {
    run_in(n, RelState::new(), build, cancel).into_iter().map(|(_, t)| t).collect()
}

/// `run(0, build)`: every solution, unbounded.
pub fn run_star(build: impl FnOnce(Term) -> Goal<RelState>) -> Vec<Term> {
    run(0, build)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unify_binds_a_variable_to_an_atom() {
        let s0 = RelState::new();
        let (s1, v) = s0.fresh_var();
        let subst = unify(&Term::Var(v), &Term::int(7), s1.substitution()).unwrap();
        assert_eq!(subst.get(v), Some(Term::int(7)));
    }

    #[test]
    fn unify_fails_on_mismatched_atoms() {
        assert!(unify(&Term::int(1), &Term::int(2), &Substitution::new()).is_none());
    }

    #[test]
    fn unify_walks_through_chained_variables() {
        let s0 = RelState::new();
        let (s1, x) = s0.fresh_var();
        let (s2, y) = s1.fresh_var();
        let subst = unify(&Term::Var(x), &Term::Var(y), s2.substitution()).unwrap();
        let subst = unify(&Term::Var(y), &Term::int(3), &subst).unwrap();
        assert_eq!(deep_walk(&Term::Var(x), &subst), Term::int(3));
    }

    #[test]
    fn run_star_finds_every_solution_of_a_disjunction() {
        let results = run_star(|q| disj(vec![eq(q.clone(), Term::int(1)), eq(q.clone(), Term::int(2)), eq(q, Term::int(3))]));
        assert_eq!(results, vec![Term::int(1), Term::int(2), Term::int(3)]);
    }

    #[test]
    fn run_respects_the_solution_limit() {
        let results = run(1, |q| disj(vec![eq(q.clone(), Term::int(1)), eq(q, Term::int(2))]));
        assert_eq!(results, vec![Term::int(1)]);
    }

    #[test]
    fn fresh_variables_do_not_alias_across_conjuncts() {
        let results = run_star(|q| {
            fresh(move |a| {
                let q = q.clone();
                conj(vec![eq(a.clone(), Term::int(5)), eq(q, a)])
            })
        });
        assert_eq!(results, vec![Term::int(5)]);
    }

    #[test]
    fn conj_fails_when_either_branch_fails() {
        let results = run_star(|q| conj(vec![eq(q.clone(), Term::int(1)), eq(q, Term::int(2))]));
        assert!(results.is_empty());
    }

    #[test]
    fn pairs_unify_componentwise() {
        let pair = Term::cons(Term::int(1), Term::int(2));
        let results = run_star(move |q| eq(q, pair.clone()));
        assert_eq!(results, vec![Term::cons(Term::int(1), Term::int(2))]);
    }
}

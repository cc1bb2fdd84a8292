//! `Solver`: builds the initial state from a [`Model`], runs the root fixed point once, and
//! drives [`search`] to enumerate, stream, or optimise solutions.

use crate::core::{IntCst, VarId};
use crate::domain::Domain;
use crate::error::{Inconsistent, SolveError};
use crate::model::Model;
use crate::search::{self, Monitor, NoopMonitor, SearchStatus, SolutionSink, WatchLists};
use crate::signals::Cancel;
use crate::state::{SolverState, Snapshot};
use crossbeam_channel::Sender;
use hashbrown::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A full assignment of every model variable to an integer, as returned by `solve`.
pub type Assignment = HashMap<VarId, IntCst>;

/// A cap on search effort, independent of the solution-count `limit` every `solve` call
/// also takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    Unbounded,
    /// Stop (per worker, so the true bound in a parallel run is a small multiple of this)
    /// after this many search-tree nodes have been visited.
    Nodes(u64),
}

/// The result of a node-bounded solve.
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    /// Every reachable solution (up to the solution-count limit) was found.
    Complete(Vec<Assignment>),
    /// The node budget ran out before search finished; `best` holds whatever solutions
    /// were found before the limit was hit (spec.md §7: "best solution so far plus a
    /// status code", not an error).
    LimitReached { best: Vec<Assignment> },
}

fn snapshot_to_assignment(snap: &Snapshot, num_vars: usize) -> Assignment {
    (0..num_vars)
        .map(|i| {
            let v = VarId::from(i);
            (v, snap.get_domain(v).min().expect("solution domains are singletons"))
        })
        .collect()
}

/// Ties a [`Model`] to the search machinery: watch lists built once from the model's
/// propagators, and a cached snapshot of the root-propagated domains for post-solve
/// `get_domain` queries that don't want to re-walk a state chain.
pub struct Solver {
    model: Model,
    watch: WatchLists,
    root: SolverState,
    root_snapshot: Option<Snapshot>,
    monitor: Arc<dyn Monitor>,
}

impl Solver {
    /// Builds the initial [`SolverState`] from `model` and runs propagation to a fixed
    /// point, caching the result for `get_domain(None, _)` queries. Never fails: an
    /// unsatisfiable root simply means every later `solve` call returns no solutions.
    pub fn new(model: Model) -> Self {
        Self::with_monitor(model, Arc::new(NoopMonitor))
    }

    /// As [`Solver::new`], but search progress is reported to `monitor` (e.g. a shared
    /// [`CountingMonitor`]) instead of being discarded.
    pub fn with_monitor(model: Model, monitor: Arc<dyn Monitor>) -> Self {
        let watch = WatchLists::build(&model);
        let root = SolverState::new(model.initial_domains());
        let num_vars = model.num_variables();
        let root_snapshot = match search::propagate_to_fixed_point(&model, &watch, &root, monitor.as_ref()) {
            Ok(s) => {
                debug!(num_vars, "root fixed point reached");
                Some(s.snapshot(num_vars))
            }
            Err(Inconsistent) => {
                info!("root propagation proved the model unsatisfiable");
                None
            }
        };
        Solver { model, watch, root, root_snapshot, monitor }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The domain of `var` in `state`, or the root-propagated cache when `state` is
    /// `None` (spec.md §6: "uses root-propagated cache when state_or_none is absent").
    pub fn get_domain(&self, state: Option<&SolverState>, var: VarId) -> Result<Domain, SolveError> {
        self.model.check_var(var)?;
        match state {
            Some(s) => Ok(s.get_domain(var).clone()),
            None => Ok(self
                .root_snapshot
                .as_ref()
                .map(|snap| snap.get_domain(var).clone())
                .unwrap_or_else(|| Domain::empty(self.model.domain_max_value()))),
        }
    }

    /// Enumerates up to `limit` solutions (`0` = every solution), in heuristic order for a
    /// single worker or unspecified order across workers (spec.md §5). Errors only on
    /// cancellation; an unsatisfiable model returns `Ok(vec![])`, not an error.
    pub fn solve(&self, cancel: &Cancel, limit: usize) -> Result<Vec<Assignment>, SolveError> {
        match self.solve_bounded(cancel, limit, SearchLimit::Unbounded)? {
            SolveOutcome::Complete(solutions) => Ok(solutions),
            SolveOutcome::LimitReached { best } => Ok(best),
        }
    }

    /// As [`Solver::solve`], but also bounded by a search-tree node budget; returns the
    /// partial result plus a status instead of erroring when the budget runs out first.
    pub fn solve_bounded(&self, cancel: &Cancel, limit: usize, node_limit: SearchLimit) -> Result<SolveOutcome, SolveError> {
        if cancel.is_cancelled() {
            return Err(SolveError::Cancelled);
        }
        if self.root_snapshot.is_none() {
            return Ok(SolveOutcome::Complete(Vec::new()));
        }
        let node_budget = match node_limit {
            SearchLimit::Unbounded => 0,
            SearchLimit::Nodes(n) => n,
        };
        let num_vars = self.model.num_variables();
        let (states, status) = search::search(&self.model, &self.watch, &self.root, cancel, self.monitor.as_ref(), limit, node_budget);
        let solutions: Vec<Assignment> = states.iter().map(|s| snapshot_to_assignment(&s.snapshot(num_vars), num_vars)).collect();
        match status {
            SearchStatus::Cancelled => Err(SolveError::Cancelled),
            SearchStatus::NodeLimitReached => Ok(SolveOutcome::LimitReached { best: solutions }),
            SearchStatus::SolutionLimitReached | SearchStatus::Continue => Ok(SolveOutcome::Complete(solutions)),
        }
    }

    /// Streams solutions to `sender` as search finds them instead of collecting them all
    /// first, respecting the channel's own back-pressure (spec.md §5: "parallel disjunction
    /// uses a bounded work queue; when full, producers block on cancellation-aware send").
    /// Returns once search finishes, is cancelled, or the receiver is dropped; solutions
    /// already sent remain valid even if the run is later cancelled.
    pub fn solve_stream(&self, cancel: &Cancel, sender: Sender<Assignment>) -> Result<(), SolveError> {
        if cancel.is_cancelled() {
            return Err(SolveError::Cancelled);
        }
        if self.root_snapshot.is_none() {
            return Ok(());
        }
        let num_vars = self.model.num_variables();
        let sink = ChannelSink { sender, cancel: cancel.clone(), num_vars };
        let status = search::search_with_sink(&self.model, &self.watch, &self.root, cancel, self.monitor.as_ref(), 0, &sink);
        match status {
            SearchStatus::Cancelled => Err(SolveError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Finds the assignment optimising `objective` (minimising if `minimize`, maximising
    /// otherwise) via repeated "anytime" solves with a tightening bound on `objective`: the
    /// best solution found is kept even if a later tightening attempt is cancelled or
    /// exhausts its node budget (spec.md §4.7).
    pub fn optimize(&self, cancel: &Cancel, objective: VarId, minimize: bool) -> Result<Option<(Assignment, IntCst)>, SolveError> {
        self.model.check_var(objective)?;
        if self.root_snapshot.is_none() {
            return Ok(None);
        }
        let num_vars = self.model.num_variables();
        let mut best: Option<(Assignment, IntCst)> = None;

        loop {
            if cancel.is_cancelled() {
                return match best {
                    Some(b) => Ok(Some(b)),
                    None => Err(SolveError::Cancelled),
                };
            }

            let root = match &best {
                None => self.root.clone(),
                Some((_, value)) => match self.tightened_root(objective, *value, minimize) {
                    Some(r) => r,
                    None => return Ok(best),
                },
            };

            let (states, status) = search::search(&self.model, &self.watch, &root, cancel, self.monitor.as_ref(), 1, 0);
            if states.is_empty() {
                return if matches!(status, SearchStatus::Cancelled) && best.is_none() { Err(SolveError::Cancelled) } else { Ok(best) };
            }

            let snap = states[0].snapshot(num_vars);
            let assignment = snapshot_to_assignment(&snap, num_vars);
            let value = *snap.get_domain(objective).min().as_ref().expect("solution domains are singletons");
            best = Some((assignment, value));

            if matches!(status, SearchStatus::Cancelled) {
                return Ok(best);
            }
        }
    }

    /// Builds a fresh root state with `objective` narrowed to values strictly better than
    /// `current_best` (`< current_best` minimizing, `> current_best` maximizing). Starts
    /// from `self.root` rather than the previous iteration's root so that only the
    /// objective's bound tightens across iterations; every other domain is exactly as the
    /// initial fixed point left it.
    fn tightened_root(&self, objective: VarId, current_best: IntCst, minimize: bool) -> Option<SolverState> {
        let mut narrowed = self.root.get_domain(objective).clone();
        if minimize {
            narrowed.remove_at_or_above(current_best);
        } else {
            narrowed.remove_at_or_below(current_best);
        }
        self.root.set_domain(objective, narrowed, false).ok().map(|(s, _)| s)
    }
}

/// Feeds solutions into a bounded channel as search finds them, blocking (in short,
/// cancellation-aware slices) rather than unboundedly buffering when the receiver lags.
struct ChannelSink {
    sender: Sender<Assignment>,
    cancel: Cancel,
    num_vars: usize,
}

impl SolutionSink for ChannelSink {
    fn push(&self, state: SolverState) -> bool {
        let assignment = snapshot_to_assignment(&state.snapshot(self.num_vars), self.num_vars);
        loop {
            if self.cancel.is_cancelled() {
                return true;
            }
            match self.sender.send_timeout(assignment.clone(), Duration::from_millis(50)) {
                Ok(()) => return false,
                Err(crossbeam_channel::SendTimeoutError::Timeout) => continue,
                Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => return true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Config, Model};
    use crate::propagators::inequality::Inequality;

    #[test]
    fn unsat_model_solves_to_empty_without_error() {
        let mut model = Model::new(Config::default());
        let x = model.new_var(1, 2).unwrap();
        model.post(Box::new(Inequality { x, y: x, c: -1, strict: false })).unwrap();
        let solver = Solver::new(model);
        let cancel = Cancel::new();
        assert_eq!(solver.solve(&cancel, 0).unwrap(), Vec::new());
    }

    #[test]
    fn solve_enumerates_every_assignment_under_the_limit() {
        let mut model = Model::new(Config::default());
        let x = model.new_var(1, 3).unwrap();
        let solver = Solver::new(model);
        let cancel = Cancel::new();
        let solutions = solver.solve(&cancel, 0).unwrap();
        assert_eq!(solutions.len(), 3);
        let mut values: Vec<IntCst> = solutions.iter().map(|a| a[&x]).collect();
        values.sort();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn optimize_minimizes_under_an_inequality() {
        let mut model = Model::new(Config::default());
        let x = model.new_var(1, 10).unwrap();
        let y = model.new_var(1, 10).unwrap();
        model.post(Box::new(Inequality { x, y, c: 2, strict: false })).unwrap(); // x <= y + 2
        let solver = Solver::new(model);
        let cancel = Cancel::new();
        let (assignment, value) = solver.optimize(&cancel, y, true).unwrap().unwrap();
        assert_eq!(value, 1);
        assert_eq!(assignment[&y], 1);
    }

    #[test]
    fn cancelled_before_solve_errors_immediately() {
        let model = Model::new(Config::default());
        let solver = Solver::new(model);
        let cancel = Cancel::new();
        cancel.trigger();
        assert!(matches!(solver.solve(&cancel, 0), Err(SolveError::Cancelled)));
    }

    #[test]
    fn get_domain_uses_root_snapshot_when_state_is_none() {
        let mut model = Model::new(Config::default());
        let x = model.new_var(2, 5).unwrap();
        let solver = Solver::new(model);
        let d = solver.get_domain(None, x).unwrap();
        assert_eq!(d.min(), Some(2));
        assert_eq!(d.max(), Some(5));
    }
}

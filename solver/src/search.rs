//! Fixed-point propagation and the backtracking search that sits on top of it.
//!
//! `propagate_to_fixed_point` is the single entry point both `Solver::new` (root
//! propagation) and every search node go through. The DFS in [`dfs`] is chronological
//! backtracking, not CDCL: on failure it simply discards the failed child chain and tries
//! the next branch, exactly as spec.md §4.7 describes. [`search`] wraps it with the
//! variable/value heuristics and, when `Config::num_workers > 1`, branches the first
//! decision across OS threads (spec.md §5's "parallel OS-thread-level workers").

use crate::core::{IntCst, VarId};
use crate::domain::Domain;
use crate::error::Inconsistent;
use crate::model::{Model, PropagationMode, ValueHeuristic, VariableHeuristic};
use crate::signals::Cancel;
use crate::state::SolverState;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, trace};

/// `variables[i]` is the list of propagator indices that touch variable `i`. Built once per
/// `Solver` and shared read-only by every worker.
pub(crate) struct WatchLists {
    by_variable: Vec<Vec<usize>>,
}

impl WatchLists {
    pub(crate) fn build(model: &Model) -> Self {
        let mut by_variable = vec![Vec::new(); model.num_variables()];
        for (i, p) in model.propagators().iter().enumerate() {
            for v in p.variables() {
                by_variable[usize::from(v)].push(i);
            }
        }
        WatchLists { by_variable }
    }

    fn watchers(&self, var: VarId) -> &[usize] {
        &self.by_variable[usize::from(var)]
    }
}

/// Observes search progress. Every recursion point reports through this instead of logging
/// directly, so a caller can wire up their own counters without depending on `tracing`
/// subscriber configuration (mirrors the teacher's `Explainer`/monitor split: search logic
/// and observation are separate concerns).
pub trait Monitor: Send + Sync {
    fn on_node(&self) {}
    fn on_backtrack(&self) {}
    fn on_solution(&self) {}
    fn on_propagation_pass(&self) {}
}

/// A `Monitor` that does nothing; the default for `Solver::new`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl Monitor for NoopMonitor {}

/// A `Monitor` that tallies every event with atomics, safe to share across search workers.
#[derive(Debug, Default)]
pub struct CountingMonitor {
    pub nodes: AtomicU64,
    pub backtracks: AtomicU64,
    pub solutions: AtomicU64,
    pub propagation_passes: AtomicU64,
}

impl Monitor for CountingMonitor {
    fn on_node(&self) {
        self.nodes.fetch_add(1, Ordering::Relaxed);
    }
    fn on_backtrack(&self) {
        self.backtracks.fetch_add(1, Ordering::Relaxed);
    }
    fn on_solution(&self) {
        self.solutions.fetch_add(1, Ordering::Relaxed);
    }
    fn on_propagation_pass(&self) {
        self.propagation_passes.fetch_add(1, Ordering::Relaxed);
    }
}

/// Runs every propagator watching a changed variable until no propagator can narrow any
/// domain further (spec.md §4.3). `Eager` re-queues a propagator's watchers as soon as one
/// of its own `set_domain` calls reports a change; `Lazy` re-queues once per propagator per
/// pass regardless of how many of its own writes changed something. Both converge to the
/// same fixed point; they differ only in how many redundant re-examinations happen on the
/// way there.
pub(crate) fn propagate_to_fixed_point(
    model: &Model,
    watch: &WatchLists,
    state: &SolverState,
    monitor: &dyn Monitor,
) -> Result<SolverState, Inconsistent> {
    let propagators = model.propagators();
    let mut queue: Vec<bool> = vec![true; propagators.len()];
    let mut pending: usize = propagators.len();
    let mut current = state.clone();

    while pending > 0 {
        monitor.on_propagation_pass();
        let mut any_ran = false;
        for i in 0..propagators.len() {
            if !queue[i] {
                continue;
            }
            queue[i] = false;
            pending -= 1;
            any_ran = true;

            let before: Vec<Domain> = propagators[i].variables().iter().map(|&v| current.get_domain(v).clone()).collect();
            let next = propagators[i].propagate(&current)?;

            let mut changed_vars = Vec::new();
            for (v, before_d) in propagators[i].variables().into_iter().zip(before) {
                if *next.get_domain(v) != before_d {
                    changed_vars.push(v);
                }
            }
            current = next;

            if changed_vars.is_empty() {
                continue;
            }
            trace!(propagator = propagators[i].name(), touched = changed_vars.len(), "propagator narrowed a domain");

            match model.config.propagation_mode {
                PropagationMode::Eager => {
                    for &v in &changed_vars {
                        for &j in watch.watchers(v) {
                            if j != i && !queue[j] {
                                queue[j] = true;
                                pending += 1;
                            }
                        }
                    }
                }
                PropagationMode::Lazy => {
                    // Re-queue every other watcher once, regardless of how many of this
                    // propagator's own variables changed; collapses to the same set of
                    // watchers as Eager's per-variable loop but in a single pass.
                    let mut seen = std::collections::HashSet::new();
                    for &v in &changed_vars {
                        for &j in watch.watchers(v) {
                            if j != i && seen.insert(j) && !queue[j] {
                                queue[j] = true;
                                pending += 1;
                            }
                        }
                    }
                }
            }
        }
        if !any_ran {
            break;
        }
    }
    Ok(current)
}

fn select_variable(model: &Model, watch: &WatchLists, state: &SolverState, rng: &mut SmallRng) -> Option<VarId> {
    let unbound: Vec<VarId> = model.variables().filter(|&v| !state.get_domain(v).is_singleton()).collect();
    if unbound.is_empty() {
        return None;
    }
    use VariableHeuristic::*;
    let chosen = match model.config.variable_heuristic {
        Dom => *unbound.iter().min_by_key(|&&v| state.get_domain(v).count()).unwrap(),
        Deg => *unbound.iter().max_by_key(|&&v| watch.watchers(v).len()).unwrap(),
        DomDeg => *unbound
            .iter()
            .min_by(|&&a, &&b| {
                let score = |v: VarId| (state.get_domain(v).count() as f64) / (watch.watchers(v).len().max(1) as f64);
                score(a).partial_cmp(&score(b)).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap(),
        Lex => unbound[0],
        Random => unbound[rng.random_range(0..unbound.len())],
    };
    Some(chosen)
}

fn select_value(model: &Model, domain: &Domain, rng: &mut SmallRng) -> IntCst {
    use ValueHeuristic::*;
    match model.config.value_heuristic {
        Asc => domain.min().expect("selected variable has a non-empty domain"),
        Desc => domain.max().expect("selected variable has a non-empty domain"),
        Middle => {
            let lo = domain.min().expect("selected variable has a non-empty domain");
            let hi = domain.max().expect("selected variable has a non-empty domain");
            let mid = lo + (hi - lo) / 2;
            domain.iter().min_by_key(|&v| (v - mid).abs()).unwrap()
        }
        Random => {
            let values: Vec<IntCst> = domain.iter().collect();
            values[rng.random_range(0..values.len())]
        }
    }
}

/// Outcome of a single [`dfs`] call: whether the caller should keep exploring sibling
/// branches (`Continue`) or unwind the whole search immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchStatus {
    Continue,
    Cancelled,
    NodeLimitReached,
    SolutionLimitReached,
}

/// Receives solutions as `dfs` finds them. Shared across parallel workers so that a
/// solution found by one worker can retire the global solution-count budget for all of
/// them (spec.md §4.7: "a found-solution signal may cancel siblings").
pub(crate) trait SolutionSink: Sync {
    /// Records `state` as a solution. Returns `true` once the sink's limit has been
    /// reached and no further solutions are wanted.
    fn push(&self, state: SolverState) -> bool;
}

pub(crate) struct VecSink {
    inner: Mutex<Vec<SolverState>>,
    limit: usize,
}

impl VecSink {
    pub(crate) fn new(limit: usize) -> Self {
        VecSink { inner: Mutex::new(Vec::new()), limit }
    }

    pub(crate) fn into_inner(self) -> Vec<SolverState> {
        self.inner.into_inner().expect("search never panics while holding the sink lock")
    }
}

impl SolutionSink for VecSink {
    fn push(&self, state: SolverState) -> bool {
        let mut guard = self.inner.lock().expect("search never panics while holding the sink lock");
        guard.push(state);
        self.limit != 0 && guard.len() >= self.limit
    }
}

struct SearchCtx<'a> {
    model: &'a Model,
    watch: &'a WatchLists,
    cancel: &'a Cancel,
    monitor: &'a dyn Monitor,
    node_limit: u64,
    nodes_seen: AtomicU64,
    sink: &'a dyn SolutionSink,
}

fn dfs(ctx: &SearchCtx, state: SolverState, rng: &mut SmallRng) -> SearchStatus {
    if ctx.cancel.is_cancelled() {
        return SearchStatus::Cancelled;
    }
    if ctx.node_limit != 0 {
        let seen = ctx.nodes_seen.fetch_add(1, Ordering::Relaxed) + 1;
        if seen > ctx.node_limit {
            return SearchStatus::NodeLimitReached;
        }
    } else {
        ctx.nodes_seen.fetch_add(1, Ordering::Relaxed);
    }
    ctx.monitor.on_node();

    let propagated = match propagate_to_fixed_point(ctx.model, ctx.watch, &state, ctx.monitor) {
        Ok(s) => s,
        Err(Inconsistent) => {
            ctx.monitor.on_backtrack();
            return SearchStatus::Continue;
        }
    };

    let Some(var) = select_variable(ctx.model, ctx.watch, &propagated, rng) else {
        ctx.monitor.on_solution();
        if ctx.sink.push(propagated) {
            ctx.cancel.trigger();
            return SearchStatus::SolutionLimitReached;
        }
        return SearchStatus::Continue;
    };

    let domain = propagated.get_domain(var).clone();
    let value = select_value(ctx.model, &domain, rng);
    let detect = ctx.model.config.enable_change_detection;

    if let Ok((child, _)) = propagated.set_domain(var, Domain::singleton(value, domain.capacity()), detect) {
        match dfs(ctx, child, rng) {
            SearchStatus::Continue => {}
            stop => return stop,
        }
    } else {
        ctx.monitor.on_backtrack();
    }

    if ctx.cancel.is_cancelled() {
        return SearchStatus::Cancelled;
    }

    let mut rest = domain;
    rest.remove(value);
    if rest.is_empty() {
        ctx.monitor.on_backtrack();
        return SearchStatus::Continue;
    }
    match propagated.set_domain(var, rest, detect) {
        Ok((child, _)) => dfs(ctx, child, rng),
        Err(Inconsistent) => {
            ctx.monitor.on_backtrack();
            SearchStatus::Continue
        }
    }
}

static DEFAULT_WORKERS: env_param::EnvParam<usize> = env_param::EnvParam::new("CLP_DEFAULT_WORKERS", "1");

fn effective_worker_count(configured: usize) -> usize {
    if configured == 0 {
        *DEFAULT_WORKERS.get()
    } else {
        configured
    }
}

/// Runs the root fixed point, then dispatches to sequential or parallel DFS. Returns every
/// solution found (up to `limit`, `0` = unbounded) and the reason the search stopped.
pub(crate) fn search(
    model: &Model,
    watch: &WatchLists,
    root: &SolverState,
    cancel: &Cancel,
    monitor: &dyn Monitor,
    limit: usize,
    node_limit: u64,
) -> (Vec<SolverState>, SearchStatus) {
    let sink = VecSink::new(limit);
    let status = search_with_sink(model, watch, root, cancel, monitor, node_limit, &sink);
    (sink.into_inner(), status)
}

/// As [`search`], but solutions are delivered to a caller-supplied [`SolutionSink`] (e.g. a
/// channel-backed sink for streaming) instead of collected into a `Vec`. `limit` is the
/// sink's own concern; callers that want a bounded solution count build a sink that
/// enforces it (as [`VecSink`] does).
pub(crate) fn search_with_sink(
    model: &Model,
    watch: &WatchLists,
    root: &SolverState,
    cancel: &Cancel,
    monitor: &dyn Monitor,
    node_limit: u64,
    sink: &dyn SolutionSink,
) -> SearchStatus {
    let propagated = match propagate_to_fixed_point(model, watch, root, monitor) {
        Ok(s) => s,
        Err(Inconsistent) => return SearchStatus::Continue,
    };

    let num_workers = effective_worker_count(model.config.num_workers);

    if num_workers <= 1 {
        let ctx = SearchCtx { model, watch, cancel, monitor, node_limit, nodes_seen: AtomicU64::new(0), sink };
        let mut rng = SmallRng::seed_from_u64(model.config.seed);
        return dfs(&ctx, propagated, &mut rng);
    }

    let mut seed_rng = SmallRng::seed_from_u64(model.config.seed);
    let Some(var) = select_variable(model, watch, &propagated, &mut seed_rng) else {
        ctx_solution_only(sink, propagated, monitor);
        return SearchStatus::Continue;
    };

    let domain = propagated.get_domain(var).clone();
    let values: Vec<IntCst> = domain.iter().collect();
    let num_shards = num_workers.min(values.len()).max(1);
    let mut shards: Vec<Vec<IntCst>> = vec![Vec::new(); num_shards];
    for (i, v) in values.iter().enumerate() {
        shards[i % num_shards].push(*v);
    }
    let detect = model.config.enable_change_detection;
    debug!(workers = num_shards, var = %var, "branching first decision across search workers");

    let mut overall_status = SearchStatus::Continue;
    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for (wi, shard) in shards.into_iter().enumerate() {
            if shard.is_empty() {
                continue;
            }
            let propagated = propagated.clone();
            let domain = domain.clone();
            let seed = model.config.seed ^ (wi as u64).wrapping_mul(0x9E3779B97F4A7C15);
            handles.push(scope.spawn(move || {
                let ctx = SearchCtx { model, watch, cancel, monitor, node_limit, nodes_seen: AtomicU64::new(0), sink };
                let mut rng = SmallRng::seed_from_u64(seed);
                let mut status = SearchStatus::Continue;
                for value in shard {
                    if cancel.is_cancelled() {
                        status = SearchStatus::Cancelled;
                        break;
                    }
                    match propagated.set_domain(var, Domain::singleton(value, domain.capacity()), detect) {
                        Ok((child, _)) => match dfs(&ctx, child, &mut rng) {
                            SearchStatus::Continue => {}
                            stop => {
                                status = stop;
                                break;
                            }
                        },
                        Err(Inconsistent) => {}
                    }
                }
                status
            }));
        }
        for handle in handles {
            if let Ok(status) = handle.join() {
                overall_status = merge_status(overall_status, status);
            }
        }
    });

    overall_status
}

fn ctx_solution_only(sink: &dyn SolutionSink, state: SolverState, monitor: &dyn Monitor) {
    monitor.on_solution();
    sink.push(state);
}

fn merge_status(current: SearchStatus, new: SearchStatus) -> SearchStatus {
    use SearchStatus::*;
    match (current, new) {
        (Cancelled, _) | (_, Cancelled) => Cancelled,
        (SolutionLimitReached, _) | (_, SolutionLimitReached) => SolutionLimitReached,
        (NodeLimitReached, _) | (_, NodeLimitReached) => NodeLimitReached,
        (Continue, Continue) => Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Config, Model};
    use crate::propagators::all_different::AllDifferent;

    fn four_queens_model(num_workers: usize) -> Model {
        let mut model = Model::new(Config { num_workers, domain_max_value: 4, ..Config::default() });
        let q: Vec<VarId> = (0..4).map(|_| model.new_var(1, 4).unwrap()).collect();
        model.post(Box::new(AllDifferent { vars: q.clone() })).unwrap();
        // diagonal non-attack: |q_i - q_j| != |i - j|, expressed as two Inequality pairs
        // per column pair via Table (small enough to enumerate directly).
        for i in 0..4 {
            for j in (i + 1)..4 {
                let dist = (j - i) as IntCst;
                let mut tuples = Vec::new();
                for a in 1..=4 {
                    for b in 1..=4 {
                        if a != b && (a - b).abs() != dist {
                            tuples.push(vec![a, b]);
                        }
                    }
                }
                model.post(Box::new(crate::propagators::table::Table { vars: vec![q[i], q[j]], tuples })).unwrap();
            }
        }
        model
    }

    #[test]
    fn four_queens_has_exactly_two_solutions_single_worker() {
        let model = four_queens_model(1);
        let watch = WatchLists::build(&model);
        let root = SolverState::new(model.initial_domains());
        let cancel = Cancel::new();
        let (solutions, status) = search(&model, &watch, &root, &cancel, &NoopMonitor, 0, 0);
        assert_eq!(status, SearchStatus::Continue);
        assert_eq!(solutions.len(), 2);
    }

    #[test]
    fn four_queens_has_exactly_two_solutions_multi_worker() {
        let model = four_queens_model(4);
        let watch = WatchLists::build(&model);
        let root = SolverState::new(model.initial_domains());
        let cancel = Cancel::new();
        let (solutions, _) = search(&model, &watch, &root, &cancel, &NoopMonitor, 0, 0);
        assert_eq!(solutions.len(), 2);
    }

    #[test]
    fn solution_limit_stops_search_early() {
        let model = four_queens_model(1);
        let watch = WatchLists::build(&model);
        let root = SolverState::new(model.initial_domains());
        let cancel = Cancel::new();
        let (solutions, status) = search(&model, &watch, &root, &cancel, &NoopMonitor, 1, 0);
        assert_eq!(solutions.len(), 1);
        assert_eq!(status, SearchStatus::SolutionLimitReached);
    }

    #[test]
    fn counting_monitor_observes_at_least_one_node_per_solution() {
        let model = four_queens_model(1);
        let watch = WatchLists::build(&model);
        let root = SolverState::new(model.initial_domains());
        let cancel = Cancel::new();
        let monitor = CountingMonitor::default();
        let (solutions, _) = search(&model, &watch, &root, &cancel, &monitor, 0, 0);
        assert_eq!(solutions.len(), 2);
        assert!(monitor.nodes.load(Ordering::Relaxed) >= 2);
        assert!(monitor.solutions.load(Ordering::Relaxed) == 2);
    }
}

//! `Model`: a set of variables and propagators plus the configuration search and
//! propagation obey while solving it.

use crate::core::{IntCst, Type, VarId};
use crate::domain::Domain;
use crate::error::ModelError;
use crate::propagator::Propagator;
use tracing::trace;

/// Which variable a search node branches on next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableHeuristic {
    /// Smallest domain, ties broken by degree (number of propagators touching the
    /// variable). Generalizes the teacher's `Activity`-style scoring.
    DomDeg,
    /// Smallest domain ("first-fail").
    Dom,
    /// Highest degree.
    Deg,
    /// First unbound variable in declaration order.
    Lex,
    /// Uniformly random unbound variable, seeded by `Config::seed`.
    Random,
}

/// Which value a search node tries first for the chosen variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueHeuristic {
    /// Smallest value first.
    Asc,
    /// Largest value first.
    Desc,
    /// Uniformly random value, seeded by `Config::seed`.
    Random,
    /// The value closest to the domain's midpoint.
    Middle,
}

/// Whether a propagator is re-queued on every individual domain write, or once per full
/// propagation pass. Both reach the same fixed point; `Eager` tends to do less redundant
/// work per step, `Lazy` does fewer, larger steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationMode {
    Eager,
    Lazy,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub variable_heuristic: VariableHeuristic,
    pub value_heuristic: ValueHeuristic,
    pub seed: u64,
    /// Number of OS-thread search workers. `0` lets the solver pick a default via
    /// `env_param` (`CLP_DEFAULT_WORKERS`).
    pub num_workers: usize,
    pub queue_capacity: usize,
    pub domain_max_value: IntCst,
    pub propagation_mode: PropagationMode,
    /// Whether `SolverState::set_domain` compares old/new domains before extending the
    /// chain. Documented as a neutral-to-negative performance tradeoff; off by default.
    pub enable_change_detection: bool,
    /// Whether propagators reuse `Domain` buffers via `state::pool`. Off by default.
    pub enable_pooling: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            variable_heuristic: VariableHeuristic::DomDeg,
            value_heuristic: ValueHeuristic::Asc,
            seed: 0,
            num_workers: 0,
            queue_capacity: 1024,
            domain_max_value: 1000,
            propagation_mode: PropagationMode::Eager,
            enable_change_detection: false,
            enable_pooling: false,
        }
    }
}

/// A record of what a global constraint built "by composition" expanded into: the
/// auxiliary variables it introduced and the primitive/global constraints posted on them.
/// Purely informational, for callers and tests inspecting how e.g. `Circuit` or `Stretch`
/// were compiled down.
#[derive(Debug, Clone)]
pub struct DecompositionEntry {
    pub constraint_name: &'static str,
    pub auxiliary_variables: Vec<VarId>,
    pub posted: Vec<&'static str>,
}

#[derive(Debug, Clone)]
struct VarEntry {
    domain: Domain,
    ty: Type,
}

/// A constraint model: a set of variables with initial domains, a set of propagators over
/// them, and the configuration the solver should use.
#[derive(Debug, Clone)]
pub struct Model {
    vars: Vec<VarEntry>,
    propagators: Vec<Box<dyn Propagator>>,
    decomposition: Vec<DecompositionEntry>,
    pub config: Config,
}

impl Model {
    pub fn new(config: Config) -> Self {
        Model {
            vars: Vec::new(),
            propagators: Vec::new(),
            decomposition: Vec::new(),
            config,
        }
    }

    pub fn domain_max_value(&self) -> IntCst {
        self.config.domain_max_value
    }

    /// Declares a new variable with domain `[lb..=ub]`. Fails if the resulting domain is
    /// empty or `ub` exceeds `Config::domain_max_value`.
    pub fn new_var(&mut self, lb: IntCst, ub: IntCst) -> Result<VarId, ModelError> {
        self.new_typed_var(lb, ub, Type::Int)
    }

    /// Declares a reified boolean variable, domain `{1, 2}` (false, true).
    pub fn new_bool_var(&mut self) -> Result<VarId, ModelError> {
        self.new_typed_var(1, 2, Type::Bool)
    }

    fn new_typed_var(&mut self, lb: IntCst, ub: IntCst, ty: Type) -> Result<VarId, ModelError> {
        let cap = self.config.domain_max_value;
        let domain = Domain::interval(lb, ub, cap);
        let id = VarId::from(self.vars.len());
        if domain.is_empty() {
            return Err(ModelError::EmptyInitialDomain(id));
        }
        trace!(var = %id, lb, ub, "declared variable");
        self.vars.push(VarEntry { domain, ty });
        Ok(id)
    }

    pub fn var_type(&self, var: VarId) -> Type {
        self.vars[usize::from(var)].ty
    }

    pub fn initial_domain(&self, var: VarId) -> &Domain {
        &self.vars[usize::from(var)].domain
    }

    pub fn num_variables(&self) -> usize {
        self.vars.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.vars.len()).map(VarId::from)
    }

    pub(crate) fn initial_domains(&self) -> Vec<Domain> {
        self.vars.iter().map(|v| v.domain.clone()).collect()
    }

    /// Registers a propagator, after checking its own argument constraints via
    /// [`Propagator::validate`] (spec.md §6: "Constraint constructors for every propagator...
    /// with documented argument constraints"; §7: these surface as "Model invalid" errors
    /// "returned from solve/constraint construction"). Rejects the propagator without
    /// adding it on a validation failure.
    pub fn post(&mut self, propagator: Box<dyn Propagator>) -> Result<(), ModelError> {
        propagator.validate()?;
        trace!(name = propagator.name(), "posting propagator");
        self.propagators.push(propagator);
        Ok(())
    }

    pub(crate) fn propagators(&self) -> &[Box<dyn Propagator>] {
        &self.propagators
    }

    /// Records how a global constraint built by composition expanded, for inspection by
    /// callers and tests.
    pub fn record_decomposition(&mut self, entry: DecompositionEntry) {
        self.decomposition.push(entry);
    }

    pub fn decomposition(&self) -> &[DecompositionEntry] {
        &self.decomposition
    }

    pub(crate) fn check_var(&self, var: VarId) -> Result<(), ModelError> {
        if usize::from(var) < self.vars.len() {
            Ok(())
        } else {
            Err(ModelError::UnknownVariable(var))
        }
    }
}

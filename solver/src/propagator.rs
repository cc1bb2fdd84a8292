//! The propagator trait every primitive and global constraint implements.

use crate::core::VarId;
use crate::error::{Inconsistent, ModelError};
use crate::state::SolverState;

/// A pure, stateless narrowing rule over a fixed set of variables.
///
/// `propagate` takes a `SolverState` and returns a new one in which its variables' domains
/// have been narrowed as far as the propagator's rule can derive, or `Err(Inconsistent)` if
/// no value assignment to its variables is consistent with the rule given the current
/// domains. Propagators never mutate in place (the input state is immutable) and never
/// retain state between calls: this solver backtracks chronologically and does not learn
/// conflict clauses, so there is no explanation hook to implement.
pub trait Propagator: Send + Sync {
    /// The variables this propagator reads and may narrow. Used to build the watch lists
    /// that decide which propagators are re-queued after a domain change.
    fn variables(&self) -> Vec<VarId>;

    /// Checks the propagator's own argument constraints (e.g. a strictly positive
    /// `Cumulative` duration, a non-zero `ScaledDivision` divisor) independently of any
    /// variable's domain. Called once by [`Model::post`](crate::model::Model::post) before
    /// the propagator is ever scheduled; `propagate` is free to assume a posted propagator
    /// already passed this check. Defaults to "always valid" for propagators with no
    /// constructor-level invariants to check.
    fn validate(&self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Narrows `state` as far as this propagator's rule allows.
    fn propagate(&self, state: &SolverState) -> Result<SolverState, Inconsistent>;

    fn clone_box(&self) -> Box<dyn Propagator>;

    /// A short, human-readable name used by `Model`'s decomposition log and by tracing
    /// spans. Defaults to the Rust type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl Clone for Box<dyn Propagator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl std::fmt::Debug for dyn Propagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:?})", self.name(), self.variables())
    }
}

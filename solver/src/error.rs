//! Error taxonomy. `ModelError` covers everything that can go wrong while *building* a
//! model (malformed constraints, unknown variables); `SolveError` covers everything that
//! can go wrong while *solving* one. Propagation failure (`Inconsistent`) is not part of
//! this taxonomy: it is an internal control-flow signal used during search and never
//! escapes `Solver::solve`/`Solver::optimize`.

use crate::core::{IntCst, VarId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("variable {0} has an empty initial domain")]
    EmptyInitialDomain(VarId),

    #[error("reference to an unknown variable: {0}")]
    UnknownVariable(VarId),

    #[error("duration must be strictly positive, got {0}")]
    NonPositiveDuration(IntCst),

    #[error("divisor must be strictly positive, got {0}")]
    NonPositiveDivisor(IntCst),

    #[error("{coefficients} coefficients were given for {variables} variables")]
    CoefficientVariableMismatch { coefficients: usize, variables: usize },

    #[error("domain max value must be strictly positive, got {0}")]
    InvalidDomainMax(IntCst),

    #[error("constraint requires at least one variable, got an empty sequence")]
    EmptySequence,

    #[error("capacity must be non-negative, got {0}")]
    NegativeCapacity(IntCst),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("search was cancelled")]
    Cancelled,

    #[error("model is invalid: {0}")]
    InvalidModel(#[from] ModelError),
}

/// Propagation failed: some propagator proved the current state has no solution.
/// Purely an internal control-flow marker for the fixed-point loop and search;
/// `thiserror`'s `Error` derive is deliberately not implemented for it, since it must
/// never be surfaced through the public `Result` types of `solve`/`optimize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inconsistent;

//! `clp`: a finite-domain constraint solver wearing a miniKanren-style relational surface.
//!
//! [`model::Model`] collects variables and propagators; [`solver::Solver`] runs fixed-point
//! propagation and backtracking search over a model to find or enumerate solutions;
//! [`relational`] gives the same solver a second, logic-programming-flavored front end
//! (`run`/`conde`/`fresh`) that can mix relational goals with finite-domain constraints via
//! [`hybrid`].

pub mod collections;
pub mod core;
pub mod domain;
pub mod error;
pub mod hybrid;
pub mod model;
pub mod propagator;
pub mod propagators;
pub mod reif;
pub mod relational;
pub mod search;
pub mod signals;
pub mod solver;
pub mod state;
pub mod utils;

pub use core::{IntCst, VarId};
pub use domain::Domain;
pub use error::{ModelError, SolveError};
pub use model::{Config, Model};
pub use solver::{SearchLimit, SolveOutcome, Solver};

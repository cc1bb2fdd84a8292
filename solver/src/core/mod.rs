//! Primitive identifiers shared across the crate: variable references and the integer
//! constant type propagators compute with.

use crate::create_ref_type;

/// The integer type all domains and linear arithmetic operate on.
pub type IntCst = i32;

create_ref_type!(VarId);

/// Domains are always over `[MIN_VALUE..=M]`, never zero or negative, per the 1-indexed
/// contract: integer domains only, one-indexed.
pub const MIN_VALUE: IntCst = 1;

/// A tag distinguishing plain finite-domain variables from reified booleans. Carried
/// purely for display/debugging purposes; it has no effect on propagation or search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    /// A variable whose domain is constructed as `{1, 2}`, standing for false/true.
    Bool,
}

impl std::fmt::Display for VarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.to_u32())
    }
}

impl std::fmt::Debug for VarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VarId({})", self.to_u32())
    }
}

use thiserror::Error;

/// Errors raised while constructing a constraint from malformed input.
///
/// These indicate a programming or modelling error rather than infeasibility; unlike an
/// [`Inconsistency`](crate::Inconsistency) they should not be caught by a search driver.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("a constraint requires at least one variable in its scope")]
    EmptyScope,
    #[error("row {row} of the table has {found} values but the scope has {expected} variables")]
    MismatchedArity {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("the scope of the constraint contains the same variable twice")]
    DuplicateVariable,
}

use thiserror::Error;

use crate::engine::ConstraintId;
use crate::engine::VariableId;

/// The result of any operation which filters domains.
///
/// An [`Err`] means that the current state of the solver cannot be extended to a solution; the
/// search driver is expected to restore to an earlier [`StateToken`](crate::StateToken).
pub type PropagationStatus = Result<(), Inconsistency>;

/// A recoverable failure raised during propagation.
///
/// Both variants mean the same thing for a search driver (the current branch is infeasible); the
/// variants only record which part of the model detected it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Inconsistency {
    /// The domain of the variable became empty.
    #[error("the domain of variable {0} became empty")]
    EmptyDomain(VariableId),
    /// The constraint detected that its scope cannot be satisfied, without necessarily emptying a
    /// domain first.
    #[error("constraint {0} cannot be satisfied")]
    Constraint(ConstraintId),
}

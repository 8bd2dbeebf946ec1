//! The constraints which can be posted to a [`Solver`](crate::Solver).
//!
//! Every constraint is created through a function which validates its arguments and returns a
//! [`ModelError`] for malformed input; the result is then posted with
//! [`Solver::post`](crate::Solver::post).
mod all_different;
mod constraint;
mod less_or_equal;
mod not_equal;
mod table;

pub use all_different::all_different;
pub use all_different::AllDifferent;
pub use constraint::Constraint;
pub use less_or_equal::less_or_equal;
pub use less_or_equal::LessOrEqual;
pub use not_equal::not_equal;
pub use not_equal::NotEqual;
pub use table::table;
pub use table::CompactTable;

use itertools::Itertools;

use crate::basic_types::ModelError;
use crate::engine::VariableId;

fn validate_scope(scope: &[VariableId]) -> Result<(), ModelError> {
    if scope.is_empty() {
        return Err(ModelError::EmptyScope);
    }
    if !scope.iter().all_unique() {
        return Err(ModelError::DuplicateVariable);
    }
    Ok(())
}

//! Search on top of the propagation engine.
//!
//! A [`Brancher`] looks at the current state of the [`Solver`](crate::Solver) and returns the
//! ordered [`Alternative`]s to explore; an empty list means every variable it is responsible
//! for is bound, i.e. the state is a solution. [`DepthFirstSearch`] explores the alternatives,
//! calling [`Solver::propagate`](crate::Solver::propagate) after each of them and restoring the
//! state when backtracking.
mod branching;
mod depth_first_search;

pub use branching::equal_or_not_equal;
pub use branching::Alternative;
pub use branching::Brancher;
pub use branching::FirstFail;
pub use branching::MaxMarginal;
pub use branching::MinEntropy;
pub use depth_first_search::DepthFirstSearch;
pub use depth_first_search::SearchStatistics;

//! A constraint solver whose propagation core interleaves two kinds of inference over the same
//! variable/constraint graph:
//! - classical propagation, which filters domains until a fixpoint is reached, and
//! - loopy belief propagation, which computes approximate marginals over the remaining values of
//!   every variable and is used to guide search.
//!
//! All mutable state of the graph lives in reversible cells handed out by a [`StateManager`], so
//! a search driver can snapshot the solver with [`Solver::save_state`] and roll back with
//! [`Solver::restore_state`].
//!
//! # Example
//! ```
//! use cpbp_core::constraints;
//! use cpbp_core::Solver;
//!
//! let mut solver = Solver::default();
//! let x = solver.new_variable(0, 2, Some("x"));
//! let y = solver.new_variable(0, 2, Some("y"));
//!
//! let table = constraints::table([x, y], vec![vec![0, 0], vec![1, 1]]).expect("well-formed");
//! let _ = solver.post(table).expect("the model is feasible");
//!
//! assert!(!solver.contains(x, 2));
//! assert!(!solver.contains(y, 2));
//! ```
pub(crate) mod basic_types;
pub mod containers;
pub(crate) mod cpbp_asserts;
pub(crate) mod engine;
pub mod state;

pub mod constraints;
pub mod search;
pub mod statistics;

pub use rand;

pub use crate::basic_types::Inconsistency;
pub use crate::basic_types::ModelError;
pub use crate::basic_types::PropagationStatus;
pub use crate::basic_types::Random;
pub use crate::engine::BeliefContext;
pub use crate::engine::ConstraintId;
pub use crate::engine::ConstraintWeighting;
pub use crate::engine::DomainDisplay;
pub use crate::engine::DomainEvent;
pub use crate::engine::DomainIter;
pub use crate::engine::DomainListener;
pub use crate::engine::EmptyDomain;
pub use crate::engine::PostContext;
pub use crate::engine::PropagationContext;
pub use crate::engine::PropagationMode;
pub use crate::engine::ReadDomains;
pub use crate::engine::Solver;
pub use crate::engine::SolverOptions;
pub use crate::engine::SolverStatistics;
pub use crate::engine::SparseDomain;
pub use crate::engine::VariableId;
pub use crate::state::StateManager;
pub use crate::state::StateStrategy;
pub use crate::state::StateToken;

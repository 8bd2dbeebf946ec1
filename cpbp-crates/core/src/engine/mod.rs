//! The propagation engine: variables and their domains, the queue of scheduled constraints, and
//! the [`Solver`] which drives the fixpoint and belief-propagation loops over them.
mod belief_propagation;
mod constraint_queue;
mod constraint_state;
mod contexts;
mod domain;
mod domain_events;
mod options;
mod solver;
mod solver_statistics;
mod variable;

pub(crate) use constraint_queue::ConstraintQueue;
pub(crate) use constraint_state::ConstraintBeliefs;
pub use constraint_state::ConstraintId;
pub(crate) use constraint_state::ConstraintState;
pub use contexts::BeliefContext;
pub use contexts::PostContext;
pub use contexts::PropagationContext;
pub use contexts::ReadDomains;
pub use domain::DomainDisplay;
pub use domain::DomainIter;
pub use domain::DomainListener;
pub use domain::EmptyDomain;
pub use domain::SparseDomain;
pub use domain_events::DomainEvent;
pub(crate) use domain_events::EventCollector;
pub use options::ConstraintWeighting;
pub use options::PropagationMode;
pub use options::SolverOptions;
pub use solver::Solver;
pub use solver_statistics::SolverStatistics;
pub(crate) use variable::IntVariable;
pub use variable::VariableId;

use downcast_rs::impl_downcast;
use downcast_rs::Downcast;

use crate::basic_types::PropagationStatus;
use crate::engine::BeliefContext;
use crate::engine::PostContext;
use crate::engine::PropagationContext;
use crate::engine::VariableId;
#[cfg(doc)]
use crate::engine::DomainEvent;
#[cfg(doc)]
use crate::Inconsistency;
#[cfg(doc)]
use crate::Solver;

// Allows `Solver::get_constraint` to hand out the concrete type of a `Box<dyn Constraint>`.
impl_downcast!(Constraint);

/// A constraint removes values which cannot be part of any solution, and gives its opinion on
/// how likely every value of its scope is to be part of one.
///
/// The solver owns the belief storage of every constraint and drives both protocols:
/// - [`Constraint::propagate`] is called whenever an event the constraint subscribed to (in
///   [`Constraint::post`]) happens, until no constraint is scheduled any more;
/// - [`Constraint::update_belief`] is called once per belief-propagation round.
///
/// Constraints may keep scratch data across calls, but anything which must survive
/// backtracking has to live in the reversible state of the solver.
pub trait Constraint: Downcast + std::fmt::Debug {
    /// Return the name of the constraint, used for logging.
    fn name(&self) -> &str;

    /// The variables the constraint is defined over, in the order in which
    /// [`BeliefContext`] addresses them.
    fn scope(&self) -> &[VariableId];

    /// Subscribes to the [`DomainEvent`]s of the variables in the scope.
    ///
    /// Initial filtering is not done here; the solver schedules the constraint right after
    /// posting it.
    fn post(&mut self, context: PostContext<'_>);

    /// Removes the values which have no support given the current domains.
    ///
    /// Returns [`Inconsistency`] if a domain became empty or the constraint detected that it
    /// cannot be satisfied. Constraints are not required to reach a fixpoint on their own;
    /// removals schedule the constraint again.
    fn propagate(&mut self, context: PropagationContext<'_>) -> PropagationStatus;

    /// Computes the local belief of every live value of every variable in the scope from the
    /// outside beliefs.
    ///
    /// By default every live value is equally likely.
    fn update_belief(&mut self, mut context: BeliefContext<'_>) {
        for position in 0..context.arity() {
            context.set_local_belief_of_live_values(position, 1.0);
        }
    }

    /// Whether [`Constraint::update_belief`] computes exact weighted model counts. Only such
    /// constraints are trusted to remove or assign values based on a belief of 0 or 1.
    fn weighted_counting(&self) -> bool {
        false
    }
}

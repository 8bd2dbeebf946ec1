//! The views of the solver handed to constraints: [`PostContext`] when they are posted,
//! [`PropagationContext`] when they filter, and [`BeliefContext`] when they compute beliefs.
//! All three can read domains through [`ReadDomains`].
mod belief_context;
mod post_context;
mod propagation_context;

pub use belief_context::BeliefContext;
pub use post_context::PostContext;
pub use propagation_context::PropagationContext;

use super::ConstraintId;
use super::ConstraintQueue;
use super::ConstraintState;
use super::DomainIter;
use super::EmptyDomain;
use super::EventCollector;
use super::IntVariable;
use super::SparseDomain;
use super::VariableId;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::containers::KeyedVec;
use crate::state::ReversibleCell;
use crate::state::StateManager;

/// Read access to the domains of the variables.
pub trait ReadDomains {
    fn domain(&self, variable: VariableId) -> &SparseDomain;

    fn state(&self) -> &StateManager;

    fn size(&self, variable: VariableId) -> usize {
        self.domain(variable).size(self.state())
    }

    fn min(&self, variable: VariableId) -> i32 {
        self.domain(variable).min(self.state())
    }

    fn max(&self, variable: VariableId) -> i32 {
        self.domain(variable).max(self.state())
    }

    fn contains(&self, variable: VariableId, value: i32) -> bool {
        self.domain(variable).contains(value, self.state())
    }

    fn is_bound(&self, variable: VariableId) -> bool {
        self.domain(variable).is_bound(self.state())
    }

    /// See [`SparseDomain::fill_array`].
    fn fill_array(&self, variable: VariableId, destination: &mut [i32]) -> usize {
        self.domain(variable).fill_array(destination, self.state())
    }

    fn iterate_domain(&self, variable: VariableId) -> DomainIter<'_> {
        self.domain(variable).iter(self.state())
    }

    fn marginal(&self, variable: VariableId, value: i32) -> f64 {
        self.domain(variable).marginal(value, self.state())
    }
}

/// Applies `operation` to the domain of `variable` and schedules the active constraints watching
/// the events it fired.
pub(crate) fn mutate_domain(
    state: &mut StateManager,
    variables: &mut KeyedVec<VariableId, IntVariable>,
    queue: &mut ConstraintQueue,
    constraint_states: &KeyedVec<ConstraintId, ConstraintState>,
    variable: VariableId,
    operation: impl FnOnce(
        &mut SparseDomain,
        &mut StateManager,
        &mut EventCollector,
    ) -> Result<(), EmptyDomain>,
) -> PropagationStatus {
    let mut collector = EventCollector::default();
    let int_variable = &mut variables[variable];

    operation(&mut int_variable.domain, &mut *state, &mut collector)
        .map_err(|EmptyDomain| Inconsistency::EmptyDomain(variable))?;

    let state = &*state;
    int_variable.for_each_watcher(collector.events, state, |constraint| {
        if constraint_states[constraint].active.get(state) {
            queue.enqueue(constraint);
        }
    });

    Ok(())
}

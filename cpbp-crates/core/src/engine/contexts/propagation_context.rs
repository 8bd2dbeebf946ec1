use super::mutate_domain;
use super::ReadDomains;
use crate::basic_types::PropagationStatus;
use crate::containers::KeyedVec;
use crate::engine::ConstraintId;
use crate::engine::ConstraintQueue;
use crate::engine::ConstraintState;
use crate::engine::EmptyDomain;
use crate::engine::EventCollector;
use crate::engine::IntVariable;
use crate::engine::SparseDomain;
use crate::engine::VariableId;
use crate::state::ReversibleCell;
use crate::state::StateManager;

/// Provided to a constraint when it filters domains.
///
/// Every removal schedules the active constraints watching the events it causes, including the
/// constraint which is currently propagating.
#[derive(Debug)]
pub struct PropagationContext<'a> {
    pub(crate) state: &'a mut StateManager,
    pub(crate) variables: &'a mut KeyedVec<VariableId, IntVariable>,
    pub(crate) queue: &'a mut ConstraintQueue,
    pub(crate) constraint_states: &'a KeyedVec<ConstraintId, ConstraintState>,
    pub(crate) constraint_id: ConstraintId,
}

impl ReadDomains for PropagationContext<'_> {
    fn domain(&self, variable: VariableId) -> &SparseDomain {
        &self.variables[variable].domain
    }

    fn state(&self) -> &StateManager {
        self.state
    }
}

impl PropagationContext<'_> {
    pub fn constraint_id(&self) -> ConstraintId {
        self.constraint_id
    }

    fn mutate(
        &mut self,
        variable: VariableId,
        operation: impl FnOnce(
            &mut SparseDomain,
            &mut StateManager,
            &mut EventCollector,
        ) -> Result<(), EmptyDomain>,
    ) -> PropagationStatus {
        mutate_domain(
            self.state,
            self.variables,
            self.queue,
            self.constraint_states,
            variable,
            operation,
        )
    }

    pub fn remove(&mut self, variable: VariableId, value: i32) -> PropagationStatus {
        self.mutate(variable, |domain, state, listener| {
            domain.remove(value, state, listener)
        })
    }

    /// Removes every value of `variable` except `value`.
    pub fn assign(&mut self, variable: VariableId, value: i32) -> PropagationStatus {
        self.mutate(variable, |domain, state, listener| {
            domain.remove_all_but(value, state, listener)
        })
    }

    pub fn remove_below(&mut self, variable: VariableId, value: i32) -> PropagationStatus {
        self.mutate(variable, |domain, state, listener| {
            domain.remove_below(value, state, listener)
        })
    }

    pub fn remove_above(&mut self, variable: VariableId, value: i32) -> PropagationStatus {
        self.mutate(variable, |domain, state, listener| {
            domain.remove_above(value, state, listener)
        })
    }

    /// Retires the constraint until the search backtracks past this point; it will not be
    /// scheduled nor take part in belief propagation.
    pub fn set_inactive(&mut self) {
        self.constraint_states[self.constraint_id]
            .active
            .set(self.state, false);
    }
}


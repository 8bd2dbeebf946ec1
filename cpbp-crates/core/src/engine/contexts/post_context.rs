use super::ReadDomains;
use crate::containers::KeyedVec;
use crate::engine::ConstraintId;
use crate::engine::DomainEvent;
use crate::engine::IntVariable;
use crate::engine::SparseDomain;
use crate::engine::VariableId;
use crate::state::StateManager;

/// Provided to a constraint when it is posted, to subscribe to the events of its variables.
#[derive(Debug)]
pub struct PostContext<'a> {
    pub(crate) state: &'a mut StateManager,
    pub(crate) variables: &'a mut KeyedVec<VariableId, IntVariable>,
    pub(crate) constraint_id: ConstraintId,
}

impl ReadDomains for PostContext<'_> {
    fn domain(&self, variable: VariableId) -> &SparseDomain {
        &self.variables[variable].domain
    }

    fn state(&self) -> &StateManager {
        self.state
    }
}

impl PostContext<'_> {
    pub fn constraint_id(&self) -> ConstraintId {
        self.constraint_id
    }

    /// Schedules the constraint whenever `event` happens on `variable`.
    pub fn register(&mut self, variable: VariableId, event: DomainEvent) {
        self.variables[variable].watch(self.constraint_id, event, self.state);
    }
}

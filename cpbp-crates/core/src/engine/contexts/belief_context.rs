use super::ReadDomains;
use crate::containers::KeyedVec;
use crate::cpbp_assert_moderate;
use crate::engine::ConstraintBeliefs;
use crate::engine::IntVariable;
use crate::engine::SparseDomain;
use crate::engine::VariableId;
use crate::state::StateManager;

/// Provided to a constraint when it computes its local beliefs.
///
/// Variables are addressed by their position in the scope of the constraint. Before the
/// constraint is called, the local belief of every live value is zero; values whose belief is
/// never set are therefore considered unsupported. The engine normalizes the local beliefs per
/// variable afterwards, so they only need to be proportional.
#[derive(Debug)]
pub struct BeliefContext<'a> {
    pub(crate) state: &'a mut StateManager,
    pub(crate) variables: &'a KeyedVec<VariableId, IntVariable>,
    pub(crate) beliefs: &'a ConstraintBeliefs,
}

impl ReadDomains for BeliefContext<'_> {
    fn domain(&self, variable: VariableId) -> &SparseDomain {
        &self.variables[variable].domain
    }

    fn state(&self) -> &StateManager {
        self.state
    }
}

impl BeliefContext<'_> {
    pub fn arity(&self) -> usize {
        self.beliefs.scope().len()
    }

    pub fn variable(&self, position: usize) -> VariableId {
        self.beliefs.scope()[position]
    }

    /// The (normalized) message the rest of the model sends about `value` of the variable at
    /// `position`; zero if `value` is not in the domain.
    pub fn outside_belief(&self, position: usize, value: i32) -> f64 {
        if self.contains(self.variable(position), value) {
            self.beliefs.outside(position, value)
        } else {
            0.0
        }
    }

    /// Sets the local belief of every live value of the variable at `position` to `belief`.
    pub fn set_local_belief_of_live_values(&mut self, position: usize, belief: f64) {
        cpbp_assert_moderate!(
            belief >= 0.0 && belief.is_finite(),
            "Local belief {belief} is not a non-negative number"
        );
        let variables = self.variables;
        let domain = &variables[self.variable(position)].domain;
        for value in domain.iter(&*self.state) {
            self.beliefs.set_local(position, value, belief, self.state);
        }
    }

    pub fn set_local_belief(&mut self, position: usize, value: i32, belief: f64) {
        cpbp_assert_moderate!(
            belief >= 0.0 && belief.is_finite(),
            "Local belief {belief} is not a non-negative number"
        );
        self.beliefs.set_local(position, value, belief, self.state);
    }
}

use std::sync::Arc;

use log::debug;

use super::contexts::mutate_domain;
use super::ConstraintBeliefs;
use super::ConstraintId;
use super::ConstraintQueue;
use super::ConstraintState;
use super::DomainDisplay;
use super::DomainIter;
use super::EmptyDomain;
use super::EventCollector;
use super::IntVariable;
use super::PostContext;
use super::PropagationContext;
use super::PropagationMode;
use super::SolverOptions;
use super::SolverStatistics;
use super::SparseDomain;
use super::VariableId;
use crate::basic_types::PropagationStatus;
use crate::constraints::Constraint;
use crate::containers::KeyedVec;
use crate::cpbp_assert_simple;
use crate::state::ReversibleCell;
use crate::state::ReversibleStore;
use crate::state::StateManager;
use crate::state::StateToken;
use crate::statistics::log_statistic_postfix;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;
use crate::Inconsistency;

/// The registry of variables and constraints, and the driver of both propagation loops.
///
/// Variables and constraints are created once and never removed; everything which changes
/// during search lives in the reversible state, which is saved with [`Solver::save_state`] and
/// rolled back with [`Solver::restore_state`].
///
/// Mutations made through [`Solver::remove`], [`Solver::assign`] and friends only schedule the
/// affected constraints; [`Solver::propagate`] has to be called afterwards.
#[derive(Debug)]
pub struct Solver {
    pub(crate) options: SolverOptions,
    pub(crate) state: StateManager,
    pub(crate) variables: KeyedVec<VariableId, IntVariable>,
    pub(crate) constraints: KeyedVec<ConstraintId, Box<dyn Constraint>>,
    pub(crate) constraint_states: KeyedVec<ConstraintId, ConstraintState>,
    pub(crate) queue: ConstraintQueue,
    pub(crate) statistics: SolverStatistics,
}

impl Default for Solver {
    fn default() -> Self {
        Solver::with_options(SolverOptions::default())
    }
}

impl Solver {
    pub fn with_options(options: SolverOptions) -> Solver {
        cpbp_assert_simple!(
            (0.0..=1.0).contains(&options.damping_factor),
            "The damping factor {} lies outside [0, 1]",
            options.damping_factor
        );
        cpbp_assert_simple!(
            options.mode == PropagationMode::Classical || options.belief_rounds > 0,
            "Belief propagation needs at least one round"
        );

        Solver {
            state: StateManager::new(options.state_strategy),
            options,
            variables: KeyedVec::default(),
            constraints: KeyedVec::default(),
            constraint_states: KeyedVec::default(),
            queue: ConstraintQueue::default(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn statistics(&self) -> SolverStatistics {
        self.statistics
    }

    /// Writes the statistics through the configured statistic logging.
    pub fn log_statistics(&self) {
        self.statistics.log(StatisticLogger::default());
        log_statistic_postfix();
    }
}

/// Model construction.
impl Solver {
    /// Creates a variable with domain `[lower_bound, upper_bound]`.
    pub fn new_variable(
        &mut self,
        lower_bound: i32,
        upper_bound: i32,
        name: Option<&str>,
    ) -> VariableId {
        let domain = SparseDomain::new(lower_bound, upper_bound, &mut self.state);
        self.add_variable(domain, name)
    }

    /// Creates a variable whose domain contains exactly `values`.
    pub fn new_sparse_variable(&mut self, values: &[i32], name: Option<&str>) -> VariableId {
        let domain = SparseDomain::new_sparse(values, &mut self.state);
        self.add_variable(domain, name)
    }

    fn add_variable(&mut self, domain: SparseDomain, name: Option<&str>) -> VariableId {
        let name = name.map(Arc::from);
        let variable = IntVariable::new(name, domain, &mut self.state);
        self.variables.push(variable)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = VariableId> {
        self.variables.keys()
    }

    pub fn variable_name(&self, variable: VariableId) -> Option<&str> {
        self.variables[variable].name.as_deref()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Adds a constraint to the model.
    ///
    /// Unless the solver only does belief propagation, the constraint filters the domains
    /// immediately and the fixpoint is computed, which fails if the model is found to be
    /// infeasible.
    pub fn post(&mut self, constraint: impl Constraint) -> Result<ConstraintId, Inconsistency> {
        let constraint_id = self.constraints.next_key();
        let mut constraint: Box<dyn Constraint> = Box::new(constraint);

        let weight = self.options.weighting.weight(constraint.scope().len());
        let beliefs =
            ConstraintBeliefs::new(constraint.scope(), &self.variables, weight, &mut self.state);
        let active = self.state.new_bool(true);

        constraint.post(PostContext {
            state: &mut self.state,
            variables: &mut self.variables,
            constraint_id,
        });
        debug!(
            "Posted {} as {constraint_id} over {} variables",
            constraint.name(),
            constraint.scope().len()
        );

        let _ = self.constraints.push(constraint);
        let _ = self
            .constraint_states
            .push(ConstraintState { active, beliefs });

        if self.options.mode != PropagationMode::Belief {
            self.queue.enqueue(constraint_id);
            self.fix_point()?;
        }

        Ok(constraint_id)
    }

    /// Returns the constraint with the given id if it is of type `C`.
    pub fn get_constraint<C: Constraint>(&self, constraint: ConstraintId) -> Option<&C> {
        self.constraints.get(constraint)?.downcast_ref::<C>()
    }

    /// Whether the constraint is still taking part in propagation, i.e. it has not been
    /// subsumed.
    pub fn is_active(&self, constraint: ConstraintId) -> bool {
        self.constraint_states[constraint].active.get(&self.state)
    }
}

/// Propagation.
impl Solver {
    /// Runs the inference configured by [`SolverOptions::mode`].
    pub fn propagate(&mut self) -> PropagationStatus {
        match self.options.mode {
            PropagationMode::Classical => self.fix_point(),
            PropagationMode::Belief => {
                self.queue.clear();
                self.belief_propagation()
            }
            PropagationMode::Hybrid => {
                self.fix_point()?;
                self.belief_propagation()
            }
        }
    }

    /// Propagates scheduled constraints until none is scheduled any more.
    ///
    /// On failure the queue is emptied before the inconsistency is returned.
    pub fn fix_point(&mut self) -> PropagationStatus {
        self.statistics.num_fixpoints += 1;

        let result = self.propagate_scheduled();
        if let Err(inconsistency) = result {
            self.queue.clear();
            self.statistics.num_failures += 1;
            debug!("Fixpoint failed: {inconsistency}");
        }

        result
    }

    fn propagate_scheduled(&mut self) -> PropagationStatus {
        while let Some(constraint_id) = self.queue.pop() {
            if !self.constraint_states[constraint_id].active.get(&self.state) {
                continue;
            }

            self.statistics.num_propagations += 1;
            let context = PropagationContext {
                state: &mut self.state,
                variables: &mut self.variables,
                queue: &mut self.queue,
                constraint_states: &self.constraint_states,
                constraint_id,
            };
            self.constraints[constraint_id].propagate(context)?;
        }

        Ok(())
    }

    pub(crate) fn mutate(
        &mut self,
        variable: VariableId,
        operation: impl FnOnce(
            &mut SparseDomain,
            &mut StateManager,
            &mut EventCollector,
        ) -> Result<(), EmptyDomain>,
    ) -> PropagationStatus {
        mutate_domain(
            &mut self.state,
            &mut self.variables,
            &mut self.queue,
            &self.constraint_states,
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
}

/// Reversible state.
impl Solver {
    pub fn save_state(&mut self) -> StateToken {
        self.state.save_state()
    }

    /// Restores the state saved as `token`; the queue of scheduled constraints is emptied.
    pub fn restore_state(&mut self, token: StateToken) {
        self.queue.clear();
        self.state.restore_state(token);
    }

    /// The number of snapshots which are currently saved.
    pub fn level(&self) -> usize {
        self.state.level()
    }

    /// Runs `body` and restores the state from before the call afterwards.
    pub fn with_new_state<R>(&mut self, body: impl FnOnce(&mut Solver) -> R) -> R {
        let token = self.save_state();
        let result = body(self);
        self.restore_state(token);
        result
    }
}

/// Domain and marginal queries.
impl Solver {
    fn domain(&self, variable: VariableId) -> &SparseDomain {
        &self.variables[variable].domain
    }

    pub fn size(&self, variable: VariableId) -> usize {
        self.domain(variable).size(&self.state)
    }

    pub fn min(&self, variable: VariableId) -> i32 {
        self.domain(variable).min(&self.state)
    }

    pub fn max(&self, variable: VariableId) -> i32 {
        self.domain(variable).max(&self.state)
    }

    pub fn contains(&self, variable: VariableId, value: i32) -> bool {
        self.domain(variable).contains(value, &self.state)
    }

    pub fn is_bound(&self, variable: VariableId) -> bool {
        self.domain(variable).is_bound(&self.state)
    }

    /// The value of `variable` if it is bound.
    pub fn value(&self, variable: VariableId) -> Option<i32> {
        self.is_bound(variable).then(|| self.min(variable))
    }

    /// The members of the domain of `variable`, in no particular order.
    pub fn values(&self, variable: VariableId) -> DomainIter<'_> {
        self.domain(variable).iter(&self.state)
    }

    pub fn display_domain(&self, variable: VariableId) -> DomainDisplay {
        self.domain(variable).display(&self.state)
    }

    pub fn marginal(&self, variable: VariableId, value: i32) -> f64 {
        self.domain(variable).marginal(value, &self.state)
    }

    pub fn value_with_max_marginal(&self, variable: VariableId) -> i32 {
        self.domain(variable).value_with_max_marginal(&self.state)
    }

    pub fn value_with_min_marginal(&self, variable: VariableId) -> i32 {
        self.domain(variable).value_with_min_marginal(&self.state)
    }

    pub fn max_marginal(&self, variable: VariableId) -> f64 {
        self.domain(variable).max_marginal(&self.state)
    }

    pub fn max_marginal_regret(&self, variable: VariableId) -> f64 {
        self.domain(variable).max_marginal_regret(&self.state)
    }

    pub fn entropy(&self, variable: VariableId) -> f64 {
        self.domain(variable).entropy(&self.state)
    }

    /// A member of the domain of `variable` chosen uniformly at random.
    pub fn random_value(&mut self, variable: VariableId) -> i32 {
        self.variables[variable]
            .domain
            .random_value(&mut self.options.random_generator, &self.state)
    }

    /// A member of the domain of `variable` chosen with probability proportional to its
    /// marginal.
    pub fn biased_wheel_value(&mut self, variable: VariableId) -> i32 {
        self.variables[variable]
            .domain
            .biased_wheel_value(&mut self.options.random_generator, &self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints;
    use crate::constraints::LessOrEqual;
    use crate::state::StateStrategy;

    fn classical() -> Solver {
        Solver::with_options(SolverOptions {
            mode: PropagationMode::Classical,
            ..Default::default()
        })
    }

    #[test]
    fn posting_filters_immediately() {
        let mut solver = classical();
        let x = solver.new_variable(0, 5, Some("x"));
        let y = solver.new_variable(0, 3, Some("y"));

        let _ = solver
            .post(constraints::less_or_equal(x, y).unwrap())
            .unwrap();

        assert_eq!(solver.max(x), 3);
        assert_eq!(solver.variable_name(x), Some("x"));
    }

    #[test]
    fn branching_schedules_watchers_until_propagation() {
        let mut solver = classical();
        let x = solver.new_variable(0, 5, None);
        let y = solver.new_variable(0, 5, None);
        let _ = solver
            .post(constraints::less_or_equal(x, y).unwrap())
            .unwrap();

        solver.remove_above(y, 2).unwrap();
        assert_eq!(solver.max(x), 5);

        solver.propagate().unwrap();
        assert_eq!(solver.max(x), 2);
    }

    #[test]
    fn failure_empties_the_queue() {
        let mut solver = classical();
        let x = solver.new_variable(0, 5, None);
        let y = solver.new_variable(0, 5, None);
        let _ = solver
            .post(constraints::less_or_equal(x, y).unwrap())
            .unwrap();

        let token = solver.save_state();
        solver.remove_above(y, 2).unwrap();
        solver.remove_below(x, 3).unwrap();
        assert!(solver.propagate().is_err());
        assert!(solver.queue.is_empty());
        assert_eq!(solver.statistics().num_failures, 1);

        solver.restore_state(token);
        assert_eq!(solver.max(y), 5);
        assert!(solver.propagate().is_ok());
    }

    #[test]
    fn restoring_returns_domains_and_marginals() {
        for strategy in [StateStrategy::Trail, StateStrategy::Copy] {
            let mut solver = Solver::with_options(SolverOptions {
                state_strategy: strategy,
                ..Default::default()
            });
            let x = solver.new_variable(0, 3, None);
            let y = solver.new_variable(0, 3, None);
            let _ = solver
                .post(constraints::less_or_equal(x, y).unwrap())
                .unwrap();
            solver.propagate().unwrap();
            let marginals = (0..=3).map(|v| solver.marginal(x, v)).collect::<Vec<_>>();

            let token = solver.save_state();
            solver.assign(y, 1).unwrap();
            solver.propagate().unwrap();
            assert_eq!(solver.display_domain(x).to_string(), "{0, 1}");
            solver.restore_state(token);

            assert_eq!(solver.display_domain(x).to_string(), "{0, 1, 2, 3}");
            let restored = (0..=3).map(|v| solver.marginal(x, v)).collect::<Vec<_>>();
            assert_eq!(marginals, restored);
        }
    }

    #[test]
    fn with_new_state_rolls_back() {
        let mut solver = Solver::default();
        let x = solver.new_variable(0, 3, None);

        let size_inside = solver.with_new_state(|solver| {
            solver.assign(x, 2).unwrap();
            solver.size(x)
        });

        assert_eq!(size_inside, 1);
        assert_eq!(solver.size(x), 4);
        assert_eq!(solver.level(), 0);
    }

    #[test]
    fn values_and_bindings_are_reported() {
        let mut solver = Solver::default();
        let x = solver.new_sparse_variable(&[4, 7, 9], Some("x"));

        assert_eq!(solver.value(x), None);
        solver.remove(x, 7).unwrap();
        solver.remove(x, 9).unwrap();
        assert_eq!(solver.value(x), Some(4));
        assert_eq!(
            solver.remove(x, 4),
            Err(Inconsistency::EmptyDomain(x))
        );
    }

    #[test]
    fn constraints_can_be_retrieved_by_type() {
        let mut solver = Solver::default();
        let x = solver.new_variable(0, 3, None);
        let y = solver.new_variable(0, 3, None);
        let id = solver
            .post(constraints::less_or_equal(x, y).unwrap())
            .unwrap();

        let constraint = solver.get_constraint::<LessOrEqual>(id);
        assert!(constraint.is_some());
        assert!(solver
            .get_constraint::<constraints::AllDifferent>(id)
            .is_none());
    }
}

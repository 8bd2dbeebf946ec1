//! Loopy belief propagation over the constraint graph.
//!
//! One round consists of four sweeps:
//! 1. every active constraint receives, for each value of each variable in its scope, the
//!    marginal of the variable divided by the weighted local belief the constraint contributed
//!    to it in the previous round (the belief of the rest of the model), normalized per
//!    variable;
//! 2. the marginals of all variables are reset to 1;
//! 3. every active constraint computes its local beliefs from those messages and multiplies them
//!    (raised to its weight) into the marginals;
//! 4. the marginals of all variables are normalized.
use log::trace;

use super::contexts::mutate_domain;
use super::BeliefContext;
use super::ConstraintBeliefs;
use super::ConstraintId;
use super::IntVariable;
use super::Solver;
use super::VariableId;
use crate::basic_types::PropagationStatus;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::state::StateManager;

impl Solver {
    /// Runs the configured number of belief-propagation rounds.
    ///
    /// This only fails if acting on beliefs of 0 or 1 is enabled and doing so leads to an
    /// inconsistency.
    pub fn belief_propagation(&mut self) -> PropagationStatus {
        let damping_factor = self
            .options
            .damping
            .then_some(self.options.damping_factor);

        for state in self.constraint_states.iter_mut() {
            state.beliefs.start_belief_propagation();
        }

        for round in 0..self.options.belief_rounds {
            self.statistics.num_belief_rounds += 1;

            for index in 0..self.constraints.len() {
                let constraint_id = ConstraintId::create_from_index(index);
                if self.is_active(constraint_id) {
                    receive_messages(
                        &mut self.constraint_states[constraint_id].beliefs,
                        &self.variables,
                        &self.state,
                        damping_factor,
                    );
                }
            }

            for variable in self.variables.iter() {
                variable.domain.reset_marginals(&mut self.state);
            }

            for index in 0..self.constraints.len() {
                let constraint_id = ConstraintId::create_from_index(index);
                if self.is_active(constraint_id) {
                    self.send_messages(constraint_id)?;
                }
            }

            // Bound variables end up with marginal 1 for their value.
            for variable in self.variables.iter() {
                variable.domain.normalize_marginals(&mut self.state);
            }

            trace!(
                "Belief propagation round {} of {} done",
                round + 1,
                self.options.belief_rounds
            );
        }

        Ok(())
    }

    fn send_messages(&mut self, constraint_id: ConstraintId) -> PropagationStatus {
        let beliefs = &self.constraint_states[constraint_id].beliefs;

        for (position, &variable) in beliefs.scope().iter().enumerate() {
            for value in self.variables[variable].domain.iter(&self.state) {
                beliefs.set_local(position, value, 0.0, &mut self.state);
            }
        }

        self.constraints[constraint_id].update_belief(BeliefContext {
            state: &mut self.state,
            variables: &self.variables,
            beliefs,
        });

        normalize_local(beliefs, &self.variables, &mut self.state);

        if self.options.acting_on_zero_one_belief
            && self.constraints[constraint_id].weighted_counting()
        {
            self.act_on_zero_one_belief(constraint_id)?;
        }

        let beliefs = &self.constraint_states[constraint_id].beliefs;
        for (position, &variable) in beliefs.scope().iter().enumerate() {
            let domain = &self.variables[variable].domain;
            if domain.is_bound(&self.state) {
                continue;
            }
            for value in domain.iter(&self.state) {
                let local = beliefs.local(position, value, &self.state);
                let marginal = domain.marginal(value, &self.state) * local.powf(beliefs.weight);
                domain.set_marginal(value, marginal, &mut self.state);
            }
        }

        Ok(())
    }

    /// Removes the values with local belief 0 and assigns the values with local belief 1, then
    /// computes the fixpoint.
    fn act_on_zero_one_belief(&mut self, constraint_id: ConstraintId) -> PropagationStatus {
        let beliefs = &self.constraint_states[constraint_id].beliefs;

        let mut actions: Vec<(VariableId, i32, bool)> = vec![];
        for (position, &variable) in beliefs.scope().iter().enumerate() {
            let domain = &self.variables[variable].domain;
            if domain.is_bound(&self.state) {
                continue;
            }
            for value in domain.iter(&self.state) {
                let local = beliefs.local(position, value, &self.state);
                if local == 0.0 {
                    actions.push((variable, value, false));
                } else if local == 1.0 {
                    actions.push((variable, value, true));
                }
            }
        }

        if actions.is_empty() {
            return Ok(());
        }

        let result = actions.into_iter().try_for_each(|(variable, value, assign)| {
            trace!(
                "Belief of {variable} = {value} is {}; {}",
                u8::from(assign),
                if assign { "assigning" } else { "removing" }
            );
            self.statistics.num_belief_actions += 1;
            mutate_domain(
                &mut self.state,
                &mut self.variables,
                &mut self.queue,
                &self.constraint_states,
                variable,
                |domain, state, listener| {
                    if assign {
                        domain.remove_all_but(value, state, listener)
                    } else {
                        domain.remove(value, state, listener)
                    }
                },
            )
        });

        if let Err(inconsistency) = result {
            self.queue.clear();
            self.statistics.num_failures += 1;
            return Err(inconsistency);
        }

        self.fix_point()
    }
}

fn receive_messages(
    beliefs: &mut ConstraintBeliefs,
    variables: &KeyedVec<VariableId, IntVariable>,
    state: &StateManager,
    damping_factor: Option<f64>,
) {
    for position in 0..beliefs.scope().len() {
        let domain = &variables[beliefs.scope()[position]].domain;

        if domain.is_bound(state) {
            beliefs.set_outside(position, domain.min(state), 1.0);
            continue;
        }

        for value in domain.iter(state) {
            // The marginal holds this constraint's local belief raised to its weight.
            let contribution = beliefs.local(position, value, state).powf(beliefs.weight);
            let outside = if contribution == 0.0 {
                0.0
            } else {
                domain.marginal(value, state) / contribution
            };
            beliefs.set_outside(position, value, outside);
        }
        normalize_outside(beliefs, position, variables, state);
    }

    beliefs.damp_outside(damping_factor);
    if damping_factor.is_some() {
        for position in 0..beliefs.scope().len() {
            normalize_outside(beliefs, position, variables, state);
        }
    }
}

/// Normalizes the outside beliefs of the variable at `position`; a message without any weight
/// carries no information and is replaced by the uniform one.
fn normalize_outside(
    beliefs: &mut ConstraintBeliefs,
    position: usize,
    variables: &KeyedVec<VariableId, IntVariable>,
    state: &StateManager,
) {
    let domain = &variables[beliefs.scope()[position]].domain;

    let sum = domain
        .iter(state)
        .map(|value| beliefs.outside(position, value))
        .sum::<f64>();

    if sum > 0.0 {
        for value in domain.iter(state) {
            let outside = beliefs.outside(position, value);
            beliefs.set_outside(position, value, outside / sum);
        }
    } else {
        let uniform = 1.0 / domain.size(state) as f64;
        for value in domain.iter(state) {
            beliefs.set_outside(position, value, uniform);
        }
    }
}

/// Normalizes the local beliefs per variable; all-zero beliefs are left untouched.
fn normalize_local(
    beliefs: &ConstraintBeliefs,
    variables: &KeyedVec<VariableId, IntVariable>,
    state: &mut StateManager,
) {
    for (position, &variable) in beliefs.scope().iter().enumerate() {
        let domain = &variables[variable].domain;

        let sum = domain
            .iter(&*state)
            .map(|value| beliefs.local(position, value, state))
            .sum::<f64>();
        if sum == 0.0 {
            continue;
        }

        for value in domain.iter(&*state) {
            let local = beliefs.local(position, value, state);
            beliefs.set_local(position, value, local / sum, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints;
    use crate::engine::ConstraintWeighting;
    use crate::engine::PropagationMode;
    use crate::engine::SolverOptions;

    fn solver(mode: PropagationMode) -> Solver {
        Solver::with_options(SolverOptions {
            mode,
            ..Default::default()
        })
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected} but got {actual}"
        );
    }

    fn marginal_sum(solver: &Solver, variable: VariableId) -> f64 {
        solver
            .values(variable)
            .map(|value| solver.marginal(variable, value))
            .sum()
    }

    const ROWS: [[i32; 2]; 4] = [[0, 0], [0, 1], [1, 1], [2, 2]];

    fn rows() -> Vec<Vec<i32>> {
        ROWS.iter().map(|row| row.to_vec()).collect()
    }

    #[test]
    fn a_single_table_yields_exact_marginals() {
        let mut solver = solver(PropagationMode::Belief);
        let x = solver.new_variable(0, 2, None);
        let y = solver.new_variable(0, 2, None);
        let _ = solver
            .post(constraints::table([x, y], rows()).unwrap())
            .unwrap();

        solver.propagate().unwrap();

        assert_close(solver.marginal(x, 0), 0.5);
        assert_close(solver.marginal(x, 1), 0.25);
        assert_close(solver.marginal(x, 2), 0.25);
        assert_close(solver.marginal(y, 1), 0.5);
        assert_eq!(solver.value_with_max_marginal(x), 0);
        assert_eq!(solver.value_with_max_marginal(y), 1);
        assert_eq!(solver.statistics().num_belief_rounds, 5);
    }

    #[test]
    fn arity_based_weighting_flattens_the_marginals() {
        let mut solver = Solver::with_options(SolverOptions {
            mode: PropagationMode::Belief,
            weighting: ConstraintWeighting::ArityBased,
            belief_rounds: 1,
            ..Default::default()
        });
        let x = solver.new_variable(0, 2, None);
        let y = solver.new_variable(0, 2, None);
        let _ = solver
            .post(constraints::table([x, y], rows()).unwrap())
            .unwrap();

        solver.belief_propagation().unwrap();

        let total = 0.5f64.sqrt() + 2.0 * 0.25f64.sqrt();
        assert_close(solver.marginal(x, 0), 0.5f64.sqrt() / total);
        assert_close(solver.marginal(x, 2), 0.25f64.sqrt() / total);
    }

    #[test]
    fn arity_based_marginals_of_a_single_table_are_stable_across_rounds() {
        for belief_rounds in [1, 2, 5, 10] {
            let mut solver = Solver::with_options(SolverOptions {
                mode: PropagationMode::Belief,
                weighting: ConstraintWeighting::ArityBased,
                belief_rounds,
                ..Default::default()
            });
            let x = solver.new_variable(0, 2, None);
            let y = solver.new_variable(0, 2, None);
            let _ = solver
                .post(constraints::table([x, y], rows()).unwrap())
                .unwrap();

            solver.propagate().unwrap();

            let total = 0.5f64.sqrt() + 2.0 * 0.25f64.sqrt();
            assert_close(solver.marginal(x, 0), 0.5f64.sqrt() / total);
            assert_close(solver.marginal(x, 1), 0.25f64.sqrt() / total);
            assert_close(solver.marginal(x, 2), 0.25f64.sqrt() / total);
            assert_close(solver.marginal(y, 0), 0.25f64.sqrt() / total);
            assert_close(solver.marginal(y, 1), 0.5f64.sqrt() / total);
        }
    }

    #[test]
    fn marginals_are_normalized_after_every_call() {
        let mut solver = solver(PropagationMode::Hybrid);
        let variables = (0..4)
            .map(|_| solver.new_variable(0, 4, None))
            .collect::<Vec<_>>();
        let _ = solver
            .post(constraints::all_different(variables.clone()).unwrap())
            .unwrap();
        let _ = solver
            .post(
                constraints::table(
                    [variables[0], variables[1]],
                    vec![vec![0, 1], vec![1, 2], vec![2, 3], vec![0, 3]],
                )
                .unwrap(),
            )
            .unwrap();
        solver.assign(variables[3], 4).unwrap();

        solver.propagate().unwrap();

        for &variable in &variables {
            if solver.is_bound(variable) {
                assert_eq!(solver.marginal(variable, solver.min(variable)), 1.0);
            } else {
                assert_close(marginal_sum(&solver, variable), 1.0);
            }
        }
    }

    #[test]
    fn damping_with_factor_one_changes_nothing() {
        let build = |damping: bool| {
            let mut solver = Solver::with_options(SolverOptions {
                mode: PropagationMode::Belief,
                damping,
                damping_factor: 1.0,
                ..Default::default()
            });
            let x = solver.new_variable(0, 3, None);
            let y = solver.new_variable(0, 3, None);
            let z = solver.new_variable(0, 3, None);
            let _ = solver
                .post(constraints::all_different([x, y, z]).unwrap())
                .unwrap();
            let _ = solver
                .post(constraints::table([x, y], rows()).unwrap())
                .unwrap();
            solver.belief_propagation().unwrap();
            [x, y, z].map(|variable| {
                (0..=3)
                    .map(|value| solver.marginal(variable, value))
                    .collect::<Vec<_>>()
            })
        };

        let undamped = build(false);
        let damped = build(true);
        for (a, b) in undamped.iter().flatten().zip(damped.iter().flatten()) {
            assert_close(*a, *b);
        }
    }

    #[test]
    fn damping_keeps_marginals_normalized() {
        let mut solver = Solver::with_options(SolverOptions {
            mode: PropagationMode::Hybrid,
            damping: true,
            damping_factor: 0.3,
            belief_rounds: 8,
            ..Default::default()
        });
        let x = solver.new_variable(0, 3, None);
        let y = solver.new_variable(0, 3, None);
        let z = solver.new_variable(0, 3, None);
        let _ = solver
            .post(constraints::all_different([x, y, z]).unwrap())
            .unwrap();
        let _ = solver
            .post(constraints::table([x, y], rows()).unwrap())
            .unwrap();

        solver.propagate().unwrap();

        for variable in [x, y, z] {
            assert_close(marginal_sum(&solver, variable), 1.0);
        }
    }

    #[test]
    fn beliefs_of_zero_and_one_act_on_domains() {
        let mut solver = Solver::with_options(SolverOptions {
            mode: PropagationMode::Belief,
            acting_on_zero_one_belief: true,
            ..Default::default()
        });
        let x = solver.new_variable(0, 2, None);
        let y = solver.new_variable(0, 2, None);
        let _ = solver
            .post(constraints::table([x, y], vec![vec![0, 0], vec![1, 1]]).unwrap())
            .unwrap();
        assert!(solver.contains(x, 2));

        solver.propagate().unwrap();

        assert!(!solver.contains(x, 2));
        assert!(!solver.contains(y, 2));
        assert!(solver.statistics().num_belief_actions >= 2);
    }

    #[test]
    fn acting_on_beliefs_reports_emptied_domains() {
        let mut solver = Solver::with_options(SolverOptions {
            mode: PropagationMode::Belief,
            acting_on_zero_one_belief: true,
            ..Default::default()
        });
        let x = solver.new_variable(1, 2, None);
        let y = solver.new_variable(0, 2, None);
        let _ = solver
            .post(constraints::table([x, y], vec![vec![0, 0]]).unwrap())
            .unwrap();

        let result = solver.propagate();

        assert_eq!(result, Err(crate::Inconsistency::EmptyDomain(x)));
        assert!(solver.queue.is_empty());
        assert_eq!(solver.statistics().num_failures, 1);
    }

    #[test]
    fn inexact_constraints_never_act_on_beliefs() {
        let mut solver = Solver::with_options(SolverOptions {
            mode: PropagationMode::Belief,
            acting_on_zero_one_belief: true,
            ..Default::default()
        });
        let x = solver.new_variable(0, 1, None);
        let y = solver.new_variable(0, 1, None);
        let z = solver.new_variable(0, 1, None);
        let _ = solver
            .post(constraints::all_different([x, y, z]).unwrap())
            .unwrap();

        solver.propagate().unwrap();

        assert_eq!(solver.statistics().num_belief_actions, 0);
        assert_eq!(solver.size(x), 2);
    }

    #[test]
    fn constraints_without_a_belief_update_are_uniform() {
        let mut solver = solver(PropagationMode::Belief);
        let x = solver.new_variable(0, 2, None);
        let y = solver.new_sparse_variable(&[1, 4], None);
        let id = solver
            .post(constraints::less_or_equal(x, y).unwrap())
            .unwrap();

        solver.propagate().unwrap();

        let beliefs = &solver.constraint_states[id].beliefs;
        for value in 0..=2 {
            assert_close(beliefs.local(0, value, &solver.state), 1.0 / 3.0);
            assert_close(solver.marginal(x, value), 1.0 / 3.0);
        }
        assert_close(beliefs.local(1, 1, &solver.state), 0.5);
        assert_close(solver.marginal(y, 4), 0.5);
    }

    #[test]
    fn subsumed_constraints_take_no_part() {
        let mut solver = solver(PropagationMode::Hybrid);
        let x = solver.new_variable(0, 2, None);
        let y = solver.new_variable(5, 6, None);
        let id = solver
            .post(constraints::not_equal(x, y, 0).unwrap())
            .unwrap();
        solver.assign(y, 5).unwrap();

        solver.propagate().unwrap();

        assert!(!solver.is_active(id));
        for value in 0..=2 {
            assert_close(solver.marginal(x, value), 1.0 / 3.0);
        }
    }
}

//! Domain-consistent filtering of the all-different constraint.
//!
//! Variables and values form a bipartite graph. Given a maximum matching which covers every
//! variable, a value `v` can be removed from the domain of `x` iff `v` is not matched to `x` and
//! the edge `(x, v)` lies neither on an even alternating cycle nor on an even alternating path
//! starting from a free value. Orienting matched edges from value to variable, other edges from
//! variable to value, and connecting free values to matched values through an extra sink node,
//! the first condition becomes: `x` and `v` lie in different strongly connected components.
//!
//! # Bibliography
//! \[1\] J.-C. Régin, ‘A filtering algorithm for constraints of difference in CSPs’, in AAAI,
//! 1994, pp. 362–367.
mod maximum_matching;
mod strongly_connected_components;

use maximum_matching::MaximumMatching;
use strongly_connected_components::strongly_connected_components;

use super::validate_scope;
use super::Constraint;
use crate::basic_types::Inconsistency;
use crate::basic_types::ModelError;
use crate::basic_types::PropagationStatus;
use crate::engine::BeliefContext;
use crate::engine::DomainEvent;
use crate::engine::PostContext;
use crate::engine::PropagationContext;
use crate::engine::ReadDomains;
use crate::engine::VariableId;

/// Creates the constraint that all `variables` take pairwise different values.
pub fn all_different(
    variables: impl IntoIterator<Item = VariableId>,
) -> Result<AllDifferent, ModelError> {
    let scope: Box<[VariableId]> = variables.into_iter().collect();
    validate_scope(&scope)?;

    Ok(AllDifferent {
        domains: vec![vec![]; scope.len()],
        scope,
        matching: MaximumMatching::default(),
        graph: vec![],
    })
}

#[derive(Debug, Clone)]
pub struct AllDifferent {
    scope: Box<[VariableId]>,
    matching: MaximumMatching,

    // Scratch space, recomputed on every call.
    domains: Vec<Vec<i32>>,
    graph: Vec<Vec<usize>>,
}

impl AllDifferent {
    /// Copies the current domains into the scratch space and returns the range spanned by them.
    fn read_domains(&mut self, context: &impl ReadDomains) -> (i32, i32) {
        let mut min_value = i32::MAX;
        let mut max_value = i32::MIN;

        for (domain, &variable) in self.domains.iter_mut().zip(self.scope.iter()) {
            domain.resize(context.size(variable), 0);
            let size = context.fill_array(variable, domain);
            domain.truncate(size);

            min_value = min_value.min(context.min(variable));
            max_value = max_value.max(context.max(variable));
        }

        (min_value, max_value)
    }

    /// Builds the residual graph of the current matching: variables are nodes `0..n`, the value
    /// `v` is node `n + v - min_value`, and the sink is the last node.
    fn build_residual_graph(&mut self, min_value: i32, max_value: i32) {
        let num_variables = self.scope.len();
        let num_values = (max_value as i64 - min_value as i64 + 1) as usize;
        let sink = num_variables + num_values;
        let value_node = |value: i32| num_variables + (value - min_value) as usize;

        self.graph.iter_mut().for_each(Vec::clear);
        self.graph.resize(sink + 1, vec![]);

        for (variable, domain) in self.domains.iter().enumerate() {
            let Some(matched) = self.matching.value_of(variable) else {
                continue;
            };
            for &value in domain {
                if value != matched {
                    self.graph[variable].push(value_node(value));
                }
            }
            self.graph[value_node(matched)].push(variable);
        }

        for value in min_value..=max_value {
            if self.matching.is_value_matched(value) {
                self.graph[sink].push(value_node(value));
            } else {
                self.graph[value_node(value)].push(sink);
            }
        }
    }
}

impl Constraint for AllDifferent {
    fn name(&self) -> &str {
        "AllDifferent"
    }

    fn scope(&self) -> &[VariableId] {
        &self.scope
    }

    fn post(&mut self, mut context: PostContext<'_>) {
        for &variable in self.scope.iter() {
            context.register(variable, DomainEvent::Change);
        }
    }

    fn propagate(&mut self, mut context: PropagationContext<'_>) -> PropagationStatus {
        let (min_value, max_value) = self.read_domains(&context);

        let matching_size = self.matching.compute(&self.domains, min_value, max_value);
        if matching_size < self.scope.len() {
            return Err(Inconsistency::Constraint(context.constraint_id()));
        }

        self.build_residual_graph(min_value, max_value);
        let components = strongly_connected_components(&self.graph);

        let num_variables = self.scope.len();
        for (variable, domain) in self.domains.iter().enumerate() {
            let matched = self.matching.value_of(variable);
            for &value in domain {
                let value_node = num_variables + (value - min_value) as usize;
                if Some(value) != matched && components[variable] != components[value_node] {
                    context.remove(self.scope[variable], value)?;
                }
            }
        }

        Ok(())
    }

    /// Approximates the local belief of `x_i = v` by the probability that no other variable
    /// takes `v`, treating the other variables as independent.
    fn update_belief(&mut self, mut context: BeliefContext<'_>) {
        let _ = self.read_domains(&context);

        for (position, domain) in self.domains.iter().enumerate() {
            for &value in domain {
                let belief = (0..self.scope.len())
                    .filter(|&other| other != position)
                    .map(|other| 1.0 - context.outside_belief(other, value))
                    .product::<f64>();
                context.set_local_belief(position, value, belief.max(0.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use rand::rngs::SmallRng;
    use rand::Rng;
    use rand::SeedableRng;

    use super::*;
    use crate::engine::PropagationMode;
    use crate::engine::SolverOptions;
    use crate::Solver;

    fn classical() -> Solver {
        Solver::with_options(SolverOptions {
            mode: PropagationMode::Classical,
            ..Default::default()
        })
    }

    fn domain(solver: &Solver, variable: VariableId) -> Vec<i32> {
        solver.values(variable).sorted().collect()
    }

    #[test]
    fn complete_domains_lose_nothing() {
        let mut solver = classical();
        let variables = (0..5)
            .map(|_| solver.new_variable(0, 4, None))
            .collect::<Vec<_>>();

        let _ = solver
            .post(all_different(variables.clone()).unwrap())
            .unwrap();

        for variable in variables {
            assert_eq!(solver.size(variable), 5);
        }
    }

    #[test]
    fn too_few_values_is_an_inconsistency() {
        for n in 3..6 {
            let mut solver = classical();
            let variables = (0..n)
                .map(|_| solver.new_variable(0, 1, None))
                .collect::<Vec<_>>();

            let result = solver.post(all_different(variables).unwrap());

            assert!(matches!(result, Err(Inconsistency::Constraint(_))));
        }
    }

    #[test]
    fn three_values_for_three_variables_lose_nothing() {
        let mut solver = classical();
        let x = solver.new_variable(1, 3, Some("x"));
        let y = solver.new_variable(1, 3, Some("y"));
        let z = solver.new_variable(1, 3, Some("z"));

        let _ = solver.post(all_different([x, y, z]).unwrap()).unwrap();
        solver.propagate().unwrap();

        for variable in [x, y, z] {
            assert_eq!(domain(&solver, variable), vec![1, 2, 3]);
        }

        let w = solver.new_variable(1, 3, Some("w"));
        assert!(solver.post(all_different([x, y, z, w]).unwrap()).is_err());
    }

    #[test]
    fn values_taken_by_a_hall_set_are_removed() {
        let mut solver = classical();
        let x = solver.new_variable(1, 2, None);
        let y = solver.new_variable(1, 2, None);
        let z = solver.new_variable(1, 3, None);

        let _ = solver.post(all_different([x, y, z]).unwrap()).unwrap();

        assert_eq!(domain(&solver, z), vec![3]);
        assert_eq!(domain(&solver, x), vec![1, 2]);
    }

    #[test]
    fn binding_a_variable_propagates_through_the_matching() {
        let mut solver = classical();
        let x = solver.new_variable(1, 3, None);
        let y = solver.new_variable(1, 2, None);
        let z = solver.new_variable(2, 3, None);
        let _ = solver.post(all_different([x, y, z]).unwrap()).unwrap();

        solver.assign(y, 2).unwrap();
        solver.propagate().unwrap();

        assert_eq!(solver.value(z), Some(3));
        assert_eq!(solver.value(x), Some(1));
    }

    #[test]
    fn duplicate_and_empty_scopes_are_rejected() {
        let mut solver = classical();
        let x = solver.new_variable(1, 3, None);

        assert_eq!(
            all_different([x, x]).unwrap_err(),
            ModelError::DuplicateVariable
        );
        assert_eq!(
            all_different(Vec::<VariableId>::new()).unwrap_err(),
            ModelError::EmptyScope
        );
    }

    /// Compares the filtering with the values occurring in some solution, found by enumerating
    /// all assignments.
    #[test]
    fn filtering_is_domain_consistent_on_random_instances() {
        let mut rng = SmallRng::seed_from_u64(3);

        for _ in 0..300 {
            let num_variables = rng.gen_range(2..=5);
            let domains = (0..num_variables)
                .map(|_| {
                    (0..6)
                        .filter(|_| rng.gen_bool(0.45))
                        .collect::<Vec<i32>>()
                })
                .collect::<Vec<_>>();
            if domains.iter().any(Vec::is_empty) {
                continue;
            }

            let solutions = domains
                .iter()
                .cloned()
                .multi_cartesian_product()
                .filter(|assignment| assignment.iter().all_unique())
                .collect::<Vec<_>>();

            let mut solver = classical();
            let variables = domains
                .iter()
                .map(|values| solver.new_sparse_variable(values, None))
                .collect::<Vec<_>>();
            let result = solver.post(all_different(variables.clone()).unwrap());

            if solutions.is_empty() {
                assert!(result.is_err(), "domains {domains:?} have no solution");
                continue;
            }
            assert!(result.is_ok());
            for (position, &variable) in variables.iter().enumerate() {
                let expected = solutions
                    .iter()
                    .map(|solution| solution[position])
                    .sorted()
                    .dedup()
                    .collect::<Vec<_>>();
                assert_eq!(domain(&solver, variable), expected, "domains {domains:?}");
            }
        }
    }

    #[test]
    fn propagation_is_idempotent() {
        let mut solver = classical();
        let variables = [vec![1, 2], vec![2, 3], vec![1, 3], vec![1, 2, 3, 4, 5]]
            .iter()
            .map(|values| solver.new_sparse_variable(values, None))
            .collect::<Vec<_>>();
        let id = solver
            .post(all_different(variables.clone()).unwrap())
            .unwrap();
        let before = variables
            .iter()
            .map(|&variable| domain(&solver, variable))
            .collect::<Vec<_>>();

        solver.queue.enqueue(id);
        solver.propagate().unwrap();

        let after = variables
            .iter()
            .map(|&variable| domain(&solver, variable))
            .collect::<Vec<_>>();
        assert_eq!(before, after);
        assert_eq!(after[3], vec![4, 5]);
    }
}

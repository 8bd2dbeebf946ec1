use log::warn;

use crate::basic_types::PropagationStatus;
use crate::engine::VariableId;
use crate::Solver;

/// One branch of a search node: a mutation of the solver which must be followed by
/// propagation.
pub type Alternative = Box<dyn FnOnce(&mut Solver) -> PropagationStatus>;

/// Decides how to split the search space at a node.
pub trait Brancher {
    /// Returns the alternatives to explore, in order; an empty list signals that the current
    /// state is a solution.
    fn branch(&mut self, solver: &Solver) -> Vec<Alternative>;
}

impl<F: FnMut(&Solver) -> Vec<Alternative>> Brancher for F {
    fn branch(&mut self, solver: &Solver) -> Vec<Alternative> {
        self(solver)
    }
}

/// The binary split `variable = value` or `variable != value`.
pub fn equal_or_not_equal(variable: VariableId, value: i32) -> Vec<Alternative> {
    vec![
        Box::new(move |solver: &mut Solver| solver.assign(variable, value)),
        Box::new(move |solver: &mut Solver| solver.remove(variable, value)),
    ]
}

fn unbound<'a>(
    variables: &'a [VariableId],
    solver: &'a Solver,
) -> impl Iterator<Item = VariableId> + 'a {
    variables
        .iter()
        .copied()
        .filter(move |&variable| !solver.is_bound(variable))
}

fn check_not_empty(variables: &[VariableId], name: &str) {
    if variables.is_empty() {
        warn!("The {name} brancher was not provided with any variables");
    }
}

/// Branches on the variable with the smallest domain (the first one on ties), trying its
/// smallest value first.
#[derive(Debug, Clone)]
pub struct FirstFail {
    variables: Vec<VariableId>,
}

impl FirstFail {
    pub fn new(variables: &[VariableId]) -> FirstFail {
        check_not_empty(variables, "FirstFail");
        FirstFail {
            variables: variables.to_vec(),
        }
    }
}

impl Brancher for FirstFail {
    fn branch(&mut self, solver: &Solver) -> Vec<Alternative> {
        unbound(&self.variables, solver)
            .min_by_key(|&variable| solver.size(variable))
            .map_or_else(Vec::new, |variable| {
                equal_or_not_equal(variable, solver.min(variable))
            })
    }
}

/// Branches on the (variable, value) pair with the highest marginal over all unbound variables.
#[derive(Debug, Clone)]
pub struct MaxMarginal {
    variables: Vec<VariableId>,
}

impl MaxMarginal {
    pub fn new(variables: &[VariableId]) -> MaxMarginal {
        check_not_empty(variables, "MaxMarginal");
        MaxMarginal {
            variables: variables.to_vec(),
        }
    }
}

impl Brancher for MaxMarginal {
    fn branch(&mut self, solver: &Solver) -> Vec<Alternative> {
        let mut best: Option<(VariableId, i32, f64)> = None;

        for variable in unbound(&self.variables, solver) {
            let value = solver.value_with_max_marginal(variable);
            let marginal = solver.marginal(variable, value);
            let improves = match best {
                Some((_, _, best_marginal)) => marginal > best_marginal,
                None => true,
            };
            if improves {
                best = Some((variable, value, marginal));
            }
        }

        best.map_or_else(Vec::new, |(variable, value, _)| {
            equal_or_not_equal(variable, value)
        })
    }
}

/// Branches on the variable whose marginals have the lowest entropy, trying the value with the
/// highest marginal first.
#[derive(Debug, Clone)]
pub struct MinEntropy {
    variables: Vec<VariableId>,
}

impl MinEntropy {
    pub fn new(variables: &[VariableId]) -> MinEntropy {
        check_not_empty(variables, "MinEntropy");
        MinEntropy {
            variables: variables.to_vec(),
        }
    }
}

impl Brancher for MinEntropy {
    fn branch(&mut self, solver: &Solver) -> Vec<Alternative> {
        unbound(&self.variables, solver)
            .map(|variable| (variable, solver.entropy(variable)))
            .reduce(|best, candidate| if candidate.1 < best.1 { candidate } else { best })
            .map_or_else(Vec::new, |(variable, _)| {
                equal_or_not_equal(variable, solver.value_with_max_marginal(variable))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fail_picks_the_smallest_domain() {
        let mut solver = Solver::default();
        let x = solver.new_variable(0, 5, None);
        let y = solver.new_variable(3, 4, None);
        let z = solver.new_variable(1, 1, None);

        let mut alternatives = FirstFail::new(&[x, y, z]).branch(&solver);
        assert_eq!(alternatives.len(), 2);

        let assign = alternatives.remove(0);
        assign(&mut solver).unwrap();
        assert_eq!(solver.value(y), Some(3));
    }

    #[test]
    fn no_alternatives_once_everything_is_bound() {
        let mut solver = Solver::default();
        let x = solver.new_variable(2, 2, None);

        assert!(FirstFail::new(&[x]).branch(&solver).is_empty());
        assert!(MaxMarginal::new(&[x]).branch(&solver).is_empty());
        assert!(MinEntropy::new(&[x]).branch(&solver).is_empty());
    }

    #[test]
    fn marginal_branchers_follow_the_beliefs() {
        let mut solver = Solver::default();
        let x = solver.new_variable(0, 2, None);
        let y = solver.new_variable(0, 3, None);
        let _ = solver
            .post(
                crate::constraints::table(
                    [x, y],
                    vec![vec![0, 0], vec![1, 1], vec![2, 2], vec![2, 3]],
                )
                .unwrap(),
            )
            .unwrap();
        solver.propagate().unwrap();

        // x = 2 has twice the support of the other values of x.
        let mut alternatives = MaxMarginal::new(&[x, y]).branch(&solver);
        alternatives.remove(0)(&mut solver).unwrap();
        assert_eq!(solver.value(x), Some(2));
    }
}

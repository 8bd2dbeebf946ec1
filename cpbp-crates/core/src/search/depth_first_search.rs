use std::ops::ControlFlow;

use log::debug;

use super::Brancher;
use crate::statistics::create_statistics_struct;
use crate::Solver;

create_statistics_struct!(
    /// Counters of a single [`DepthFirstSearch::solve`] call.
    SearchStatistics {
        /// The number of alternatives which were applied.
        nodes: u64,
        /// The number of nodes (including the root) at which propagation failed.
        failures: u64,
        solutions: u64,
        /// Whether the whole search space was explored, i.e. neither the solution limit nor the
        /// discrepancy bound cut the search short.
        completed: bool,
    }
);

/// A depth-first search which explores the alternatives of a [`Brancher`] in order.
///
/// Every alternative is applied in a fresh state and followed by
/// [`Solver::propagate`]; the solver is restored to its original state once the search
/// returns.
#[derive(Debug)]
pub struct DepthFirstSearch<B> {
    brancher: B,
    solution_limit: Option<u64>,
    max_discrepancy: Option<usize>,
    pruned: bool,
}

impl<B: Brancher> DepthFirstSearch<B> {
    pub fn new(brancher: B) -> DepthFirstSearch<B> {
        DepthFirstSearch {
            brancher,
            solution_limit: None,
            max_discrepancy: None,
            pruned: false,
        }
    }

    /// Stop after `limit` solutions have been found.
    pub fn with_solution_limit(mut self, limit: u64) -> Self {
        self.solution_limit = Some(limit);
        self
    }

    /// Limited discrepancy search: taking the alternative at index `i` of a node costs `i`
    /// discrepancies, and paths costing more than `max_discrepancy` are not explored.
    pub fn with_max_discrepancy(mut self, max_discrepancy: usize) -> Self {
        self.max_discrepancy = Some(max_discrepancy);
        self
    }

    pub fn brancher(&self) -> &B {
        &self.brancher
    }

    /// Explores the search space below the current state of `solver`, calling `on_solution`
    /// for every solution found.
    pub fn solve(
        &mut self,
        solver: &mut Solver,
        mut on_solution: impl FnMut(&Solver),
    ) -> SearchStatistics {
        let mut statistics = SearchStatistics::default();
        self.pruned = false;

        let token = solver.save_state();
        let flow = match solver.propagate() {
            Ok(()) => self.explore(solver, &mut on_solution, &mut statistics, 0),
            Err(inconsistency) => {
                debug!("Root propagation failed: {inconsistency}");
                statistics.failures += 1;
                ControlFlow::Continue(())
            }
        };
        solver.restore_state(token);

        statistics.completed = flow.is_continue() && !self.pruned;
        debug!(
            "Search finished with {} solutions after {} nodes",
            statistics.solutions, statistics.nodes
        );
        statistics
    }

    fn explore(
        &mut self,
        solver: &mut Solver,
        on_solution: &mut impl FnMut(&Solver),
        statistics: &mut SearchStatistics,
        discrepancy: usize,
    ) -> ControlFlow<()> {
        let alternatives = self.brancher.branch(solver);

        if alternatives.is_empty() {
            statistics.solutions += 1;
            on_solution(solver);

            return match self.solution_limit {
                Some(limit) if statistics.solutions >= limit => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            };
        }

        for (index, alternative) in alternatives.into_iter().enumerate() {
            let discrepancy = discrepancy + index;
            if self
                .max_discrepancy
                .is_some_and(|max_discrepancy| discrepancy > max_discrepancy)
            {
                self.pruned = true;
                break;
            }

            statistics.nodes += 1;
            let token = solver.save_state();

            let flow = match alternative(solver).and_then(|()| solver.propagate()) {
                Ok(()) => self.explore(solver, on_solution, statistics, discrepancy),
                Err(_) => {
                    statistics.failures += 1;
                    ControlFlow::Continue(())
                }
            };

            solver.restore_state(token);

            if flow.is_break() {
                return flow;
            }
        }

        ControlFlow::Continue(())
    }
}

use crate::statistics::create_statistics_struct;

create_statistics_struct!(
    /// Counters of the work done by the [`Solver`](crate::Solver).
    SolverStatistics {
        /// The number of calls to the fixpoint loop.
        num_fixpoints: u64,
        /// The number of times a constraint filtered domains.
        num_propagations: u64,
        /// The number of fixpoints and belief-propagation calls which ended in an inconsistency.
        num_failures: u64,
        num_belief_rounds: u64,
        /// The number of values removed or assigned because of a belief of exactly 0 or 1.
        num_belief_actions: u64,
    }
);

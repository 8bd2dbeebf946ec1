use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::state::StateStrategy;
#[cfg(doc)]
use crate::Solver;

/// Which inference [`Solver::propagate`] runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum PropagationMode {
    /// Domain filtering to a fixpoint only.
    Classical,
    /// Belief propagation only; constraints never filter domains.
    Belief,
    /// A fixpoint followed by belief propagation.
    #[default]
    Hybrid,
}

/// The exponent applied to the local beliefs of a constraint when they are multiplied into the
/// marginals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ConstraintWeighting {
    /// Every constraint has weight 1.
    #[default]
    Uniform,
    /// A constraint over `n` variables has weight `1 / n`, so large constraints do not dominate
    /// the marginals.
    ArityBased,
}

impl ConstraintWeighting {
    pub(crate) fn weight(self, arity: usize) -> f64 {
        match self {
            ConstraintWeighting::Uniform => 1.0,
            ConstraintWeighting::ArityBased => 1.0 / arity.max(1) as f64,
        }
    }
}

/// Options for the [`Solver`] which determine how it behaves.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    pub mode: PropagationMode,
    pub weighting: ConstraintWeighting,
    /// Whether outside beliefs are blended with those of the previous round.
    pub damping: bool,
    /// The weight of the newly computed outside belief when damping; 1 disables damping.
    pub damping_factor: f64,
    /// The number of belief-propagation rounds per call to [`Solver::belief_propagation`].
    pub belief_rounds: usize,
    /// Whether a local belief of exactly 0 or 1 from a weighted-counting constraint removes or
    /// assigns the value.
    pub acting_on_zero_one_belief: bool,
    pub state_strategy: StateStrategy,
    /// A random number generator which is used to sample values from domains.
    pub random_generator: SmallRng,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            mode: PropagationMode::default(),
            weighting: ConstraintWeighting::default(),
            damping: false,
            damping_factor: 0.5,
            belief_rounds: 5,
            acting_on_zero_one_belief: false,
            state_strategy: StateStrategy::default(),
            random_generator: SmallRng::seed_from_u64(42),
        }
    }
}

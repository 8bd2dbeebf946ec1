use std::fmt::Display;

use super::IntVariable;
use super::VariableId;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::state::ReversibleBool;
use crate::state::ReversibleCell;
use crate::state::ReversibleFloat;
use crate::state::ReversibleStore;
use crate::state::StateManager;

/// A handle to a constraint posted to a [`Solver`](crate::Solver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId {
    id: u32,
}

impl StorageKey for ConstraintId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        ConstraintId { id: index as u32 }
    }
}

impl Display for ConstraintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.id)
    }
}

/// The engine-owned state of a posted constraint.
#[derive(Debug, Clone)]
pub(crate) struct ConstraintState {
    /// Cleared (reversibly) once the constraint is subsumed.
    pub(crate) active: ReversibleBool,
    pub(crate) beliefs: ConstraintBeliefs,
}

/// The local and outside beliefs of a constraint for every (scope position, value) pair of the
/// initial ranges of its variables.
///
/// Local beliefs persist between rounds and are reversible, as the outside belief of the next
/// round divides the marginal by them. Outside beliefs are scratch space which is overwritten at
/// the start of every round.
#[derive(Debug, Clone)]
pub(crate) struct ConstraintBeliefs {
    scope: Box<[VariableId]>,
    /// The smallest value of the initial range of each variable.
    offsets: Box<[i32]>,
    /// `starts[i]..starts[i + 1]` are the entries of the variable at scope position `i`.
    starts: Box<[usize]>,
    local: Box<[ReversibleFloat]>,
    outside: Box<[f64]>,
    previous_outside: Box<[f64]>,
    /// Whether `previous_outside` was computed during the current call to belief propagation.
    has_previous: bool,
    /// The exponent applied to the local beliefs when they are multiplied into the marginals.
    pub(crate) weight: f64,
}

impl ConstraintBeliefs {
    pub(crate) fn new(
        scope: &[VariableId],
        variables: &KeyedVec<VariableId, IntVariable>,
        weight: f64,
        store: &mut StateManager,
    ) -> ConstraintBeliefs {
        let mut offsets = Vec::with_capacity(scope.len());
        let mut starts = Vec::with_capacity(scope.len() + 1);
        starts.push(0);

        for &variable in scope {
            let (lower_bound, upper_bound) = variables[variable].domain.initial_bounds();
            offsets.push(lower_bound);
            let num_values = (upper_bound as i64 - lower_bound as i64 + 1) as usize;
            starts.push(starts[starts.len() - 1] + num_values);
        }

        let num_entries = starts[scope.len()];

        ConstraintBeliefs {
            scope: scope.into(),
            offsets: offsets.into(),
            starts: starts.into(),
            local: (0..num_entries).map(|_| store.new_float(1.0)).collect(),
            outside: vec![0.0; num_entries].into(),
            previous_outside: vec![0.0; num_entries].into(),
            has_previous: false,
            weight,
        }
    }

    pub(crate) fn scope(&self) -> &[VariableId] {
        &self.scope
    }

    fn entry(&self, position: usize, value: i32) -> Option<usize> {
        let relative = value as i64 - self.offsets[position] as i64;
        let start = self.starts[position];
        let end = self.starts[position + 1];
        (relative >= 0 && (relative as usize) < end - start).then(|| start + relative as usize)
    }

    pub(crate) fn local(&self, position: usize, value: i32, store: &StateManager) -> f64 {
        self.entry(position, value)
            .map_or(0.0, |entry| self.local[entry].get(store))
    }

    pub(crate) fn set_local(
        &self,
        position: usize,
        value: i32,
        belief: f64,
        store: &mut StateManager,
    ) {
        if let Some(entry) = self.entry(position, value) {
            self.local[entry].set(store, belief);
        }
    }

    pub(crate) fn outside(&self, position: usize, value: i32) -> f64 {
        self.entry(position, value)
            .map_or(0.0, |entry| self.outside[entry])
    }

    pub(crate) fn set_outside(&mut self, position: usize, value: i32, belief: f64) {
        if let Some(entry) = self.entry(position, value) {
            self.outside[entry] = belief;
        }
    }

    /// Forgets the outside beliefs of earlier calls, so the first round of a call is undamped.
    pub(crate) fn start_belief_propagation(&mut self) {
        self.has_previous = false;
    }

    /// Blends the freshly computed outside beliefs with those of the previous round, as
    /// `factor * new + (1 - factor) * previous`, and remembers the result for the next round.
    pub(crate) fn damp_outside(&mut self, damping_factor: Option<f64>) {
        if let (Some(factor), true) = (damping_factor, self.has_previous) {
            for (outside, previous) in self.outside.iter_mut().zip(self.previous_outside.iter()) {
                *outside = factor * *outside + (1.0 - factor) * previous;
            }
        }
        self.previous_outside.copy_from_slice(&self.outside);
        self.has_previous = true;
    }
}

//! Reversible state: values which can be saved and restored as a whole during tree search.
//!
//! Every piece of mutable solver state which must be undone on backtracking (domains, marginals,
//! local beliefs, watcher lists, the activity of constraints) lives in a cell handed out by a
//! [`StateManager`]. A cell is a small copyable handle (e.g. [`ReversibleInt`]) which indexes into
//! an arena owned by the manager; the handle itself carries no value.
//!
//! Two interchangeable strategies are provided:
//! - [`Trailer`] records the previous value of a cell the first time it changes after a
//!   [`ReversibleStore::save_state`], and replays those records backwards when restoring. Saving
//!   is O(1), restoring is proportional to the number of cells changed since the snapshot.
//! - [`Copier`] copies the value of every cell when saving and overwrites every cell when
//!   restoring.
//!
//! Snapshots follow a stack discipline: after restoring to a [`StateToken`], tokens which were
//! taken after it are no longer valid.
mod copier;
mod reversible_list;
mod trailer;

pub use copier::Copier;
pub use reversible_list::ReversibleList;
pub use trailer::Trailer;

use crate::containers::StorageKey;

/// An opaque handle to a snapshot created by [`ReversibleStore::save_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateToken {
    level: usize,
}

impl StateToken {
    pub(crate) fn new(level: usize) -> StateToken {
        StateToken { level }
    }

    /// The number of snapshots which were open when this token was created.
    pub fn level(&self) -> usize {
        self.level
    }
}

/// The operations shared by both reversible state strategies.
pub trait ReversibleStore {
    /// Takes a snapshot of all cells and returns a token with which it can be restored.
    fn save_state(&mut self) -> StateToken;

    /// Restores every cell to the value it had when `token` was created.
    ///
    /// Restoring to the current level is a no-op; restoring to a token taken after a token
    /// which was already restored to is a programming error.
    fn restore_state(&mut self, token: StateToken);

    /// The number of snapshots which are currently open.
    fn level(&self) -> usize;

    fn new_int(&mut self, initial_value: i64) -> ReversibleInt;
    fn read_int(&self, cell: ReversibleInt) -> i64;
    fn write_int(&mut self, cell: ReversibleInt, value: i64);

    fn new_float(&mut self, initial_value: f64) -> ReversibleFloat;
    fn read_float(&self, cell: ReversibleFloat) -> f64;
    fn write_float(&mut self, cell: ReversibleFloat, value: f64);

    fn new_bool(&mut self, initial_value: bool) -> ReversibleBool {
        ReversibleBool(self.new_int(i64::from(initial_value)))
    }
}

/// A single reversible value of type [`ReversibleCell::Value`].
pub trait ReversibleCell: Copy {
    type Value;

    fn get(self, store: &impl ReversibleStore) -> Self::Value;

    fn set(self, store: &mut impl ReversibleStore, value: Self::Value);
}

/// A handle to a reversible `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReversibleInt {
    id: u32,
}

impl StorageKey for ReversibleInt {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        Self { id: index as u32 }
    }
}

impl ReversibleCell for ReversibleInt {
    type Value = i64;

    fn get(self, store: &impl ReversibleStore) -> i64 {
        store.read_int(self)
    }

    fn set(self, store: &mut impl ReversibleStore, value: i64) {
        store.write_int(self, value)
    }
}

impl ReversibleInt {
    pub fn add_assign(self, store: &mut impl ReversibleStore, addition: i64) {
        let value = self.get(store);
        self.set(store, value + addition)
    }
}

/// A handle to a reversible `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReversibleFloat {
    id: u32,
}

impl StorageKey for ReversibleFloat {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        Self { id: index as u32 }
    }
}

impl ReversibleCell for ReversibleFloat {
    type Value = f64;

    fn get(self, store: &impl ReversibleStore) -> f64 {
        store.read_float(self)
    }

    fn set(self, store: &mut impl ReversibleStore, value: f64) {
        store.write_float(self, value)
    }
}

/// A handle to a reversible `bool`, stored as an integer cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReversibleBool(ReversibleInt);

impl ReversibleCell for ReversibleBool {
    type Value = bool;

    fn get(self, store: &impl ReversibleStore) -> bool {
        store.read_int(self.0) != 0
    }

    fn set(self, store: &mut impl ReversibleStore, value: bool) {
        store.write_int(self.0, i64::from(value))
    }
}

/// Which [`ReversibleStore`] implementation a [`StateManager`] uses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum StateStrategy {
    /// Record previous values on a trail; see [`Trailer`].
    #[default]
    Trail,
    /// Copy every cell on save; see [`Copier`].
    Copy,
}

/// The reversible store owned by the [`Solver`](crate::Solver).
///
/// The strategy is chosen once, when the manager is created, and dispatched statically.
#[derive(Debug, Clone)]
pub enum StateManager {
    Trail(Trailer),
    Copy(Copier),
}

impl Default for StateManager {
    fn default() -> Self {
        StateManager::new(StateStrategy::default())
    }
}

impl StateManager {
    pub fn new(strategy: StateStrategy) -> StateManager {
        match strategy {
            StateStrategy::Trail => StateManager::Trail(Trailer::default()),
            StateStrategy::Copy => StateManager::Copy(Copier::default()),
        }
    }

    pub fn strategy(&self) -> StateStrategy {
        match self {
            StateManager::Trail(_) => StateStrategy::Trail,
            StateManager::Copy(_) => StateStrategy::Copy,
        }
    }
}

macro_rules! delegate_to_strategy {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            StateManager::Trail($store) => $call,
            StateManager::Copy($store) => $call,
        }
    };
}

impl ReversibleStore for StateManager {
    fn save_state(&mut self) -> StateToken {
        delegate_to_strategy!(self, store => store.save_state())
    }

    fn restore_state(&mut self, token: StateToken) {
        delegate_to_strategy!(self, store => store.restore_state(token))
    }

    fn level(&self) -> usize {
        delegate_to_strategy!(self, store => store.level())
    }

    fn new_int(&mut self, initial_value: i64) -> ReversibleInt {
        delegate_to_strategy!(self, store => store.new_int(initial_value))
    }

    fn read_int(&self, cell: ReversibleInt) -> i64 {
        delegate_to_strategy!(self, store => store.read_int(cell))
    }

    fn write_int(&mut self, cell: ReversibleInt, value: i64) {
        delegate_to_strategy!(self, store => store.write_int(cell, value))
    }

    fn new_float(&mut self, initial_value: f64) -> ReversibleFloat {
        delegate_to_strategy!(self, store => store.new_float(initial_value))
    }

    fn read_float(&self, cell: ReversibleFloat) -> f64 {
        delegate_to_strategy!(self, store => store.read_float(cell))
    }

    fn write_float(&mut self, cell: ReversibleFloat, value: f64) {
        delegate_to_strategy!(self, store => store.write_float(cell, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategies() -> [StateManager; 2] {
        [
            StateManager::new(StateStrategy::Trail),
            StateManager::new(StateStrategy::Copy),
        ]
    }

    #[test]
    fn restore_returns_every_cell_to_its_saved_value() {
        for mut state in strategies() {
            let int = state.new_int(3);
            let float = state.new_float(0.5);
            let flag = state.new_bool(true);

            let token = state.save_state();
            int.set(&mut state, 10);
            int.set(&mut state, 11);
            float.set(&mut state, 0.25);
            flag.set(&mut state, false);

            state.restore_state(token);

            assert_eq!(int.get(&state), 3, "{:?}", state.strategy());
            assert_eq!(float.get(&state), 0.5);
            assert!(flag.get(&state));
        }
    }

    #[test]
    fn nested_snapshots_are_restored_in_stack_order() {
        for mut state in strategies() {
            let cell = state.new_int(0);

            let outer = state.save_state();
            cell.set(&mut state, 1);
            let inner = state.save_state();
            cell.set(&mut state, 2);
            let innermost = state.save_state();
            cell.set(&mut state, 3);

            assert_eq!(state.level(), 3);

            state.restore_state(innermost);
            assert_eq!(cell.get(&state), 2);

            state.restore_state(inner);
            assert_eq!(cell.get(&state), 1);
            assert_eq!(state.level(), 1);

            // A fresh snapshot after restoring works as expected.
            let again = state.save_state();
            cell.set(&mut state, 7);
            state.restore_state(again);
            assert_eq!(cell.get(&state), 1);

            state.restore_state(outer);
            assert_eq!(cell.get(&state), 0);
            assert_eq!(state.level(), 0);
        }
    }

    #[test]
    fn restoring_skips_intermediate_snapshots() {
        for mut state in strategies() {
            let cell = state.new_float(1.0);

            let root = state.save_state();
            for level in 0..5 {
                cell.set(&mut state, level as f64);
                let _ = state.save_state();
            }

            state.restore_state(root);
            assert_eq!(cell.get(&state), 1.0);
            assert_eq!(state.level(), 0);
        }
    }

    #[test]
    fn cells_created_after_a_snapshot_keep_their_value() {
        for mut state in strategies() {
            let token = state.save_state();
            let cell = state.new_int(5);
            state.restore_state(token);

            assert_eq!(cell.get(&state), 5);
        }
    }

    #[test]
    fn restore_to_the_current_level_is_a_no_op() {
        for mut state in strategies() {
            let cell = state.new_int(0);
            let token = state.save_state();
            cell.set(&mut state, 4);
            state.restore_state(token);
            cell.set(&mut state, 9);

            state.restore_state(token);

            assert_eq!(cell.get(&state), 9);
        }
    }
}

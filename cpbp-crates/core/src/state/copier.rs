use super::ReversibleFloat;
use super::ReversibleInt;
use super::ReversibleStore;
use super::StateToken;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::cpbp_assert_simple;

/// A [`ReversibleStore`] which copies every cell when a snapshot is taken.
///
/// Cells created after a snapshot are not part of it, and keep their value when that snapshot
/// is restored.
#[derive(Debug, Clone, Default)]
pub struct Copier {
    ints: CopiedArena<ReversibleInt, i64>,
    floats: CopiedArena<ReversibleFloat, f64>,
}

impl ReversibleStore for Copier {
    fn save_state(&mut self) -> StateToken {
        let token = StateToken::new(self.level());

        self.ints.save();
        self.floats.save();

        token
    }

    fn restore_state(&mut self, token: StateToken) {
        cpbp_assert_simple!(
            token.level() <= self.level(),
            "Cannot restore to a snapshot which was already undone"
        );
        if token.level() == self.level() {
            return;
        }

        self.ints.restore(token.level());
        self.floats.restore(token.level());
    }

    fn level(&self) -> usize {
        self.ints.snapshots.len()
    }

    fn new_int(&mut self, initial_value: i64) -> ReversibleInt {
        self.ints.values.push(initial_value)
    }

    fn read_int(&self, cell: ReversibleInt) -> i64 {
        self.ints.values[cell]
    }

    fn write_int(&mut self, cell: ReversibleInt, value: i64) {
        self.ints.values[cell] = value;
    }

    fn new_float(&mut self, initial_value: f64) -> ReversibleFloat {
        self.floats.values.push(initial_value)
    }

    fn read_float(&self, cell: ReversibleFloat) -> f64 {
        self.floats.values[cell]
    }

    fn write_float(&mut self, cell: ReversibleFloat, value: f64) {
        self.floats.values[cell] = value;
    }
}

#[derive(Debug, Clone)]
struct CopiedArena<Key, Value> {
    values: KeyedVec<Key, Value>,
    snapshots: Vec<Box<[Value]>>,
}

impl<Key, Value> Default for CopiedArena<Key, Value> {
    fn default() -> Self {
        Self {
            values: KeyedVec::default(),
            snapshots: Vec::default(),
        }
    }
}

impl<Key: StorageKey, Value: Copy> CopiedArena<Key, Value> {
    fn save(&mut self) {
        self.snapshots.push(self.values.as_slice().into());
    }

    fn restore(&mut self, level: usize) {
        self.snapshots.truncate(level + 1);
        if let Some(snapshot) = self.snapshots.pop() {
            for (index, &value) in snapshot.iter().enumerate() {
                self.values[Key::create_from_index(index)] = value;
            }
        }
    }
}

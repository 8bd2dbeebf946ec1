use super::ReversibleFloat;
use super::ReversibleInt;
use super::ReversibleStore;
use super::StateToken;
use crate::basic_types::Trail;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::cpbp_assert_simple;

/// A [`ReversibleStore`] which logs the previous value of a cell on a trail.
///
/// A cell is only recorded the first time it changes after a snapshot: every cell carries the
/// stamp of the last snapshot at which it was recorded, and the stamp is refreshed whenever a
/// snapshot is taken or restored.
#[derive(Debug, Clone, Default)]
pub struct Trailer {
    ints: TrailedArena<ReversibleInt, i64>,
    floats: TrailedArena<ReversibleFloat, f64>,
    /// The stamp which identifies the current snapshot.
    magic: u64,
}

impl Trailer {
    /// The number of previous values which are currently recorded.
    pub fn trail_len(&self) -> usize {
        self.ints.trail.len() + self.floats.trail.len()
    }
}

impl ReversibleStore for Trailer {
    fn save_state(&mut self) -> StateToken {
        let token = StateToken::new(self.level());

        self.magic += 1;
        self.ints.trail.new_checkpoint();
        self.floats.trail.new_checkpoint();

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

        self.ints.synchronise(token.level());
        self.floats.synchronise(token.level());
        self.magic += 1;
    }

    fn level(&self) -> usize {
        self.ints.trail.get_checkpoint()
    }

    fn new_int(&mut self, initial_value: i64) -> ReversibleInt {
        self.ints.grow(initial_value, self.magic)
    }

    fn read_int(&self, cell: ReversibleInt) -> i64 {
        self.ints.values[cell]
    }

    fn write_int(&mut self, cell: ReversibleInt, value: i64) {
        self.ints.write(cell, value, self.magic)
    }

    fn new_float(&mut self, initial_value: f64) -> ReversibleFloat {
        self.floats.grow(initial_value, self.magic)
    }

    fn read_float(&self, cell: ReversibleFloat) -> f64 {
        self.floats.values[cell]
    }

    fn write_float(&mut self, cell: ReversibleFloat, value: f64) {
        self.floats.write(cell, value, self.magic)
    }
}

#[derive(Debug, Clone)]
struct TrailedChange<Key, Value> {
    reference: Key,
    old_value: Value,
}

#[derive(Debug, Clone)]
struct TrailedArena<Key, Value> {
    trail: Trail<TrailedChange<Key, Value>>,
    values: KeyedVec<Key, Value>,
    stamps: KeyedVec<Key, u64>,
}

impl<Key, Value> Default for TrailedArena<Key, Value> {
    fn default() -> Self {
        Self {
            trail: Trail::default(),
            values: KeyedVec::default(),
            stamps: KeyedVec::default(),
        }
    }
}

impl<Key: StorageKey, Value: Copy + PartialEq> TrailedArena<Key, Value> {
    fn grow(&mut self, initial_value: Value, magic: u64) -> Key {
        // A new cell counts as recorded for the current snapshot; there is nothing to restore it
        // to.
        let _ = self.stamps.push(magic);
        self.values.push(initial_value)
    }

    fn write(&mut self, reference: Key, value: Value, magic: u64) {
        let old_value = self.values[reference.clone()];
        if old_value == value {
            return;
        }

        if self.stamps[reference.clone()] != magic {
            self.stamps[reference.clone()] = magic;
            self.trail.push(TrailedChange {
                reference: reference.clone(),
                old_value,
            });
        }
        self.values[reference] = value;
    }

    fn synchronise(&mut self, new_checkpoint: usize) {
        let TrailedArena { trail, values, .. } = self;
        trail
            .synchronise(new_checkpoint)
            .for_each(|change| values[change.reference] = change.old_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ReversibleCell;

    #[test]
    fn only_the_first_change_after_a_snapshot_is_recorded() {
        let mut trailer = Trailer::default();
        let cell = trailer.new_int(0);

        let token = trailer.save_state();
        for value in 1..=10 {
            cell.set(&mut trailer, value);
        }
        assert_eq!(trailer.trail_len(), 1);

        trailer.restore_state(token);
        assert_eq!(cell.get(&trailer), 0);
        assert_eq!(trailer.trail_len(), 0);
    }

    #[test]
    fn writing_the_same_value_is_not_recorded() {
        let mut trailer = Trailer::default();
        let cell = trailer.new_float(0.5);

        let _ = trailer.save_state();
        cell.set(&mut trailer, 0.5);

        assert_eq!(trailer.trail_len(), 0);
    }

    #[test]
    fn changes_are_recorded_again_after_restoring() {
        let mut trailer = Trailer::default();
        let cell = trailer.new_int(0);

        let root = trailer.save_state();
        cell.set(&mut trailer, 1);
        let child = trailer.save_state();
        cell.set(&mut trailer, 2);
        trailer.restore_state(child);
        cell.set(&mut trailer, 3);
        assert_eq!(cell.get(&trailer), 3);

        trailer.restore_state(root);
        assert_eq!(cell.get(&trailer), 0);
    }
}

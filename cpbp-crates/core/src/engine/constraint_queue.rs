use std::collections::VecDeque;

use super::ConstraintId;
use crate::containers::KeyedVec;

/// The first-in first-out queue of constraints awaiting propagation.
///
/// A constraint is present at most once; scheduling an already scheduled constraint is a no-op.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConstraintQueue {
    queue: VecDeque<ConstraintId>,
    is_scheduled: KeyedVec<ConstraintId, bool>,
}

impl ConstraintQueue {
    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn enqueue(&mut self, constraint: ConstraintId) {
        if !self.is_scheduled(constraint) {
            self.is_scheduled.accomodate(constraint, false);
            self.is_scheduled[constraint] = true;
            self.queue.push_back(constraint);
        }
    }

    pub(crate) fn pop(&mut self) -> Option<ConstraintId> {
        let next = self.queue.pop_front();
        if let Some(constraint) = next {
            self.is_scheduled[constraint] = false;
        }
        next
    }

    /// Drops every scheduled constraint, as happens after a failure.
    pub(crate) fn clear(&mut self) {
        for constraint in self.queue.drain(..) {
            self.is_scheduled[constraint] = false;
        }
    }

    pub(crate) fn is_scheduled(&self, constraint: ConstraintId) -> bool {
        self.is_scheduled
            .get(constraint)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;

    fn id(index: usize) -> ConstraintId {
        ConstraintId::create_from_index(index)
    }

    #[test]
    fn constraints_are_popped_in_scheduling_order() {
        let mut queue = ConstraintQueue::default();

        queue.enqueue(id(3));
        queue.enqueue(id(0));
        queue.enqueue(id(2));

        assert_eq!(queue.pop(), Some(id(3)));
        assert_eq!(queue.pop(), Some(id(0)));
        assert_eq!(queue.pop(), Some(id(2)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn scheduling_twice_keeps_a_single_entry() {
        let mut queue = ConstraintQueue::default();

        queue.enqueue(id(1));
        queue.enqueue(id(4));
        queue.enqueue(id(1));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(id(1)));

        // Once popped, it can be scheduled again.
        queue.enqueue(id(1));
        assert_eq!(queue.pop(), Some(id(4)));
        assert_eq!(queue.pop(), Some(id(1)));
    }

    #[test]
    fn clear_unschedules_everything() {
        let mut queue = ConstraintQueue::default();
        queue.enqueue(id(0));
        queue.enqueue(id(1));

        queue.clear();

        assert!(queue.is_empty());
        assert!(!queue.is_scheduled(id(0)));
        queue.enqueue(id(0));
        assert_eq!(queue.pop(), Some(id(0)));
    }
}

use super::ReversibleCell;
use super::ReversibleInt;
use super::ReversibleStore;

/// An append-only list whose length is reversible.
///
/// Elements pushed after a snapshot disappear when it is restored. The backing storage is not
/// shrunk; slots beyond the current length are overwritten by later pushes.
#[derive(Debug, Clone)]
pub struct ReversibleList<T> {
    elements: Vec<T>,
    len: ReversibleInt,
}

impl<T: Copy> ReversibleList<T> {
    pub fn new(store: &mut impl ReversibleStore) -> ReversibleList<T> {
        ReversibleList {
            elements: Vec::new(),
            len: store.new_int(0),
        }
    }

    pub fn push(&mut self, store: &mut impl ReversibleStore, element: T) {
        let len = self.len(store);
        if len < self.elements.len() {
            self.elements[len] = element;
        } else {
            self.elements.push(element);
        }
        self.len.set(store, len as i64 + 1);
    }

    pub fn len(&self, store: &impl ReversibleStore) -> usize {
        self.len.get(store) as usize
    }

    pub fn is_empty(&self, store: &impl ReversibleStore) -> bool {
        self.len(store) == 0
    }

    pub fn as_slice(&self, store: &impl ReversibleStore) -> &[T] {
        &self.elements[..self.len(store)]
    }
}

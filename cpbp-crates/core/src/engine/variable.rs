use std::fmt::Display;
use std::sync::Arc;

use enumset::EnumSet;

use super::ConstraintId;
use super::DomainEvent;
use super::SparseDomain;
use crate::containers::StorageKey;
use crate::state::ReversibleList;
use crate::state::ReversibleStore;

/// A handle to an integer variable of a [`Solver`](crate::Solver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
    id: u32,
}

impl StorageKey for VariableId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        VariableId { id: index as u32 }
    }
}

impl Display for VariableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.id)
    }
}

/// An integer variable: its domain and, per [`DomainEvent`], the constraints to schedule when
/// that event fires.
///
/// Watchers are kept in reversible lists, so subscriptions made during search are undone on
/// backtrack.
#[derive(Debug, Clone)]
pub(crate) struct IntVariable {
    pub(crate) name: Option<Arc<str>>,
    pub(crate) domain: SparseDomain,
    on_bind: ReversibleList<ConstraintId>,
    on_bounds: ReversibleList<ConstraintId>,
    on_change: ReversibleList<ConstraintId>,
}

impl IntVariable {
    pub(crate) fn new(
        name: Option<Arc<str>>,
        domain: SparseDomain,
        store: &mut impl ReversibleStore,
    ) -> IntVariable {
        IntVariable {
            name,
            domain,
            on_bind: ReversibleList::new(store),
            on_bounds: ReversibleList::new(store),
            on_change: ReversibleList::new(store),
        }
    }

    fn watchers(&self, event: DomainEvent) -> &ReversibleList<ConstraintId> {
        match event {
            DomainEvent::Bind => &self.on_bind,
            DomainEvent::Bounds => &self.on_bounds,
            DomainEvent::Change => &self.on_change,
        }
    }

    pub(crate) fn watch(
        &mut self,
        constraint: ConstraintId,
        event: DomainEvent,
        store: &mut impl ReversibleStore,
    ) {
        let list = match event {
            DomainEvent::Bind => &mut self.on_bind,
            DomainEvent::Bounds => &mut self.on_bounds,
            DomainEvent::Change => &mut self.on_change,
        };
        list.push(store, constraint);
    }

    /// Calls `f` with every constraint watching one of `events`; a constraint watching several
    /// of them is visited once per event.
    pub(crate) fn for_each_watcher(
        &self,
        events: EnumSet<DomainEvent>,
        store: &impl ReversibleStore,
        mut f: impl FnMut(ConstraintId),
    ) {
        for event in events {
            self.watchers(event)
                .as_slice(store)
                .iter()
                .copied()
                .for_each(&mut f);
        }
    }
}

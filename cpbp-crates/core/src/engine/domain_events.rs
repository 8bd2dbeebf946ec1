use std::fmt::Display;

use enumset::EnumSet;
use enumset::EnumSetType;

use super::DomainListener;

/// The kinds of domain changes a constraint can subscribe to.
#[derive(Debug, EnumSetType, Hash)]
pub enum DomainEvent {
    /// The domain collapsed to a single value.
    Bind,
    /// The minimum or the maximum of the domain changed.
    Bounds,
    /// At least one value was removed.
    Change,
}

impl Display for DomainEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainEvent::Bind => write!(f, "[Event:Bind]"),
            DomainEvent::Bounds => write!(f, "[Event:Bounds]"),
            DomainEvent::Change => write!(f, "[Event:Change]"),
        }
    }
}

/// Collects the [`DomainEvent`]s fired by a single domain operation.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct EventCollector {
    pub(crate) events: EnumSet<DomainEvent>,
}

impl DomainListener for EventCollector {
    fn empty(&mut self) {}

    fn bind(&mut self) {
        let _ = self.events.insert(DomainEvent::Bind);
    }

    fn change(&mut self) {
        let _ = self.events.insert(DomainEvent::Change);
    }

    fn change_min(&mut self) {
        let _ = self.events.insert(DomainEvent::Bounds);
    }

    fn change_max(&mut self) {
        let _ = self.events.insert(DomainEvent::Bounds);
    }
}

#[cfg(test)]
mod tests {
    use enumset::enum_set;

    use super::*;
    use crate::engine::SparseDomain;
    use crate::state::StateManager;

    #[test]
    fn binding_by_removing_the_minimum_fires_every_event() {
        let mut store = StateManager::default();
        let mut domain = SparseDomain::new(0, 1, &mut store);
        let mut collector = EventCollector::default();

        domain.remove(0, &mut store, &mut collector).unwrap();

        assert_eq!(
            collector.events,
            enum_set!(DomainEvent::Bind | DomainEvent::Bounds | DomainEvent::Change)
        );
    }

    #[test]
    fn removing_an_inner_value_is_only_a_change() {
        let mut store = StateManager::default();
        let mut domain = SparseDomain::new(0, 4, &mut store);
        let mut collector = EventCollector::default();

        domain.remove(2, &mut store, &mut collector).unwrap();

        assert_eq!(collector.events, enum_set!(DomainEvent::Change));
    }
}

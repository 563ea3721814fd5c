//! PredicateSlot - hot-swappable holder of one compiled predicate
//!
//! Reads are lock-free (`ArcSwap::load_full`). Writes are version-stamped:
//! a publish only lands if its version is newer than the visible one, so a
//! slow, older reconfiguration can never overwrite a newer result.

use std::sync::Arc;

use arc_swap::ArcSwap;
use contracts::{AlwaysFalse, CompiledPredicate, DestinationId};

/// One published predicate and the reconfiguration that produced it
#[derive(Debug, Clone)]
pub struct Published {
    /// 0 for the construction default
    pub version: u64,
    pub predicate: CompiledPredicate,
}

/// Atomic holder of the active predicate for one destination
#[derive(Debug)]
pub struct PredicateSlot {
    current: ArcSwap<Published>,
}

impl Default for PredicateSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl PredicateSlot {
    /// Slot holding the always-false predicate at version 0
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Published {
                version: 0,
                predicate: AlwaysFalse::shared(),
            }),
        }
    }

    /// Last published value; never blocks
    pub fn read(&self) -> Arc<Published> {
        self.current.load_full()
    }

    /// Version of the visible predicate
    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Publish `predicate` if `version` is newer than the visible one
    ///
    /// Returns `false` when a newer (or equal) version is already visible.
    pub fn publish(&self, version: u64, predicate: CompiledPredicate) -> bool {
        let next = Arc::new(Published { version, predicate });
        let mut current = self.current.load();
        loop {
            if current.version >= version {
                return false;
            }
            let previous = self.current.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&*previous, &*current) {
                return true;
            }
            current = previous;
        }
    }
}

/// The two slots of one router
#[derive(Debug, Default)]
pub struct RoutingSlots {
    a: PredicateSlot,
    b: PredicateSlot,
}

impl RoutingSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, destination: DestinationId) -> &PredicateSlot {
        match destination {
            DestinationId::A => &self.a,
            DestinationId::B => &self.b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, LogEvent, LogLevel, Predicate};
    use std::thread;

    struct Constant(bool, &'static str);

    impl Predicate for Constant {
        fn evaluate(&self, _event: &LogEvent) -> Result<bool, ContractError> {
            Ok(self.0)
        }

        fn source(&self) -> &str {
            self.1
        }
    }

    #[test]
    fn test_new_slot_denies() {
        let slot = PredicateSlot::new();
        let published = slot.read();
        assert_eq!(published.version, 0);
        assert_eq!(published.predicate.source(), "false");
        let event = LogEvent::new(LogLevel::Fatal, "x");
        assert!(!published.predicate.evaluate(&event).unwrap());
    }

    #[test]
    fn test_publish_newer_wins() {
        let slot = PredicateSlot::new();
        assert!(slot.publish(2, Arc::new(Constant(true, "two"))));
        assert_eq!(slot.version(), 2);

        // stale and duplicate versions are rejected
        assert!(!slot.publish(1, Arc::new(Constant(false, "one"))));
        assert!(!slot.publish(2, Arc::new(Constant(false, "two again"))));
        assert_eq!(slot.read().predicate.source(), "two");

        assert!(slot.publish(3, Arc::new(Constant(false, "three"))));
        assert_eq!(slot.read().predicate.source(), "three");
    }

    #[test]
    fn test_old_reader_keeps_its_snapshot() {
        let slot = PredicateSlot::new();
        let before = slot.read();
        slot.publish(1, Arc::new(Constant(true, "new")));
        assert_eq!(before.predicate.source(), "false");
        assert_eq!(slot.read().predicate.source(), "new");
    }

    #[test]
    fn test_concurrent_publish_keeps_highest() {
        let slot = Arc::new(PredicateSlot::new());
        let handles: Vec<_> = (1..=8u64)
            .map(|v| {
                let slot = Arc::clone(&slot);
                thread::spawn(move || {
                    slot.publish(v, Arc::new(Constant(true, "v")));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(slot.version(), 8);
    }

    #[test]
    fn test_routing_slots_are_independent() {
        let slots = RoutingSlots::new();
        slots
            .get(DestinationId::A)
            .publish(1, Arc::new(Constant(true, "a")));
        assert_eq!(slots.get(DestinationId::A).read().predicate.source(), "a");
        assert_eq!(slots.get(DestinationId::B).read().predicate.source(), "false");
    }
}

//! Typed simulation events with a bounded, suppressible buffer.
//!
//! Events are recorded during the transfer and process phases and drained
//! in batch by passive consumers (UI, audio, statistics). The log is a ring
//! buffer: when full, the oldest events are dropped. Suppressed kinds are
//! never recorded and cost nothing.

use crate::fixed::Ticks;
use crate::id::{EntityId, LinkId};
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An item was deposited into an acceptor slot.
    ItemAccepted {
        entity: EntityId,
        slot: usize,
        tick: Ticks,
    },
    /// An item crossed a link from an ejector slot to an acceptor slot.
    ItemTransferred { link: LinkId, tick: Ticks },
    /// A processor buffer filled and its charge began.
    ChargeStarted { entity: EntityId, tick: Ticks },
    /// A charge completed and its transform ran.
    ChargeCompleted { entity: EntityId, tick: Ticks },
    /// An item was queued into an ejector slot.
    ItemEjected {
        entity: EntityId,
        slot: usize,
        tick: Ticks,
    },
    /// A completed charge could not fully eject; the entity holds pending
    /// outputs and will not start a new charge until they drain.
    OutputBlocked { entity: EntityId, tick: Ticks },
}

/// Discriminant tag for event types, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemAccepted,
    ItemTransferred,
    ChargeStarted,
    ChargeCompleted,
    ItemEjected,
    OutputBlocked,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 6;

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ItemAccepted { .. } => EventKind::ItemAccepted,
            Event::ItemTransferred { .. } => EventKind::ItemTransferred,
            Event::ChargeStarted { .. } => EventKind::ChargeStarted,
            Event::ChargeCompleted { .. } => EventKind::ChargeCompleted,
            Event::ItemEjected { .. } => EventKind::ItemEjected,
            Event::OutputBlocked { .. } => EventKind::OutputBlocked,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Default capacity for the event ring buffer.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A bounded buffer of simulation events.
#[derive(Debug)]
pub struct EventLog {
    events: VecDeque<Event>,
    capacity: usize,
    suppressed: [bool; EVENT_KIND_COUNT],
    /// Total events ever recorded (including dropped ones).
    total_recorded: u64,
}

impl EventLog {
    /// Create a log with the given capacity. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            suppressed: [false; EVENT_KIND_COUNT],
            total_recorded: 0,
        }
    }

    /// Record an event. Suppressed kinds are ignored; when the buffer is
    /// full, the oldest event is dropped.
    pub fn record(&mut self, event: Event) {
        if self.suppressed[event.kind().index()] {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.total_recorded += 1;
    }

    /// Stop recording a kind entirely.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
    }

    /// Resume recording a kind.
    pub fn unsuppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = false;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    /// Iterate buffered events oldest-to-newest without draining.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Remove and return all buffered events, oldest first.
    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn entity() -> EntityId {
        let mut map: SlotMap<EntityId, ()> = SlotMap::with_key();
        map.insert(())
    }

    #[test]
    fn record_and_drain_preserves_order() {
        let mut log = EventLog::new(8);
        let e = entity();
        log.record(Event::ChargeStarted { entity: e, tick: 1 });
        log.record(Event::ChargeCompleted { entity: e, tick: 3 });
        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind(), EventKind::ChargeStarted);
        assert_eq!(drained[1].kind(), EventKind::ChargeCompleted);
        assert!(log.is_empty());
    }

    #[test]
    fn full_buffer_drops_oldest() {
        let mut log = EventLog::new(2);
        let e = entity();
        for tick in 0..3 {
            log.record(Event::ChargeCompleted { entity: e, tick });
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.total_recorded(), 3);
        let drained = log.drain();
        assert_eq!(drained[0], Event::ChargeCompleted { entity: e, tick: 1 });
    }

    #[test]
    fn suppressed_kinds_are_not_recorded() {
        let mut log = EventLog::new(8);
        let e = entity();
        log.suppress(EventKind::ChargeStarted);
        log.record(Event::ChargeStarted { entity: e, tick: 0 });
        log.record(Event::ChargeCompleted { entity: e, tick: 0 });
        assert_eq!(log.len(), 1);
        assert_eq!(log.total_recorded(), 1);

        log.unsuppress(EventKind::ChargeStarted);
        log.record(Event::ChargeStarted { entity: e, tick: 1 });
        assert_eq!(log.len(), 2);
    }
}

//! Item acceptor component: a building's directional input slots.
//!
//! Each slot holds at most one item at a time, remembers the direction the
//! item arrived from, and rejects deposits that violate its direction set or
//! kind filter. Rejection is the backpressure signal to whatever is
//! upstream; it is never an error.

use crate::geometry::{Direction, SlotGeometry};
use crate::item::Item;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AcceptorSlot
// ---------------------------------------------------------------------------

/// A single input slot: geometry plus the item currently held, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptorSlot {
    geometry: SlotGeometry,
    held: Option<HeldItem>,
}

/// An item resting in an acceptor slot, tagged with its arrival direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct HeldItem {
    item: Item,
    source_direction: Direction,
}

impl AcceptorSlot {
    fn new(geometry: SlotGeometry) -> Self {
        Self {
            geometry,
            held: None,
        }
    }

    pub fn geometry(&self) -> &SlotGeometry {
        &self.geometry
    }

    pub fn is_occupied(&self) -> bool {
        self.held.is_some()
    }

    /// The direction the currently held item arrived from, if any.
    pub fn source_direction(&self) -> Option<Direction> {
        self.held.as_ref().map(|h| h.source_direction)
    }
}

// ---------------------------------------------------------------------------
// ItemAcceptorComponent
// ---------------------------------------------------------------------------

/// Owns a building's input slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAcceptorComponent {
    slots: Vec<AcceptorSlot>,
}

impl ItemAcceptorComponent {
    pub fn new(slots: Vec<SlotGeometry>) -> Self {
        Self {
            slots: slots.into_iter().map(AcceptorSlot::new).collect(),
        }
    }

    /// Replace all slot definitions, clearing any held items. Used on
    /// variant or rotation change.
    pub fn try_set_slots(&mut self, slots: Vec<SlotGeometry>) {
        self.slots = slots.into_iter().map(AcceptorSlot::new).collect();
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[AcceptorSlot] {
        &self.slots
    }

    /// Deposit an item into a slot. Succeeds iff the slot exists, is empty,
    /// allows `from_direction`, and the item passes the slot filter. On
    /// failure the item is handed back unchanged so the caller can retry
    /// next tick.
    #[must_use = "a rejected item must be retried or kept upstream"]
    pub fn try_accept(
        &mut self,
        slot_index: usize,
        item: Item,
        from_direction: Direction,
    ) -> Result<(), Item> {
        let Some(slot) = self.slots.get_mut(slot_index) else {
            return Err(item);
        };
        if slot.held.is_some()
            || !slot.geometry.directions.contains(from_direction)
            || !item.matches(slot.geometry.filter)
        {
            return Err(item);
        }
        slot.held = Some(HeldItem {
            item,
            source_direction: from_direction,
        });
        Ok(())
    }

    /// Read-only look at the item held in a slot.
    pub fn peek(&self, slot_index: usize) -> Option<&Item> {
        self.slots
            .get(slot_index)
            .and_then(|s| s.held.as_ref())
            .map(|h| &h.item)
    }

    /// Remove and return the held item. Empty slots yield `None`.
    pub fn consume(&mut self, slot_index: usize) -> Option<Item> {
        self.slots
            .get_mut(slot_index)
            .and_then(|s| s.held.take())
            .map(|h| h.item)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

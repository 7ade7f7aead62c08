//! Item ejector component: a building's directional output slots.
//!
//! Each slot queues at most one item for ejection toward a direction fixed
//! at configuration time. A full slot rejects further outputs, which is the
//! backpressure signal that eventually stalls the processor upstream.

use crate::geometry::{Direction, TilePos};
use crate::item::Item;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Slot definitions
// ---------------------------------------------------------------------------

/// Configuration of one output slot: a position within the footprint and
/// the single outbound direction. The direction is fixed by variant wiring,
/// never per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EjectorSlotSpec {
    pub pos: TilePos,
    pub direction: Direction,
}

impl EjectorSlotSpec {
    pub const fn new(pos: TilePos, direction: Direction) -> Self {
        Self { pos, direction }
    }
}

/// A single output slot: spec plus the item queued for ejection, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EjectorSlot {
    spec: EjectorSlotSpec,
    queued: Option<Item>,
}

impl EjectorSlot {
    fn new(spec: EjectorSlotSpec) -> Self {
        Self { spec, queued: None }
    }

    pub fn pos(&self) -> TilePos {
        self.spec.pos
    }

    pub fn direction(&self) -> Direction {
        self.spec.direction
    }

    pub fn is_occupied(&self) -> bool {
        self.queued.is_some()
    }
}

// ---------------------------------------------------------------------------
// ItemEjectorComponent
// ---------------------------------------------------------------------------

/// Owns a building's output slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEjectorComponent {
    slots: Vec<EjectorSlot>,
}

impl ItemEjectorComponent {
    pub fn new(slots: Vec<EjectorSlotSpec>) -> Self {
        Self {
            slots: slots.into_iter().map(EjectorSlot::new).collect(),
        }
    }

    /// Replace all output slot definitions, clearing any queued items.
    pub fn set_slots(&mut self, slots: Vec<EjectorSlotSpec>) {
        self.slots = slots.into_iter().map(EjectorSlot::new).collect();
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[EjectorSlot] {
        &self.slots
    }

    /// Queue an item for ejection. Succeeds iff the slot exists and is
    /// empty. On failure the item is handed back; the processor holds it
    /// until the slot frees.
    #[must_use = "a rejected item must be held until the slot frees"]
    pub fn try_eject(&mut self, slot_index: usize, item: Item) -> Result<(), Item> {
        let Some(slot) = self.slots.get_mut(slot_index) else {
            return Err(item);
        };
        if slot.queued.is_some() {
            return Err(item);
        }
        slot.queued = Some(item);
        Ok(())
    }

    /// The queued item and its outbound direction, for downstream transport
    /// to pull.
    pub fn peek(&self, slot_index: usize) -> Option<(&Item, Direction)> {
        self.slots
            .get(slot_index)
            .and_then(|s| s.queued.as_ref().map(|item| (item, s.spec.direction)))
    }

    /// Remove and return the queued item. Empty slots yield `None`.
    pub fn consume(&mut self, slot_index: usize) -> Option<Item> {
        self.slots.get_mut(slot_index).and_then(|s| s.queued.take())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

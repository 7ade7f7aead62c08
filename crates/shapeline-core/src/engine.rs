//! The processing engine: owns the entity registry and orchestrates the
//! per-tick pipeline.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - An entity registry (`SlotMap<EntityId, BuildingState>`)
//! - Per-entity component state in `SecondaryMap`s: acceptor, ejector,
//!   processor, and pending outputs
//! - Transfer links between an ejector slot and an acceptor slot
//! - A [`SimState`] (tick counter) and an [`EventLog`]
//!
//! # Two-Phase Pipeline
//!
//! Each `step()` runs:
//! 1. **Transfer** -- for every link in insertion order, move the queued
//!    ejector item into the linked acceptor slot if it is willing to take
//!    it. Every ejection made before this step is visible to every
//!    acceptance within it; this single global ordering keeps throughput
//!    independent of entity insertion order.
//! 2. **Process** -- for every entity in key order: retry pending outputs,
//!    drain held acceptor items into the processor buffer, advance the
//!    charge at the externally supplied speed, and route completed-charge
//!    outputs positionally into ejector slots. Outputs that find their slot
//!    occupied are parked as pending; an entity with pending outputs
//!    accrues no progress and starts no new charge.
//! 3. **Bookkeeping** -- increment the tick counter and recompute the
//!    state hash.
//!
//! Everything is single threaded and cooperative; a stalled entity simply
//! stays idle with its bounded slots and buffer intact.

use crate::acceptor::ItemAcceptorComponent;
use crate::building::{BuildingVariant, VariantSpec};
use crate::ejector::ItemEjectorComponent;
use crate::error::ConfigError;
use crate::event::{Event, EventLog};
use crate::fixed::Fixed64;
use crate::geometry::{Direction, Rotation};
use crate::id::{EntityId, LinkId};
use crate::item::Item;
use crate::processor::{ChargeState, ItemProcessorComponent, ProcessorType};
use crate::sim::{SimState, StateHash};
use crate::transform::TransformTable;
use serde::{Deserialize, Serialize};
use slotmap::{Key, SecondaryMap, SlotMap};

// ---------------------------------------------------------------------------
// Speed source
// ---------------------------------------------------------------------------

/// Supplies the charges-per-second rate for each processor type. The engine
/// re-reads this every step, so rate changes (upgrades) take effect
/// immediately without touching entity state.
pub trait SpeedSource {
    fn processor_speed(&self, processor_type: ProcessorType) -> Fixed64;
}

/// The same speed for every processor type. Handy for tests and tools.
#[derive(Debug, Clone, Copy)]
pub struct UniformSpeed(pub Fixed64);

impl SpeedSource for UniformSpeed {
    fn processor_speed(&self, _processor_type: ProcessorType) -> Fixed64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Entity and link state
// ---------------------------------------------------------------------------

/// Per-entity placement bookkeeping: which variant is applied and at what
/// rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingState {
    pub variant: BuildingVariant,
    pub rotation: Rotation,
}

/// An ejector slot wired to an acceptor slot on another entity. The item
/// arrives from the direction opposite to the ejection direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from: EntityId,
    pub from_slot: usize,
    pub to: EntityId,
    pub to_slot: usize,
}

/// A produced item parked until its designated ejector slot frees up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOutput {
    pub slot: usize,
    pub item: Item,
}

// ---------------------------------------------------------------------------
// Step report
// ---------------------------------------------------------------------------

/// The outcome of a single `step()` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Items moved across links during the transfer phase.
    pub items_transferred: u32,
    /// Charges whose transform ran this step.
    pub charges_completed: u32,
    /// Items queued into ejector slots this step.
    pub items_ejected: u32,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The core processing engine.
#[derive(Debug)]
pub struct Engine {
    pub(crate) entities: SlotMap<EntityId, BuildingState>,

    // -- Per-entity state (SoA, keyed by EntityId) --
    pub(crate) acceptors: SecondaryMap<EntityId, ItemAcceptorComponent>,
    pub(crate) ejectors: SecondaryMap<EntityId, ItemEjectorComponent>,
    pub(crate) processors: SecondaryMap<EntityId, ItemProcessorComponent>,
    pub(crate) pending: SecondaryMap<EntityId, Vec<PendingOutput>>,

    // -- Links --
    pub(crate) links: SlotMap<LinkId, Link>,
    /// Link firing order for the transfer phase: insertion order.
    pub(crate) link_order: Vec<LinkId>,

    pub(crate) sim_state: SimState,
    pub(crate) last_state_hash: u64,

    /// Typed event buffer, drained by passive consumers.
    pub(crate) events: EventLog,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            acceptors: SecondaryMap::new(),
            ejectors: SecondaryMap::new(),
            processors: SecondaryMap::new(),
            pending: SecondaryMap::new(),
            links: SlotMap::with_key(),
            link_order: Vec::new(),
            sim_state: SimState::new(),
            last_state_hash: 0,
            events: EventLog::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Entity management
    // -----------------------------------------------------------------------

    /// Place a building, creating its components from the variant table.
    pub fn place(
        &mut self,
        variant: BuildingVariant,
        rotation: Rotation,
    ) -> Result<EntityId, ConfigError> {
        let spec = variant.spec(rotation)?;
        let processor =
            ItemProcessorComponent::new(spec.processor_type, spec.inputs_per_charge)?;
        let entity = self.entities.insert(BuildingState { variant, rotation });
        self.acceptors
            .insert(entity, ItemAcceptorComponent::new(spec.acceptor_slots));
        self.ejectors
            .insert(entity, ItemEjectorComponent::new(spec.ejector_slots));
        self.processors.insert(entity, processor);
        self.pending.insert(entity, Vec::new());
        Ok(entity)
    }

    /// Re-apply a variant to an existing entity, as when the player changes
    /// variant or rotation. Slot lists are replaced wholesale (clearing
    /// held and queued items) and the processor is reconfigured; the charge
    /// buffer survives under the processor's reconfiguration rules. Pending
    /// outputs are discarded with the old wiring.
    pub fn update_variant(
        &mut self,
        entity: EntityId,
        variant: BuildingVariant,
        rotation: Rotation,
    ) -> Result<(), ConfigError> {
        let spec = variant.spec(rotation)?;
        let state = self
            .entities
            .get_mut(entity)
            .ok_or(ConfigError::UnknownEntity)?;
        state.variant = variant;
        state.rotation = rotation;
        self.apply_spec(entity, spec)
    }

    fn apply_spec(&mut self, entity: EntityId, spec: VariantSpec) -> Result<(), ConfigError> {
        if let Some(acceptor) = self.acceptors.get_mut(entity) {
            acceptor.try_set_slots(spec.acceptor_slots);
        }
        if let Some(ejector) = self.ejectors.get_mut(entity) {
            ejector.set_slots(spec.ejector_slots);
        }
        if let Some(processor) = self.processors.get_mut(entity) {
            processor.reconfigure(spec.processor_type, spec.inputs_per_charge)?;
        }
        if let Some(pending) = self.pending.get_mut(entity) {
            pending.clear();
        }
        Ok(())
    }

    /// Remove a building and every link touching it.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        if self.entities.remove(entity).is_none() {
            return false;
        }
        self.acceptors.remove(entity);
        self.ejectors.remove(entity);
        self.processors.remove(entity);
        self.pending.remove(entity);

        let dead: Vec<LinkId> = self
            .links
            .iter()
            .filter(|(_, link)| link.from == entity || link.to == entity)
            .map(|(id, _)| id)
            .collect();
        for id in dead {
            self.links.remove(id);
            self.link_order.retain(|&l| l != id);
        }
        true
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn building(&self, entity: EntityId) -> Option<&BuildingState> {
        self.entities.get(entity)
    }

    // -----------------------------------------------------------------------
    // Component access
    // -----------------------------------------------------------------------

    pub fn acceptor(&self, entity: EntityId) -> Option<&ItemAcceptorComponent> {
        self.acceptors.get(entity)
    }

    pub fn acceptor_mut(&mut self, entity: EntityId) -> Option<&mut ItemAcceptorComponent> {
        self.acceptors.get_mut(entity)
    }

    pub fn ejector(&self, entity: EntityId) -> Option<&ItemEjectorComponent> {
        self.ejectors.get(entity)
    }

    pub fn ejector_mut(&mut self, entity: EntityId) -> Option<&mut ItemEjectorComponent> {
        self.ejectors.get_mut(entity)
    }

    pub fn processor(&self, entity: EntityId) -> Option<&ItemProcessorComponent> {
        self.processors.get(entity)
    }

    /// Outputs parked behind occupied ejector slots.
    pub fn pending_outputs(&self, entity: EntityId) -> &[PendingOutput] {
        self.pending.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    // -----------------------------------------------------------------------
    // Links
    // -----------------------------------------------------------------------

    /// Wire an ejector slot to an acceptor slot. Slot indices are validated
    /// against the current component configuration.
    pub fn connect(
        &mut self,
        from: EntityId,
        from_slot: usize,
        to: EntityId,
        to_slot: usize,
    ) -> Result<LinkId, ConfigError> {
        let ejector = self.ejectors.get(from).ok_or(ConfigError::UnknownEntity)?;
        if from_slot >= ejector.slot_count() {
            return Err(ConfigError::SlotIndex {
                index: from_slot,
                len: ejector.slot_count(),
            });
        }
        let acceptor = self.acceptors.get(to).ok_or(ConfigError::UnknownEntity)?;
        if to_slot >= acceptor.slot_count() {
            return Err(ConfigError::SlotIndex {
                index: to_slot,
                len: acceptor.slot_count(),
            });
        }
        let id = self.links.insert(Link {
            from,
            from_slot,
            to,
            to_slot,
        });
        self.link_order.push(id);
        Ok(id)
    }

    pub fn disconnect(&mut self, link: LinkId) -> bool {
        if self.links.remove(link).is_some() {
            self.link_order.retain(|&l| l != link);
            true
        } else {
            false
        }
    }

    pub fn link(&self, link: LinkId) -> Option<&Link> {
        self.links.get(link)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    // -----------------------------------------------------------------------
    // External item exchange
    // -----------------------------------------------------------------------

    /// Deposit an item into an acceptor slot from outside the engine (an
    /// upstream belt, a test). Rejection hands the item back; retry next
    /// tick.
    #[must_use = "a rejected item must be retried or kept upstream"]
    pub fn offer_item(
        &mut self,
        entity: EntityId,
        slot: usize,
        item: Item,
        from_direction: Direction,
    ) -> Result<(), Item> {
        let Some(acceptor) = self.acceptors.get_mut(entity) else {
            return Err(item);
        };
        acceptor.try_accept(slot, item, from_direction)?;
        self.events.record(Event::ItemAccepted {
            entity,
            slot,
            tick: self.sim_state.tick,
        });
        Ok(())
    }

    /// Pull a queued item out of an ejector slot, as downstream transport
    /// does.
    pub fn take_output(&mut self, entity: EntityId, slot: usize) -> Option<Item> {
        self.ejectors.get_mut(entity)?.consume(slot)
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    /// Remove and return all buffered events, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    pub fn tick(&self) -> u64 {
        self.sim_state.tick
    }

    /// The state hash computed at the end of the most recent step.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    /// Advance the simulation by one step of `dt` seconds. Speeds are
    /// re-read from `speeds` for every entity; transforms come from the
    /// game-content table.
    pub fn step(
        &mut self,
        dt: Fixed64,
        speeds: &dyn SpeedSource,
        transforms: &dyn TransformTable,
    ) -> StepReport {
        let mut report = StepReport::default();
        let tick = self.sim_state.tick;

        // Phase 1: transfer. All previously queued ejections are visible
        // before any acceptance below.
        for i in 0..self.link_order.len() {
            let link_id = self.link_order[i];
            let Some(link) = self.links.get(link_id).copied() else {
                continue;
            };
            let Some((item, direction)) = self
                .ejectors
                .get(link.from)
                .and_then(|e| e.peek(link.from_slot))
            else {
                continue;
            };
            let arrival = direction.opposite();
            let item = item.clone();
            let Some(acceptor) = self.acceptors.get_mut(link.to) else {
                continue;
            };
            if acceptor.try_accept(link.to_slot, item, arrival).is_ok() {
                if let Some(ejector) = self.ejectors.get_mut(link.from) {
                    let _ = ejector.consume(link.from_slot);
                }
                report.items_transferred += 1;
                self.events.record(Event::ItemTransferred {
                    link: link_id,
                    tick,
                });
                self.events.record(Event::ItemAccepted {
                    entity: link.to,
                    slot: link.to_slot,
                    tick,
                });
            }
        }

        // Phase 2: process each entity.
        let ids: Vec<EntityId> = self.entities.keys().collect();
        for id in ids {
            // Retry pending outputs first; a blocked entity may not start a
            // new charge until they drain.
            let mut still: Vec<PendingOutput> = Vec::new();
            let parked = self
                .pending
                .get_mut(id)
                .map(std::mem::take)
                .unwrap_or_default();
            for out in parked {
                match self.ejectors.get_mut(id) {
                    Some(ejector) => match ejector.try_eject(out.slot, out.item) {
                        Ok(()) => {
                            report.items_ejected += 1;
                            self.events.record(Event::ItemEjected {
                                entity: id,
                                slot: out.slot,
                                tick,
                            });
                        }
                        Err(item) => still.push(PendingOutput {
                            slot: out.slot,
                            item,
                        }),
                    },
                    None => still.push(out),
                }
            }
            let blocked = !still.is_empty();

            // Hand-off: drain held acceptor items into the processor
            // buffer. Ownership transfers here.
            if let Some(processor) = self.processors.get_mut(id) {
                let was_charging = processor.charge_state() == ChargeState::Charging;
                if let Some(acceptor) = self.acceptors.get_mut(id) {
                    for slot in 0..acceptor.slot_count() {
                        if !processor.can_accept_more() {
                            break;
                        }
                        if acceptor.peek(slot).is_none() {
                            continue;
                        }
                        let Some(item) = acceptor.consume(slot) else {
                            continue;
                        };
                        if processor.add_to_buffer(item).is_err() {
                            debug_assert!(false, "buffer rejected an item after capacity check");
                            break;
                        }
                    }
                }
                if !was_charging && processor.charge_state() == ChargeState::Charging {
                    self.events.record(Event::ChargeStarted { entity: id, tick });
                }
            }

            // Advance the charge, unless output-blocked.
            if !blocked && let Some(processor) = self.processors.get_mut(id) {
                let speed = speeds.processor_speed(processor.processor_type());
                if let Some(outputs) = processor.advance(dt, speed, transforms) {
                    report.charges_completed += 1;
                    self.events
                        .record(Event::ChargeCompleted { entity: id, tick });
                    for (slot, output) in outputs.into_iter().enumerate() {
                        let Some(item) = output else { continue };
                        match self.ejectors.get_mut(id) {
                            Some(ejector) => match ejector.try_eject(slot, item) {
                                Ok(()) => {
                                    report.items_ejected += 1;
                                    self.events.record(Event::ItemEjected {
                                        entity: id,
                                        slot,
                                        tick,
                                    });
                                }
                                Err(item) => still.push(PendingOutput { slot, item }),
                            },
                            None => still.push(PendingOutput { slot, item }),
                        }
                    }
                    if !still.is_empty() {
                        self.events.record(Event::OutputBlocked { entity: id, tick });
                    }
                }
            }

            if let Some(pending) = self.pending.get_mut(id) {
                *pending = still;
            }
        }

        // Phase 3: bookkeeping.
        self.sim_state.tick += 1;
        self.last_state_hash = self.compute_state_hash();
        report
    }

    /// Compute a deterministic hash of all per-entity state. Entities and
    /// slots are visited in key order, so two engines with the same history
    /// hash identically.
    pub fn compute_state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.sim_state.tick);
        for (id, state) in &self.entities {
            hash.write_u64(id.data().as_ffi());
            hash.write_u8(state.variant as u8);
            hash.write_u8(state.rotation.quarter_turns());

            if let Some(acceptor) = self.acceptors.get(id) {
                for slot in 0..acceptor.slot_count() {
                    match acceptor.peek(slot) {
                        None => hash.write_u8(0),
                        Some(item) => {
                            hash.write_u8(1);
                            item.feed_hash(&mut hash);
                        }
                    }
                }
            }
            if let Some(ejector) = self.ejectors.get(id) {
                for slot in 0..ejector.slot_count() {
                    match ejector.peek(slot) {
                        None => hash.write_u8(0),
                        Some((item, direction)) => {
                            hash.write_u8(1);
                            hash.write_u8(direction as u8);
                            item.feed_hash(&mut hash);
                        }
                    }
                }
            }
            if let Some(processor) = self.processors.get(id) {
                hash.write_u8(processor.processor_type() as u8);
                hash.write_u32(processor.inputs_per_charge());
                hash.write_fixed64(processor.progress());
                hash.write_u32(processor.buffered().len() as u32);
                for item in processor.buffered() {
                    item.feed_hash(&mut hash);
                }
            }
            if let Some(pending) = self.pending.get(id) {
                hash.write_u32(pending.len() as u32);
                for out in pending {
                    hash.write_u32(out.slot as u32);
                    out.item.feed_hash(&mut hash);
                }
            }
        }
        hash.finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::BuildingVariant;
    use crate::item::{Color, Form, Item, ShapeItem};
    use crate::transform::StandardTransforms;

    fn fixed(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    fn circle() -> Item {
        Item::Shape(ShapeItem::full(Form::Circle, Color::Uncolored))
    }

    fn half_second_speed() -> UniformSpeed {
        UniformSpeed(fixed(0.5))
    }

    fn step(engine: &mut Engine, dt: f64) -> StepReport {
        engine.step(fixed(dt), &half_second_speed(), &StandardTransforms)
    }

    // -----------------------------------------------------------------------
    // Placement and configuration
    // -----------------------------------------------------------------------

    #[test]
    fn place_creates_components_from_variant_table() {
        let mut engine = Engine::new();
        let cutter = engine
            .place(BuildingVariant::CutterDefault, Rotation::Deg0)
            .unwrap();
        assert_eq!(engine.acceptor(cutter).unwrap().slot_count(), 1);
        assert_eq!(engine.ejector(cutter).unwrap().slot_count(), 2);
        assert_eq!(
            engine.processor(cutter).unwrap().processor_type(),
            ProcessorType::Cutter
        );
        assert_eq!(engine.entity_count(), 1);
    }

    #[test]
    fn update_variant_rewires_slots_and_preserves_entity() {
        let mut engine = Engine::new();
        let cutter = engine
            .place(BuildingVariant::CutterDefault, Rotation::Deg0)
            .unwrap();
        engine
            .update_variant(cutter, BuildingVariant::CutterQuad, Rotation::Deg0)
            .unwrap();
        assert_eq!(engine.ejector(cutter).unwrap().slot_count(), 4);
        assert_eq!(
            engine.processor(cutter).unwrap().processor_type(),
            ProcessorType::CutterQuad
        );
        assert_eq!(engine.building(cutter).unwrap().variant, BuildingVariant::CutterQuad);
    }

    #[test]
    fn update_variant_on_unknown_entity_fails() {
        let mut engine = Engine::new();
        let ghost = engine
            .place(BuildingVariant::MixerDefault, Rotation::Deg0)
            .unwrap();
        engine.remove(ghost);
        assert_eq!(
            engine.update_variant(ghost, BuildingVariant::MixerMirrored, Rotation::Deg0),
            Err(ConfigError::UnknownEntity)
        );
    }

    #[test]
    fn remove_drops_components_and_links() {
        let mut engine = Engine::new();
        let cutter = engine
            .place(BuildingVariant::CutterDefault, Rotation::Deg0)
            .unwrap();
        let stacker = engine
            .place(BuildingVariant::StackerDefault, Rotation::Deg0)
            .unwrap();
        engine.connect(cutter, 0, stacker, 0).unwrap();
        engine.connect(cutter, 1, stacker, 1).unwrap();
        assert_eq!(engine.link_count(), 2);

        assert!(engine.remove(cutter));
        assert_eq!(engine.link_count(), 0);
        assert!(engine.processor(cutter).is_none());
        assert!(!engine.remove(cutter));
        assert_eq!(engine.entity_count(), 1);
    }

    #[test]
    fn connect_validates_slot_indices() {
        let mut engine = Engine::new();
        let cutter = engine
            .place(BuildingVariant::CutterDefault, Rotation::Deg0)
            .unwrap();
        let mixer = engine
            .place(BuildingVariant::MixerDefault, Rotation::Deg0)
            .unwrap();
        assert_eq!(
            engine.connect(cutter, 2, mixer, 0),
            Err(ConfigError::SlotIndex { index: 2, len: 2 })
        );
        assert_eq!(
            engine.connect(cutter, 0, mixer, 5),
            Err(ConfigError::SlotIndex { index: 5, len: 2 })
        );
    }

    // -----------------------------------------------------------------------
    // Single-entity processing
    // -----------------------------------------------------------------------

    #[test]
    fn cutter_produces_two_halves_after_one_over_speed_seconds() {
        let mut engine = Engine::new();
        let cutter = engine
            .place(BuildingVariant::CutterDefault, Rotation::Deg0)
            .unwrap();
        assert!(engine
            .offer_item(cutter, 0, circle(), Direction::Bottom)
            .is_ok());

        // Speed 0.5 charges/s: the charge needs 2 simulated seconds.
        let r1 = step(&mut engine, 1.0);
        assert_eq!(r1.charges_completed, 0);
        let r2 = step(&mut engine, 1.0);
        assert_eq!(r2.charges_completed, 1);
        assert_eq!(r2.items_ejected, 2);

        let ejector = engine.ejector(cutter).unwrap();
        assert!(ejector.peek(0).is_some());
        assert!(ejector.peek(1).is_some());
        assert!(engine.processor(cutter).unwrap().buffered().is_empty());
    }

    #[test]
    fn mixer_needs_both_inputs_before_charging() {
        let mut engine = Engine::new();
        let mixer = engine
            .place(BuildingVariant::MixerDefault, Rotation::Deg0)
            .unwrap();
        assert!(engine
            .offer_item(mixer, 0, Item::Color(Color::Red), Direction::Bottom)
            .is_ok());

        // A single color item alone never starts progress.
        for _ in 0..10 {
            step(&mut engine, 1.0);
        }
        assert_eq!(engine.processor(mixer).unwrap().progress(), Fixed64::ZERO);

        assert!(engine
            .offer_item(mixer, 1, Item::Color(Color::Green), Direction::Bottom)
            .is_ok());
        step(&mut engine, 1.0);
        step(&mut engine, 1.0);
        assert_eq!(
            engine.take_output(mixer, 0),
            Some(Item::Color(Color::Yellow))
        );
    }

    #[test]
    fn output_backpressure_blocks_new_charges() {
        let mut engine = Engine::new();
        let mixer = engine
            .place(BuildingVariant::MixerDefault, Rotation::Deg0)
            .unwrap();
        let feed = |engine: &mut Engine| {
            assert!(engine
                .offer_item(mixer, 0, Item::Color(Color::Red), Direction::Bottom)
                .is_ok());
            assert!(engine
                .offer_item(mixer, 1, Item::Color(Color::Blue), Direction::Bottom)
                .is_ok());
        };

        feed(&mut engine);
        step(&mut engine, 2.0);
        // First charge done; its output occupies the sole ejector slot.
        assert!(engine.ejector(mixer).unwrap().peek(0).is_some());

        feed(&mut engine);
        let report = step(&mut engine, 2.0);
        assert_eq!(report.charges_completed, 1);
        // Second charge output could not eject and is parked.
        assert_eq!(engine.pending_outputs(mixer).len(), 1);

        // While parked, no further progress accrues.
        feed(&mut engine);
        let report = step(&mut engine, 10.0);
        assert_eq!(report.charges_completed, 0);
        assert_eq!(engine.processor(mixer).unwrap().progress(), Fixed64::ZERO);

        // Freeing the slot lets the parked output eject and charging
        // resume from zero.
        assert!(engine.take_output(mixer, 0).is_some());
        let report = step(&mut engine, 1.0);
        assert!(engine.pending_outputs(mixer).is_empty());
        assert_eq!(report.items_ejected, 1);
        assert_eq!(engine.processor(mixer).unwrap().progress(), fixed(0.5));

        assert!(engine.take_output(mixer, 0).is_some());
        let report = step(&mut engine, 1.0);
        assert_eq!(report.charges_completed, 1);
        assert!(engine.pending_outputs(mixer).is_empty());
    }

    #[test]
    fn quad_cutter_fills_four_slots() {
        let mut engine = Engine::new();
        let cutter = engine
            .place(BuildingVariant::CutterQuad, Rotation::Deg0)
            .unwrap();
        assert!(engine
            .offer_item(cutter, 0, circle(), Direction::Bottom)
            .is_ok());
        step(&mut engine, 2.0);
        let ejector = engine.ejector(cutter).unwrap();
        for slot in 0..4 {
            assert!(ejector.peek(slot).is_some(), "slot {slot} should hold a quarter");
        }
    }

    // -----------------------------------------------------------------------
    // Cross-entity transfer
    // -----------------------------------------------------------------------

    #[test]
    fn linked_entities_move_items_downstream() {
        let mut engine = Engine::new();
        let cutter = engine
            .place(BuildingVariant::CutterDefault, Rotation::Deg0)
            .unwrap();
        // The default stacker accepts from the bottom, which is where an
        // item pushed out toward the top arrives from.
        let stacker = engine
            .place(BuildingVariant::StackerDefault, Rotation::Deg0)
            .unwrap();
        engine.connect(cutter, 0, stacker, 0).unwrap();
        engine.connect(cutter, 1, stacker, 1).unwrap();

        assert!(engine
            .offer_item(cutter, 0, circle(), Direction::Bottom)
            .is_ok());

        // Cut (2 s), transfer both halves, then stack (2 s more after the
        // stacker buffer fills).
        let mut total_transferred = 0;
        for _ in 0..6 {
            total_transferred += step(&mut engine, 1.0).items_transferred;
        }
        assert_eq!(total_transferred, 2);
        let stacked = engine.take_output(stacker, 0);
        match stacked {
            Some(Item::Shape(shape)) => {
                // Two one-layer halves stacked into a two-layer shape.
                assert_eq!(shape.layer_count(), 2);
                assert_eq!(shape.quad_count(), 4);
            }
            other => panic!("expected a stacked shape, got {other:?}"),
        }
    }

    #[test]
    fn transfer_respects_acceptor_filters() {
        let mut engine = Engine::new();
        // A mixer's output (a color) cannot enter a stacker's shape slots.
        let mixer = engine
            .place(BuildingVariant::MixerDefault, Rotation::Deg0)
            .unwrap();
        let stacker = engine
            .place(BuildingVariant::StackerDefault, Rotation::Deg0)
            .unwrap();
        engine.connect(mixer, 0, stacker, 0).unwrap();

        assert!(engine
            .offer_item(mixer, 0, Item::Color(Color::Red), Direction::Bottom)
            .is_ok());
        assert!(engine
            .offer_item(mixer, 1, Item::Color(Color::Green), Direction::Bottom)
            .is_ok());
        for _ in 0..8 {
            step(&mut engine, 1.0);
        }
        // The color item stays queued at the mixer; the stacker never takes
        // it.
        assert!(engine.ejector(mixer).unwrap().peek(0).is_some());
        assert!(engine.acceptor(stacker).unwrap().peek(0).is_none());
    }

    // -----------------------------------------------------------------------
    // Determinism
    // -----------------------------------------------------------------------

    #[test]
    fn identical_histories_hash_identically() {
        let build = || {
            let mut engine = Engine::new();
            let cutter = engine
                .place(BuildingVariant::CutterDefault, Rotation::Deg0)
                .unwrap();
            let stacker = engine
                .place(BuildingVariant::StackerDefault, Rotation::Deg0)
                .unwrap();
            engine.connect(cutter, 0, stacker, 0).unwrap();
            engine.connect(cutter, 1, stacker, 1).unwrap();
            let _ = engine.offer_item(cutter, 0, circle(), Direction::Bottom);
            engine
        };
        let mut a = build();
        let mut b = build();
        for _ in 0..8 {
            step(&mut a, 0.5);
            step(&mut b, 0.5);
            assert_eq!(a.state_hash(), b.state_hash());
        }
        assert_ne!(a.state_hash(), 0);
    }

    #[test]
    fn events_trace_the_pipeline() {
        let mut engine = Engine::new();
        let cutter = engine
            .place(BuildingVariant::CutterDefault, Rotation::Deg0)
            .unwrap();
        assert!(engine
            .offer_item(cutter, 0, circle(), Direction::Bottom)
            .is_ok());
        step(&mut engine, 2.0);

        let events = engine.drain_events();
        use crate::event::EventKind;
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
        assert!(kinds.contains(&EventKind::ItemAccepted));
        assert!(kinds.contains(&EventKind::ChargeStarted));
        assert!(kinds.contains(&EventKind::ChargeCompleted));
        assert!(kinds.contains(&EventKind::ItemEjected));
    }
}

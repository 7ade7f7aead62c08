//! Serialization and snapshot support for the engine.
//!
//! Provides binary serialization via `bitcode` with a versioned header.
//! Snapshots carry the minimal per-entity state the processing engine
//! needs: placement bookkeeping, component state, links, and the tick
//! counter. The event log is excluded; it is transient observation state.

use crate::acceptor::ItemAcceptorComponent;
use crate::ejector::ItemEjectorComponent;
use crate::engine::{BuildingState, Engine, Link, PendingOutput};
use crate::event::EventLog;
use crate::id::{EntityId, LinkId};
use crate::processor::ItemProcessorComponent;
use crate::sim::SimState;
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a Shapeline engine snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x5A9E_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every serialized snapshot. Enables format detection
/// and version checking before trusting the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    /// Validate the header. Returns `Ok(())` if valid.
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Serializable engine state
// ---------------------------------------------------------------------------

/// The serializable portion of the engine. The event log is rebuilt empty
/// on load.
#[derive(Debug, Serialize, Deserialize)]
struct EngineSnapshot {
    header: SnapshotHeader,
    entities: SlotMap<EntityId, BuildingState>,
    acceptors: SecondaryMap<EntityId, ItemAcceptorComponent>,
    ejectors: SecondaryMap<EntityId, ItemEjectorComponent>,
    processors: SecondaryMap<EntityId, ItemProcessorComponent>,
    pending: SecondaryMap<EntityId, Vec<PendingOutput>>,
    links: SlotMap<LinkId, Link>,
    link_order: Vec<LinkId>,
    sim_state: SimState,
    last_state_hash: u64,
}

impl Engine {
    /// Serialize the full engine state to bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = EngineSnapshot {
            header: SnapshotHeader::new(self.sim_state.tick),
            entities: self.entities.clone(),
            acceptors: self.acceptors.clone(),
            ejectors: self.ejectors.clone(),
            processors: self.processors.clone(),
            pending: self.pending.clone(),
            links: self.links.clone(),
            link_order: self.link_order.clone(),
            sim_state: self.sim_state.clone(),
            last_state_hash: self.last_state_hash,
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Reconstruct an engine from serialized bytes. Fails fast on a bad
    /// magic number or version mismatch.
    pub fn deserialize(data: &[u8]) -> Result<Engine, DeserializeError> {
        let snapshot: EngineSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        Ok(Engine {
            entities: snapshot.entities,
            acceptors: snapshot.acceptors,
            ejectors: snapshot.ejectors,
            processors: snapshot.processors,
            pending: snapshot.pending,
            links: snapshot.links,
            link_order: snapshot.link_order,
            sim_state: snapshot.sim_state,
            last_state_hash: snapshot.last_state_hash,
            events: EventLog::default(),
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::BuildingVariant;
    use crate::engine::UniformSpeed;
    use crate::fixed::Fixed64;
    use crate::geometry::{Direction, Rotation};
    use crate::item::{Color, Item};
    use crate::transform::StandardTransforms;

    fn make_engine() -> Engine {
        let mut engine = Engine::new();
        let mixer = engine
            .place(BuildingVariant::MixerDefault, Rotation::Deg0)
            .unwrap();
        let stacker = engine
            .place(BuildingVariant::StackerDefault, Rotation::Deg0)
            .unwrap();
        engine.connect(mixer, 0, stacker, 0).unwrap();
        let _ = engine.offer_item(mixer, 0, Item::Color(Color::Red), Direction::Bottom);
        let _ = engine.offer_item(mixer, 1, Item::Color(Color::Blue), Direction::Bottom);
        engine
    }

    fn step(engine: &mut Engine) {
        engine.step(
            Fixed64::from_num(0.5),
            &UniformSpeed(Fixed64::from_num(1.0)),
            &StandardTransforms,
        );
    }

    #[test]
    fn round_trip_preserves_state_hash() {
        let mut engine = make_engine();
        step(&mut engine);
        step(&mut engine);

        let data = engine.serialize().unwrap();
        let restored = Engine::deserialize(&data).unwrap();
        assert_eq!(restored.tick(), engine.tick());
        assert_eq!(restored.state_hash(), engine.state_hash());
        assert_eq!(restored.compute_state_hash(), engine.compute_state_hash());
        assert_eq!(restored.entity_count(), engine.entity_count());
        assert_eq!(restored.link_count(), engine.link_count());
    }

    #[test]
    fn restored_engine_continues_identically() {
        let mut engine = make_engine();
        step(&mut engine);

        let data = engine.serialize().unwrap();
        let mut restored = Engine::deserialize(&data).unwrap();

        for _ in 0..6 {
            step(&mut engine);
            step(&mut restored);
            assert_eq!(engine.state_hash(), restored.state_hash());
        }
    }

    #[test]
    fn header_validation_rejects_bad_magic() {
        let header = SnapshotHeader {
            magic: 0xDEAD_BEEF,
            version: FORMAT_VERSION,
            tick: 0,
        };
        assert!(matches!(
            header.validate(),
            Err(DeserializeError::InvalidMagic(0xDEAD_BEEF))
        ));
    }

    #[test]
    fn header_validation_rejects_future_version() {
        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION + 1,
            tick: 0,
        };
        assert!(matches!(
            header.validate(),
            Err(DeserializeError::FutureVersion(_))
        ));
    }

    #[test]
    fn garbage_data_fails_to_decode() {
        let garbage = [0u8, 1, 2, 3, 4, 5];
        assert!(matches!(
            Engine::deserialize(&garbage),
            Err(DeserializeError::Decode(_))
        ));
    }
}

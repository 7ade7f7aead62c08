//! Fatal configuration errors.
//!
//! Everything here is programmer-facing and surfaced immediately at
//! configuration time (variant setup, slot wiring, placement). Capacity
//! rejection and starvation are never errors; they are ordinary results
//! the caller handles for backpressure.

/// An invalid building or component configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A slot geometry was constructed with no allowed directions.
    #[error("slot geometry has an empty direction set")]
    EmptyDirections,

    /// A variant tag did not name any variant of the building.
    #[error("unknown {building} variant: '{tag}'")]
    UnknownVariant { building: &'static str, tag: String },

    /// A processor was configured to need zero items per charge.
    #[error("inputs per charge must be positive, got {got}")]
    InvalidInputsPerCharge { got: u32 },

    /// A slot index referenced a slot that does not exist.
    #[error("slot index {index} out of range ({len} slots)")]
    SlotIndex { index: usize, len: usize },

    /// An entity id did not resolve to a registered entity.
    #[error("entity is not registered with the engine")]
    UnknownEntity,
}

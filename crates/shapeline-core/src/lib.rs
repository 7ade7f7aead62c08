//! Shapeline Core -- the item-processing engine for shape-factory games.
//!
//! This crate provides the building-block components every processing
//! building is assembled from -- directional input slots, directional output
//! slots, and a charge-based processor -- plus the per-tick engine that
//! wires them together, the building variant configuration tables, typed
//! events, deterministic state hashing, and versioned snapshot support.
//!
//! # Two-Phase Tick Pipeline
//!
//! Each call to [`engine::Engine::step`] advances the simulation by one step
//! through the following phases:
//!
//! 1. **Transfer** -- move queued items across entity links (ejector slot to
//!    acceptor slot). All ejections made in previous steps are visible
//!    before any acceptance is attempted, uniformly for every link.
//! 2. **Process** -- for each entity: retry pending outputs into ejector
//!    slots, drain held acceptor items into the processor buffer, advance
//!    the charge, and route completed-charge outputs into ejector slots.
//! 3. **Bookkeeping** -- increment the tick counter and compute the state
//!    hash.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- entity registry and pipeline orchestrator.
//! - [`acceptor::ItemAcceptorComponent`] -- directional, filtered input
//!   slots with single-item capacity.
//! - [`ejector::ItemEjectorComponent`] -- directional output slots with
//!   single-item capacity.
//! - [`processor::ItemProcessorComponent`] -- charge accumulation and
//!   type-specific transformation.
//! - [`building::BuildingVariant`] -- pure configuration tables mapping a
//!   variant tag and rotation to footprint, slots, and processor type.
//! - [`transform::StandardTransforms`] -- the cut / mix / stack rules.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.
//! - [`event::EventLog`] -- bounded, suppressible simulation event buffer.
//! - [`serialize`] -- versioned snapshot support via bitcode.

pub mod acceptor;
pub mod building;
pub mod ejector;
pub mod engine;
pub mod error;
pub mod event;
pub mod fixed;
pub mod geometry;
pub mod id;
pub mod item;
pub mod processor;
pub mod serialize;
pub mod sim;
pub mod transform;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

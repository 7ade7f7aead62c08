//! Processing statistics for the Shapeline engine.
//!
//! A read-only consumer: feed it the events drained from the engine each
//! step, advance its clock with `end_step`, and query per-entity charge
//! and ejection counts and rates. Also provides the items-per-second
//! display formatting used by building placement info texts. Nothing here
//! writes engine state.
//!
//! # Usage
//!
//! ```ignore
//! let mut stats = ProcessingStats::new();
//! let report = engine.step(dt, &progress, &StandardTransforms);
//! for event in engine.drain_events() {
//!     stats.process_event(&event);
//! }
//! stats.end_step(dt);
//! let rate = stats.charge_rate(entity);
//! ```

use std::collections::HashMap;

use shapeline_core::engine::SpeedSource;
use shapeline_core::event::Event;
use shapeline_core::fixed::Fixed64;
use shapeline_core::id::EntityId;
use shapeline_core::processor::ProcessorType;

// ---------------------------------------------------------------------------
// Per-entity counters
// ---------------------------------------------------------------------------

/// Cumulative counters for one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounters {
    /// Charges whose transform ran.
    pub charges_completed: u64,
    /// Items queued into ejector slots.
    pub items_ejected: u64,
    /// Items deposited into acceptor slots.
    pub items_accepted: u64,
    /// Times a completed charge could not fully eject.
    pub output_blocked: u64,
}

// ---------------------------------------------------------------------------
// ProcessingStats
// ---------------------------------------------------------------------------

/// Aggregates engine events into per-entity throughput metrics.
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    counters: HashMap<EntityId, EntityCounters>,
    /// Simulated seconds observed via `end_step`.
    elapsed: Fixed64,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one engine event into the counters.
    pub fn process_event(&mut self, event: &Event) {
        match event {
            Event::ChargeCompleted { entity, .. } => {
                self.counters.entry(*entity).or_default().charges_completed += 1;
            }
            Event::ItemEjected { entity, .. } => {
                self.counters.entry(*entity).or_default().items_ejected += 1;
            }
            Event::ItemAccepted { entity, .. } => {
                self.counters.entry(*entity).or_default().items_accepted += 1;
            }
            Event::OutputBlocked { entity, .. } => {
                self.counters.entry(*entity).or_default().output_blocked += 1;
            }
            Event::ChargeStarted { .. } | Event::ItemTransferred { .. } => {}
        }
    }

    /// Advance the observed clock by the step's `dt` seconds.
    pub fn end_step(&mut self, dt: Fixed64) {
        self.elapsed += dt;
    }

    pub fn elapsed(&self) -> Fixed64 {
        self.elapsed
    }

    pub fn counters(&self, entity: EntityId) -> EntityCounters {
        self.counters.get(&entity).copied().unwrap_or_default()
    }

    pub fn charges_completed(&self, entity: EntityId) -> u64 {
        self.counters(entity).charges_completed
    }

    pub fn items_ejected(&self, entity: EntityId) -> u64 {
        self.counters(entity).items_ejected
    }

    /// Total charges completed across all entities.
    pub fn total_charges(&self) -> u64 {
        self.counters.values().map(|c| c.charges_completed).sum()
    }

    /// Average charges per second for an entity over the observed window.
    /// Zero before any time has been observed.
    pub fn charge_rate(&self, entity: EntityId) -> Fixed64 {
        if self.elapsed <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        Fixed64::from_num(self.charges_completed(entity)) / self.elapsed
    }

    /// Average ejected items per second for an entity.
    pub fn ejection_rate(&self, entity: EntityId) -> Fixed64 {
        if self.elapsed <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        Fixed64::from_num(self.items_ejected(entity)) / self.elapsed
    }

    /// Forget all counters and reset the clock.
    pub fn reset(&mut self) {
        self.counters.clear();
        self.elapsed = Fixed64::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Display formatting
// ---------------------------------------------------------------------------

/// Format a rate for display, e.g. `0.5 items / s`. Rounded to two
/// decimals with trailing zeros trimmed.
pub fn format_items_per_second(rate: Fixed64) -> String {
    let hundredths: i64 = (rate * Fixed64::from_num(100)).round().to_num();
    let whole = hundredths / 100;
    let frac = (hundredths % 100).abs();
    if frac == 0 {
        format!("{whole} items / s")
    } else if frac % 10 == 0 {
        format!("{whole}.{} items / s", frac / 10)
    } else {
        format!("{whole}.{frac:02} items / s")
    }
}

/// The placement info text for a processor type at the current speeds.
pub fn processor_speed_text(processor_type: ProcessorType, speeds: &dyn SpeedSource) -> String {
    format_items_per_second(speeds.processor_speed(processor_type))
}

// ===========================================================================
// Tests
// ===========================================================================

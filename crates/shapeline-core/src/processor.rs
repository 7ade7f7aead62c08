//! Item processor component: charge accumulation and completion.
//!
//! A processor collects `inputs_per_charge` items into a bounded buffer,
//! then advances a 0..1 progress fraction at an externally supplied rate.
//! When progress crosses 1.0 the type-specific transform consumes the whole
//! buffer and produces the charge outputs in one step; the fractional
//! overshoot carries into the next charge. A processor with too few items
//! simply does not advance. Neither starvation nor a full downstream slot
//! is an error.

use crate::error::ConfigError;
use crate::fixed::Fixed64;
use crate::item::Item;
use crate::transform::TransformTable;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Processor types
// ---------------------------------------------------------------------------

/// The transform a processor performs. The actual rules live in a
/// [`TransformTable`]; this tag selects the table entry and the slot
/// counts a variant wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProcessorType {
    Cutter,
    CutterQuad,
    Mixer,
    Stacker,
}

impl ProcessorType {
    /// How many buffered items one charge consumes.
    pub fn inputs_per_charge(self) -> u32 {
        match self {
            ProcessorType::Cutter | ProcessorType::CutterQuad => 1,
            ProcessorType::Mixer | ProcessorType::Stacker => 2,
        }
    }

    /// How many positional output slots the transform produces into.
    pub fn output_slots(self) -> usize {
        match self {
            ProcessorType::Cutter => 2,
            ProcessorType::CutterQuad => 4,
            ProcessorType::Mixer | ProcessorType::Stacker => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProcessorType::Cutter => "cutter",
            ProcessorType::CutterQuad => "cutter-quad",
            ProcessorType::Mixer => "mixer",
            ProcessorType::Stacker => "stacker",
        }
    }
}

// ---------------------------------------------------------------------------
// Charge state
// ---------------------------------------------------------------------------

/// Whether the processor is waiting for inputs or mid-charge. Derived from
/// buffer fullness; exposed for inspection and stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    /// Buffer not yet full; progress is frozen.
    Idle,
    /// Buffer full; progress accrues each step.
    Charging,
}

// ---------------------------------------------------------------------------
// ItemProcessorComponent
// ---------------------------------------------------------------------------

/// Owns a building's processing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemProcessorComponent {
    processor_type: ProcessorType,
    inputs_per_charge: u32,
    buffer: Vec<Item>,
    /// Fraction of the current charge completed, 0..1. On completion the
    /// overshoot above 1.0 carries over.
    progress: Fixed64,
}

impl ItemProcessorComponent {
    pub fn new(processor_type: ProcessorType, inputs_per_charge: u32) -> Result<Self, ConfigError> {
        if inputs_per_charge == 0 {
            return Err(ConfigError::InvalidInputsPerCharge { got: 0 });
        }
        Ok(Self {
            processor_type,
            inputs_per_charge,
            buffer: Vec::with_capacity(inputs_per_charge as usize),
            progress: Fixed64::ZERO,
        })
    }

    pub fn processor_type(&self) -> ProcessorType {
        self.processor_type
    }

    pub fn inputs_per_charge(&self) -> u32 {
        self.inputs_per_charge
    }

    pub fn buffered(&self) -> &[Item] {
        &self.buffer
    }

    pub fn progress(&self) -> Fixed64 {
        self.progress
    }

    pub fn charge_state(&self) -> ChargeState {
        if self.buffer.len() == self.inputs_per_charge as usize {
            ChargeState::Charging
        } else {
            ChargeState::Idle
        }
    }

    pub fn can_accept_more(&self) -> bool {
        self.buffer.len() < self.inputs_per_charge as usize
    }

    /// Append an item to the charge buffer. A full buffer hands the item
    /// back untouched.
    #[must_use = "a rejected item must stay where it came from"]
    pub fn add_to_buffer(&mut self, item: Item) -> Result<(), Item> {
        if !self.can_accept_more() {
            return Err(item);
        }
        self.buffer.push(item);
        Ok(())
    }

    /// Re-apply configuration on a variant or rotation change. The in-flight
    /// buffer survives, except that items beyond the new `inputs_per_charge`
    /// are dropped (this only happens on an explicit player-driven
    /// reconfiguration). The in-flight charge aborts, resetting progress,
    /// whenever the transform type changes or the buffer is no longer full.
    pub fn reconfigure(
        &mut self,
        processor_type: ProcessorType,
        inputs_per_charge: u32,
    ) -> Result<(), ConfigError> {
        if inputs_per_charge == 0 {
            return Err(ConfigError::InvalidInputsPerCharge { got: 0 });
        }
        let type_changed = processor_type != self.processor_type;
        self.processor_type = processor_type;
        self.inputs_per_charge = inputs_per_charge;
        self.buffer.truncate(inputs_per_charge as usize);
        if type_changed || self.buffer.len() < inputs_per_charge as usize {
            self.progress = Fixed64::ZERO;
        }
        Ok(())
    }

    /// Advance the current charge by `dt * speed` and run the transform if
    /// it completes.
    ///
    /// Returns `Some(outputs)` exactly when a charge completed this step:
    /// the buffer is fully consumed, outputs are positional (`outputs[i]`
    /// goes to ejector slot `i`, `None` meaning nothing for that slot), and
    /// progress restarts at the fractional overshoot, clamped at zero. With
    /// fewer than `inputs_per_charge` items buffered the machine is starved
    /// and nothing changes.
    pub fn advance(
        &mut self,
        dt: Fixed64,
        speed: Fixed64,
        transforms: &dyn TransformTable,
    ) -> Option<Vec<Option<Item>>> {
        if self.buffer.len() < self.inputs_per_charge as usize {
            return None;
        }
        self.progress += dt * speed;
        if self.progress < Fixed64::ONE {
            return None;
        }
        let outputs = transforms.apply(self.processor_type, &self.buffer);
        self.buffer.clear();
        self.progress = (self.progress - Fixed64::ONE).max(Fixed64::ZERO);
        Some(outputs)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

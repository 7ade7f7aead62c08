//! Player progression for the Shapeline engine.
//!
//! Tracks which rewards have been unlocked and which processor upgrade
//! tier the player has reached, and derives the per-type processing speed
//! the engine reads every tick. From the engine's perspective this is a
//! read-only snapshot: it implements [`RewardGate`] for variant selection
//! and [`SpeedSource`] for per-tick speed lookup, and nothing in the tick
//! pipeline ever writes back.
//!
//! Speed = base charges/second for the processor type, multiplied by the
//! current upgrade tier's factor. Rates change the moment the tier does;
//! no entity state is touched.

use serde::{Deserialize, Serialize};
use shapeline_core::building::{Reward, RewardGate};
use shapeline_core::engine::SpeedSource;
use shapeline_core::fixed::Fixed64;
use shapeline_core::processor::ProcessorType;
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Content constants
// ---------------------------------------------------------------------------

/// Base processing rate in charges per second, before upgrades.
pub fn base_speed(processor_type: ProcessorType) -> Fixed64 {
    match processor_type {
        ProcessorType::Cutter => Fixed64::from_num(0.5),
        ProcessorType::CutterQuad => Fixed64::from_num(0.25),
        ProcessorType::Mixer => Fixed64::from_num(0.5),
        ProcessorType::Stacker => Fixed64::from_num(0.25),
    }
}

/// Highest defined upgrade tier; higher requests clamp to this.
pub const MAX_PROCESSOR_TIER: u8 = 4;

/// Speed factor for an upgrade tier. Tiers beyond the table clamp to the
/// top factor.
pub fn tier_multiplier(tier: u8) -> Fixed64 {
    match tier {
        0 => Fixed64::from_num(1.0),
        1 => Fixed64::from_num(1.5),
        2 => Fixed64::from_num(2.0),
        3 => Fixed64::from_num(3.0),
        _ => Fixed64::from_num(4.0),
    }
}

// ---------------------------------------------------------------------------
// HubProgress
// ---------------------------------------------------------------------------

/// The player's progression state: unlocked rewards and the processor
/// upgrade tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubProgress {
    unlocked: BTreeSet<Reward>,
    processor_tier: u8,
}

impl HubProgress {
    /// Fresh progression: nothing unlocked, tier 0.
    pub fn new() -> Self {
        Self {
            unlocked: BTreeSet::new(),
            processor_tier: 0,
        }
    }

    /// Everything unlocked at tier 0. For sandbox mode and tests.
    pub fn all_unlocked() -> Self {
        let unlocked = [
            Reward::CutterAndTrash,
            Reward::CutterQuad,
            Reward::Mixer,
            Reward::Stacker,
        ]
        .into_iter()
        .collect();
        Self {
            unlocked,
            processor_tier: 0,
        }
    }

    /// Grant a reward. Granting twice is a no-op.
    pub fn unlock(&mut self, reward: Reward) {
        self.unlocked.insert(reward);
    }

    pub fn unlocked_rewards(&self) -> impl Iterator<Item = Reward> + '_ {
        self.unlocked.iter().copied()
    }

    pub fn processor_tier(&self) -> u8 {
        self.processor_tier
    }

    /// Set the processor upgrade tier, clamped to the defined table.
    pub fn set_processor_tier(&mut self, tier: u8) {
        self.processor_tier = tier.min(MAX_PROCESSOR_TIER);
    }

    /// The effective charges-per-second rate the engine will observe.
    pub fn processor_base_speed(&self, processor_type: ProcessorType) -> Fixed64 {
        base_speed(processor_type) * tier_multiplier(self.processor_tier)
    }
}

impl Default for HubProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardGate for HubProgress {
    fn is_unlocked(&self, reward: Reward) -> bool {
        self.unlocked.contains(&reward)
    }
}

impl SpeedSource for HubProgress {
    fn processor_speed(&self, processor_type: ProcessorType) -> Fixed64 {
        self.processor_base_speed(processor_type)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

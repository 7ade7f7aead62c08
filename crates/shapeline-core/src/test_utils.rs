//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::building::BuildingVariant;
use crate::engine::{Engine, SpeedSource, StepReport, UniformSpeed};
use crate::fixed::Fixed64;
use crate::geometry::{Direction, Rotation};
use crate::id::EntityId;
use crate::item::{Color, Form, Item, ShapeItem};
use crate::transform::{StandardTransforms, TransformTable};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Item constructors
// ===========================================================================

pub fn circle() -> Item {
    Item::Shape(ShapeItem::full(Form::Circle, Color::Uncolored))
}

pub fn rectangle() -> Item {
    Item::Shape(ShapeItem::full(Form::Rectangle, Color::Uncolored))
}

pub fn star() -> Item {
    Item::Shape(ShapeItem::full(Form::Star, Color::Uncolored))
}

pub fn red() -> Item {
    Item::Color(Color::Red)
}

pub fn green() -> Item {
    Item::Color(Color::Green)
}

pub fn blue() -> Item {
    Item::Color(Color::Blue)
}

// ===========================================================================
// Engine helpers
// ===========================================================================

/// One charge per second for every processor type.
pub fn unit_speed() -> UniformSpeed {
    UniformSpeed(fixed(1.0))
}

/// Place a building at its default rotation.
pub fn place(engine: &mut Engine, variant: BuildingVariant) -> EntityId {
    engine
        .place(variant, Rotation::Deg0)
        .expect("variant tables produce valid configurations")
}

/// Deposit an item from below, the default feeding direction.
pub fn feed_from_below(engine: &mut Engine, entity: EntityId, slot: usize, item: Item) -> bool {
    engine
        .offer_item(entity, slot, item, Direction::Bottom)
        .is_ok()
}

/// Step the engine `n` times with a fixed `dt`, accumulating the reports.
pub fn run_steps(
    engine: &mut Engine,
    n: u32,
    dt: Fixed64,
    speeds: &dyn SpeedSource,
    transforms: &dyn TransformTable,
) -> StepReport {
    let mut total = StepReport::default();
    for _ in 0..n {
        let report = engine.step(dt, speeds, transforms);
        total.items_transferred += report.items_transferred;
        total.charges_completed += report.charges_completed;
        total.items_ejected += report.items_ejected;
    }
    total
}

/// Step at 20 steps per simulated second until `seconds` have elapsed,
/// using unit speed and the standard transforms.
pub fn run_seconds(engine: &mut Engine, seconds: f64) -> StepReport {
    let steps = (seconds * 20.0).round() as u32;
    run_steps(
        engine,
        steps,
        fixed(0.05),
        &unit_speed(),
        &StandardTransforms,
    )
}

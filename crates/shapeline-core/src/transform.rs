//! Type-specific charge transforms.
//!
//! The processor does not branch on what its transform means; it hands the
//! full charge buffer to a [`TransformTable`] and routes the positional
//! outputs to ejector slots. The table is game-content data; the engine
//! ships the standard rules as [`StandardTransforms`].

use crate::item::Item;
use crate::processor::ProcessorType;

// ---------------------------------------------------------------------------
// TransformTable
// ---------------------------------------------------------------------------

/// A pure mapping from a full charge of inputs to positional outputs.
pub trait TransformTable {
    /// Consume one charge. `inputs` holds exactly `inputs_per_charge` items
    /// in acceptance order. The result has one entry per ejector slot of
    /// the processor type; `outputs[i]` is routed to ejector slot `i`, and
    /// `None` means that slot receives nothing this charge.
    fn apply(&self, processor_type: ProcessorType, inputs: &[Item]) -> Vec<Option<Item>>;
}

// ---------------------------------------------------------------------------
// StandardTransforms
// ---------------------------------------------------------------------------

/// The standard game rules:
///
/// - **Cutter**: one shape, cut vertically. Output 0 is the left half,
///   output 1 the right half; an empty half yields nothing.
/// - **Cutter (quad)**: one shape, cut into four quarters in quadrant order.
/// - **Mixer**: two colors blended additively into one.
/// - **Stacker**: two shapes; the first item buffered is the lower shape,
///   the second is stacked on top.
///
/// Variant wiring filters slot kinds, so a kind-mismatched charge cannot
/// occur through the engine; such a charge produces no outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTransforms;

impl TransformTable for StandardTransforms {
    fn apply(&self, processor_type: ProcessorType, inputs: &[Item]) -> Vec<Option<Item>> {
        match processor_type {
            ProcessorType::Cutter => match inputs {
                [Item::Shape(shape)] => {
                    let (left, right) = shape.cut_halves();
                    vec![left.map(Item::Shape), right.map(Item::Shape)]
                }
                _ => {
                    debug_assert!(false, "cutter charge was not a single shape");
                    vec![None; 2]
                }
            },
            ProcessorType::CutterQuad => match inputs {
                [Item::Shape(shape)] => shape
                    .cut_quarters()
                    .into_iter()
                    .map(|quarter| quarter.map(Item::Shape))
                    .collect(),
                _ => {
                    debug_assert!(false, "quad cutter charge was not a single shape");
                    vec![None; 4]
                }
            },
            ProcessorType::Mixer => match inputs {
                [Item::Color(a), Item::Color(b)] => vec![Some(Item::Color(a.mix(*b)))],
                _ => {
                    debug_assert!(false, "mixer charge was not two colors");
                    vec![None]
                }
            },
            ProcessorType::Stacker => match inputs {
                [Item::Shape(lower), Item::Shape(upper)] => {
                    vec![Some(Item::Shape(lower.stack(upper)))]
                }
                _ => {
                    debug_assert!(false, "stacker charge was not two shapes");
                    vec![None]
                }
            },
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

//! The item model: shape payloads, color payloads, and the pure transform
//! primitives (cutting, stacking, color blending) the processor's policy
//! table is built from.

use crate::sim::StateHash;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Item kinds
// ---------------------------------------------------------------------------

/// Broad payload classification used by slot filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Shape,
    Color,
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// Paintable and mixable colors. The blend rule is additive over RGB
/// channels, which reproduces the full mixing table: two primaries make the
/// matching secondary, complementary pairs make white, anything mixed with
/// white stays white, and uncolored is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Uncolored,
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Cyan,
    White,
}

impl Color {
    /// RGB channel mask: bit 0 = red, bit 1 = green, bit 2 = blue.
    fn mask(self) -> u8 {
        match self {
            Color::Uncolored => 0b000,
            Color::Red => 0b001,
            Color::Green => 0b010,
            Color::Blue => 0b100,
            Color::Yellow => 0b011,
            Color::Purple => 0b101,
            Color::Cyan => 0b110,
            Color::White => 0b111,
        }
    }

    fn from_mask(mask: u8) -> Color {
        match mask & 0b111 {
            0b000 => Color::Uncolored,
            0b001 => Color::Red,
            0b010 => Color::Green,
            0b100 => Color::Blue,
            0b011 => Color::Yellow,
            0b101 => Color::Purple,
            0b110 => Color::Cyan,
            _ => Color::White,
        }
    }

    /// Blend two colors additively.
    pub fn mix(self, other: Color) -> Color {
        Color::from_mask(self.mask() | other.mask())
    }
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// The forms a shape quadrant can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Form {
    Circle,
    Rectangle,
    Star,
    Windmill,
}

/// One occupied quadrant of a shape layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad {
    pub form: Form,
    pub color: Color,
}

impl Quad {
    pub const fn new(form: Form, color: Color) -> Self {
        Self { form, color }
    }
}

/// A layer is four quadrant positions, clockwise from top-right:
/// index 0 = top-right, 1 = bottom-right, 2 = bottom-left, 3 = top-left.
pub type Layer = [Option<Quad>; 4];

/// Quadrant indices forming the right half of a layer.
const RIGHT_QUADS: [usize; 2] = [0, 1];
/// Quadrant indices forming the left half of a layer.
const LEFT_QUADS: [usize; 2] = [2, 3];

/// A stacked shape of one to four layers. Layer 0 is the lowest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeItem {
    layers: Vec<Layer>,
}

impl ShapeItem {
    /// Maximum number of stacked layers; stacking discards anything above.
    pub const MAX_LAYERS: usize = 4;

    /// Build a shape from explicit layers. Fully-empty layers are dropped.
    pub fn new(layers: Vec<Layer>) -> Self {
        let layers = layers
            .into_iter()
            .filter(|layer| layer.iter().any(Option::is_some))
            .take(Self::MAX_LAYERS)
            .collect();
        Self { layers }
    }

    /// A single full layer of the given form and color.
    pub fn full(form: Form, color: Color) -> Self {
        let quad = Some(Quad::new(form, color));
        Self {
            layers: vec![[quad; 4]],
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Total occupied quadrants across all layers.
    pub fn quad_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.iter().filter(|q| q.is_some()).count())
            .sum()
    }

    fn keep_quadrants(&self, keep: &[usize]) -> Option<ShapeItem> {
        let mut layers = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let mut cut: Layer = [None; 4];
            for &q in keep {
                cut[q] = layer[q];
            }
            layers.push(cut);
        }
        let shape = ShapeItem::new(layers);
        if shape.is_empty() { None } else { Some(shape) }
    }

    /// Cut vertically into the left and right halves. A half with no
    /// occupied quadrants yields `None`; empty layers collapse.
    pub fn cut_halves(&self) -> (Option<ShapeItem>, Option<ShapeItem>) {
        (
            self.keep_quadrants(&LEFT_QUADS),
            self.keep_quadrants(&RIGHT_QUADS),
        )
    }

    /// Cut into four single-quadrant pieces, in quadrant index order
    /// (top-right, bottom-right, bottom-left, top-left).
    pub fn cut_quarters(&self) -> [Option<ShapeItem>; 4] {
        [
            self.keep_quadrants(&[0]),
            self.keep_quadrants(&[1]),
            self.keep_quadrants(&[2]),
            self.keep_quadrants(&[3]),
        ]
    }

    /// Stack `upper` on top of `self`. Layers beyond [`Self::MAX_LAYERS`]
    /// are discarded from the top.
    pub fn stack(&self, upper: &ShapeItem) -> ShapeItem {
        let mut layers = self.layers.clone();
        layers.extend(upper.layers.iter().cloned());
        layers.truncate(Self::MAX_LAYERS);
        ShapeItem { layers }
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A transferable item payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    Shape(ShapeItem),
    Color(Color),
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Shape(_) => ItemKind::Shape,
            Item::Color(_) => ItemKind::Color,
        }
    }

    /// Whether this item passes a slot filter. `None` accepts anything.
    pub fn matches(&self, filter: Option<ItemKind>) -> bool {
        filter.is_none_or(|kind| self.kind() == kind)
    }

    /// Feed this item's identity into a deterministic state hash.
    pub fn feed_hash(&self, hash: &mut StateHash) {
        match self {
            Item::Color(color) => {
                hash.write_u8(1);
                hash.write_u8(color.mask());
            }
            Item::Shape(shape) => {
                hash.write_u8(2);
                hash.write_u8(shape.layer_count() as u8);
                for layer in shape.layers() {
                    for quad in layer {
                        match quad {
                            None => hash.write_u8(0xFF),
                            Some(q) => {
                                hash.write_u8(q.form as u8);
                                hash.write_u8(q.color.mask());
                            }
                        }
                    }
                }
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

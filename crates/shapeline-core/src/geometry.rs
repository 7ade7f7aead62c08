//! Slot geometry: grid positions, compass directions, footprints, and the
//! rotation remapping applied when a building is placed at an orientation
//! other than its base layout.

use crate::error::ConfigError;
use crate::item::ItemKind;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// A compass direction on the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Top,
    Right,
    Bottom,
    Left,
}

impl Direction {
    /// All four directions, clockwise starting at `Top`.
    pub const ALL: [Direction; 4] = [
        Direction::Top,
        Direction::Right,
        Direction::Bottom,
        Direction::Left,
    ];

    /// The direction an item arrives from when pushed out toward `self`.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Top => Direction::Bottom,
            Direction::Right => Direction::Left,
            Direction::Bottom => Direction::Top,
            Direction::Left => Direction::Right,
        }
    }

    /// One quarter turn clockwise.
    pub fn rotated_cw(self) -> Direction {
        match self {
            Direction::Top => Direction::Right,
            Direction::Right => Direction::Bottom,
            Direction::Bottom => Direction::Left,
            Direction::Left => Direction::Top,
        }
    }

    /// Rotate by the given placement rotation.
    pub fn rotated(self, rotation: Rotation) -> Direction {
        let mut dir = self;
        for _ in 0..rotation.quarter_turns() {
            dir = dir.rotated_cw();
        }
        dir
    }

    /// Flip top and bottom, used by mirrored building variants.
    pub fn mirrored_vertical(self) -> Direction {
        match self {
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
            other => other,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Direction::Top => 0b0001,
            Direction::Right => 0b0010,
            Direction::Bottom => 0b0100,
            Direction::Left => 0b1000,
        }
    }
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// Quarter-turn placement rotations applied on top of a variant's base
/// layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Number of clockwise quarter turns.
    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// TilePos
// ---------------------------------------------------------------------------

/// Integer tile offset within a building footprint. `(0, 0)` is the
/// top-left cell; `x` grows rightward and `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Remap this position through a placement rotation, tracking the
    /// footprint as it turns. One clockwise quarter turn maps `(x, y)` in a
    /// `w x h` footprint to `(h - 1 - y, x)` in the resulting `h x w`
    /// footprint.
    pub fn rotated_in(self, footprint: Footprint, rotation: Rotation) -> TilePos {
        let mut pos = self;
        let mut fp = footprint;
        for _ in 0..rotation.quarter_turns() {
            pos = TilePos::new(fp.height as i32 - 1 - pos.y, pos.x);
            fp = fp.rotated_quarter();
        }
        pos
    }
}

// ---------------------------------------------------------------------------
// Footprint
// ---------------------------------------------------------------------------

/// Width x height of a building in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The footprint after one clockwise quarter turn.
    pub fn rotated_quarter(self) -> Footprint {
        Footprint::new(self.height, self.width)
    }

    /// The footprint after a full placement rotation.
    pub fn rotated(self, rotation: Rotation) -> Footprint {
        if rotation.quarter_turns() % 2 == 0 {
            self
        } else {
            self.rotated_quarter()
        }
    }

    /// Whether the position lies inside this footprint.
    pub fn contains(self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }
}

// ---------------------------------------------------------------------------
// DirectionSet
// ---------------------------------------------------------------------------

/// A non-empty set of compass directions, packed into one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionSet(u8);

impl DirectionSet {
    /// Build a set from the given directions. Fails if `dirs` is empty.
    pub fn new(dirs: &[Direction]) -> Result<Self, ConfigError> {
        if dirs.is_empty() {
            return Err(ConfigError::EmptyDirections);
        }
        let mut bits = 0u8;
        for dir in dirs {
            bits |= dir.bit();
        }
        Ok(Self(bits))
    }

    /// A set containing exactly one direction.
    pub fn single(dir: Direction) -> Self {
        Self(dir.bit())
    }

    pub fn contains(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate contained directions in clockwise order starting at `Top`.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }

    /// Rotate every member by the given placement rotation.
    pub fn rotated(self, rotation: Rotation) -> DirectionSet {
        let mut bits = 0u8;
        for dir in self.iter() {
            bits |= dir.rotated(rotation).bit();
        }
        Self(bits)
    }

    /// Flip top and bottom on every member.
    pub fn mirrored_vertical(self) -> DirectionSet {
        let mut bits = 0u8;
        for dir in self.iter() {
            bits |= dir.mirrored_vertical().bit();
        }
        Self(bits)
    }
}

// ---------------------------------------------------------------------------
// SlotGeometry
// ---------------------------------------------------------------------------

/// A binding point for item transfer into a building: a position within the
/// footprint, the directions an item may arrive from, and an optional
/// payload-kind filter (`None` accepts anything).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGeometry {
    pub pos: TilePos,
    pub directions: DirectionSet,
    pub filter: Option<ItemKind>,
}

impl SlotGeometry {
    /// Build a slot geometry. Fails if `directions` is empty.
    pub fn new(
        pos: TilePos,
        directions: &[Direction],
        filter: Option<ItemKind>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            pos,
            directions: DirectionSet::new(directions)?,
            filter,
        })
    }

    /// Remap through a placement rotation: position within the rotated
    /// footprint, directions rotated, filter unchanged.
    pub fn rotated_in(self, footprint: Footprint, rotation: Rotation) -> SlotGeometry {
        SlotGeometry {
            pos: self.pos.rotated_in(footprint, rotation),
            directions: self.directions.rotated(rotation),
            filter: self.filter,
        }
    }

    /// Flip top and bottom directions, preserving position and filter.
    pub fn mirrored_vertical(self) -> SlotGeometry {
        SlotGeometry {
            pos: self.pos,
            directions: self.directions.mirrored_vertical(),
            filter: self.filter,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

//! Carcassonne core types: segments, tiles, sides, positions and meeples.
//!
//! A tile is split into 13 segments. The 12 ring segments run clockwise
//! from the north-west corner, three per side, and segment 12 is the centre:
//!
//! ```text
//!      0  1  2
//!   11         3
//!   10   12    4
//!    9         5
//!      8  7  6
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of tiles in the standard deck.
pub const TILE_COUNT: usize = 72;
/// Grid coordinate of the starting tile.
pub const BOARD_CENTER: i32 = TILE_COUNT as i32 + 1;
/// Side of the square grid: room for every tile in a line in any direction.
pub const BOARD_SIZE: i32 = 2 * BOARD_CENTER + 1;

pub const SEGMENT_COUNT: usize = 13;
pub const RING_SEGMENTS: usize = 12;
pub const CENTER_SEGMENT: usize = 12;

pub const MEEPLE_COLOR_COUNT: usize = 5;
pub const MEEPLES_PER_PLAYER: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Field,
    Road,
    City,
    Monastery,
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureType::Field => "field",
            FeatureType::Road => "road",
            FeatureType::City => "city",
            FeatureType::Monastery => "monastery",
        };
        f.write_str(name)
    }
}

/// One addressable region of a tile. `id` is unique only within the tile and
/// tells apart separate structures of the same kind (e.g. two fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Segment {
    pub kind: Option<FeatureType>,
    pub id: u8,
}

impl Segment {
    pub const EMPTY: Segment = Segment { kind: None, id: 0 };

    pub const fn new(kind: FeatureType, id: u8) -> Self {
        Self { kind: Some(kind), id }
    }

    /// True when the segment belongs to no structure.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.kind.is_none() || self.id == 0
    }
}

// --- Sides ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    East,
    South,
    West,
}

pub const SIDES: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

impl Side {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn opposite(self) -> Side {
        SIDES[(self.index() + 2) % 4]
    }

    /// Grid offset of the neighbouring cell. `y` grows southwards.
    #[inline]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Side::North => (0, -1),
            Side::East => (1, 0),
            Side::South => (0, 1),
            Side::West => (-1, 0),
        }
    }

    /// First ring segment of this side, clockwise.
    #[inline]
    pub fn first_segment(self) -> usize {
        self.index() * 3
    }

    #[inline]
    pub fn center_segment(self) -> usize {
        self.index() * 3 + 1
    }

    /// Segment of this side that touches segment `first_segment() + i` of the
    /// neighbour's opposite side. Touching triples run in reverse order.
    #[inline]
    pub fn facing(self, i: usize) -> usize {
        self.first_segment() + 2 - i
    }
}

// --- Position ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Where the starting tile goes.
    pub const fn center() -> Self {
        Self::new(BOARD_CENTER, BOARD_CENTER)
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[inline]
    pub fn neighbor(self, side: Side) -> Self {
        let (dx, dy) = side.offset();
        self.offset(dx, dy)
    }

    /// The 3×3 block around (and including) this position, row by row.
    pub fn neighborhood(self) -> impl Iterator<Item = Position> {
        (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| self.offset(dx, dy)))
    }

    /// Row-major ordering key, used wherever the board is scanned.
    #[inline]
    pub fn scan_key(self) -> (i32, i32) {
        (self.y, self.x)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

// --- Meeples ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeepleColor {
    Green = 1,
    Red,
    Blue,
    Yellow,
    Black,
}

pub const MEEPLE_COLORS: [MeepleColor; MEEPLE_COLOR_COUNT] = [
    MeepleColor::Green,
    MeepleColor::Red,
    MeepleColor::Blue,
    MeepleColor::Yellow,
    MeepleColor::Black,
];

impl MeepleColor {
    /// Bucket index in [`MeepleCounts`]; 0 is reserved for "unowned".
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Colour of the `seat`-th player.
    pub fn for_seat(seat: usize) -> Option<Self> {
        MEEPLE_COLORS.get(seat).copied()
    }
}

impl fmt::Display for MeepleColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeepleColor::Green => "green",
            MeepleColor::Red => "red",
            MeepleColor::Blue => "blue",
            MeepleColor::Yellow => "yellow",
            MeepleColor::Black => "black",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeple {
    pub color: MeepleColor,
    pub segment: usize,
}

/// Meeples per colour standing in one structure. Bucket 0 counts meeples
/// without an owner and stays empty in normal play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeepleCounts(pub [u32; MEEPLE_COLOR_COUNT + 1]);

impl MeepleCounts {
    #[inline]
    pub fn get(&self, color: MeepleColor) -> u32 {
        self.0[color.index()]
    }

    #[inline]
    pub fn add(&mut self, color: MeepleColor) {
        self.0[color.index()] += 1;
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Largest count over every bucket.
    pub fn max(&self) -> u32 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Largest count over every bucket except `color`'s.
    pub fn max_excluding(&self, color: MeepleColor) -> u32 {
        self.0
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != color.index())
            .map(|(_, &n)| n)
            .max()
            .unwrap_or(0)
    }

    /// Colours tied for the largest nonzero count.
    pub fn majority(&self) -> Vec<MeepleColor> {
        let max = self.max();
        if max == 0 {
            return Vec::new();
        }
        MEEPLE_COLORS
            .iter()
            .copied()
            .filter(|&c| self.get(c) == max)
            .collect()
    }
}

// --- Tile ---

/// A tile: segment layout plus flags, rotation and an optional meeple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Catalog shape index (see `tiles::CATALOG`).
    pub shape: u8,
    pub segments: [Segment; SEGMENT_COUNT],
    pub pennant: bool,
    pub starting: bool,
    pub rotation: u8,
    pub meeple: Option<Meeple>,
}

impl Tile {
    pub fn new(shape: u8, segments: [Segment; SEGMENT_COUNT]) -> Self {
        Self {
            shape,
            segments,
            pennant: false,
            starting: false,
            rotation: 0,
            meeple: None,
        }
    }

    #[inline]
    pub fn segment(&self, index: usize) -> Segment {
        self.segments[index]
    }

    #[inline]
    pub fn kind(&self, index: usize) -> Option<FeatureType> {
        self.segments[index].kind
    }

    #[inline]
    pub fn id(&self, index: usize) -> u8 {
        self.segments[index].id
    }

    /// Quarter turn clockwise: the north triple becomes the east triple.
    pub fn rotate(&mut self) {
        self.segments[..RING_SEGMENTS].rotate_right(3);
        self.rotation = (self.rotation + 1) % 4;
    }

    /// Copy turned clockwise `quarter_turns` times.
    pub fn rotated(mut self, quarter_turns: u8) -> Self {
        for _ in 0..quarter_turns % 4 {
            self.rotate();
        }
        self
    }

    /// Whether this tile's `side` matches `neighbor` placed on that side.
    pub fn matches(&self, side: Side, neighbor: &Tile) -> bool {
        let theirs = side.opposite().first_segment();
        (0..3).all(|i| self.kind(side.facing(i)) == neighbor.kind(theirs + i))
    }

    /// Owner of the meeple on this tile if it stands in the structure `id`.
    #[inline]
    pub fn meeple_in(&self, id: u8) -> Option<MeepleColor> {
        self.meeple
            .filter(|m| self.id(m.segment) == id)
            .map(|m| m.color)
    }
}

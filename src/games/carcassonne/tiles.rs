//! Complete tile catalog for the base game (24 shapes, 72 tiles).
//!
//! Each side is written clockwise as three segment tokens, a kind letter
//! (`F`ield, `R`oad, `C`ity, `M`onastery) followed by a local index; `..`
//! marks a segment without a structure. Tokens with the same letter and index
//! belong to the same structure on the tile.

use once_cell::sync::Lazy;

use super::types::*;

/// One catalog entry: a tile shape and how many copies the deck holds.
#[derive(Debug, Clone)]
pub struct TileShape {
    pub name: &'static str,
    pub count: usize,
    pub tile: Tile,
}

struct ShapeDef {
    name: &'static str,
    count: usize,
    /// North, east, south, west.
    sides: [&'static str; 4],
    center: &'static str,
    pennant: bool,
    starting: bool,
}

const fn def(
    name: &'static str,
    count: usize,
    sides: [&'static str; 4],
    center: &'static str,
) -> ShapeDef {
    ShapeDef { name, count, sides, center, pennant: false, starting: false }
}

const fn pennant(mut d: ShapeDef) -> ShapeDef {
    d.pennant = true;
    d
}

const fn starting(mut d: ShapeDef) -> ShapeDef {
    d.starting = true;
    d
}

const FIELD: &str = "F1 F1 F1";
const CITY: &str = "C1 C1 C1";

const SHAPES: [ShapeDef; 25] = [
    // Monastery
    def("B", 4, [FIELD, FIELD, FIELD, FIELD], "M1"),
    // Monastery with road south
    def("A", 2, [FIELD, FIELD, "F1 R1 F1", FIELD], "M1"),
    // Straight road
    def("U", 8, [FIELD, "F1 R1 F2", "F2 F2 F2", "F2 R1 F1"], "R1"),
    // Curved road
    def("V", 9, [FIELD, FIELD, "F1 R1 F2", "F2 R1 F1"], "R1"),
    // Three-way junction
    def("W", 4, [FIELD, "F1 R1 F2", "F2 R2 F3", "F3 R3 F1"], ".."),
    // Crossroads
    def("X", 1, ["F1 R1 F2", "F2 R2 F3", "F3 R3 F4", "F4 R4 F1"], ".."),
    // City cap
    def("E", 5, [CITY, FIELD, FIELD, FIELD], "F1"),
    // City cap with straight road; one copy starts the game
    starting(def("D", 1, [CITY, "F1 R1 F2", "F2 F2 F2", "F2 R1 F1"], "R1")),
    def("D", 3, [CITY, "F1 R1 F2", "F2 F2 F2", "F2 R1 F1"], "R1"),
    // City cap, road curving south-west
    def("J", 3, [CITY, FIELD, "F1 R1 F2", "F2 R1 F1"], "R1"),
    // City cap, road curving east-south
    def("K", 3, [CITY, "F1 R1 F2", "F2 R1 F1", FIELD], "R1"),
    // City cap with three-way junction
    def("L", 3, [CITY, "F1 R1 F2", "F2 R2 F3", "F3 R3 F1"], ".."),
    // City band east-west
    def("G", 1, [FIELD, CITY, "F2 F2 F2", CITY], "C1"),
    pennant(def("F", 2, [FIELD, CITY, "F2 F2 F2", CITY], "C1")),
    // City corner north-east
    def("N", 3, [CITY, CITY, FIELD, FIELD], ".."),
    pennant(def("M", 2, [CITY, CITY, FIELD, FIELD], "..")),
    // Two separate caps, opposite sides
    def("H", 3, [CITY, FIELD, "C2 C2 C2", FIELD], "F1"),
    // Two separate caps, adjacent sides
    def("I", 2, [CITY, "C2 C2 C2", FIELD, FIELD], "F1"),
    // City corner with curved road
    def("P", 3, [CITY, CITY, "F1 R1 F2", "F2 R1 F1"], ".."),
    pennant(def("O", 2, [CITY, CITY, "F1 R1 F2", "F2 R1 F1"], "..")),
    // Three-sided city
    def("R", 3, [CITY, CITY, FIELD, CITY], "C1"),
    pennant(def("Q", 1, [CITY, CITY, FIELD, CITY], "C1")),
    // Three-sided city with road
    def("T", 1, [CITY, CITY, "F1 R1 F2", CITY], "C1"),
    pennant(def("S", 2, [CITY, CITY, "F1 R1 F2", CITY], "C1")),
    // Full city
    pennant(def("C", 1, [CITY, CITY, CITY, CITY], "C1")),
];

pub static CATALOG: Lazy<Vec<TileShape>> = Lazy::new(|| {
    SHAPES
        .iter()
        .enumerate()
        .map(|(idx, d)| TileShape {
            name: d.name,
            count: d.count,
            tile: build_tile(idx as u8, d),
        })
        .collect()
});

/// Look up a shape by its letter. The first entry wins for letters listed
/// twice (the starting copy of `D`).
pub fn shape_by_name(name: &str) -> Option<&'static TileShape> {
    CATALOG.iter().find(|s| s.name == name)
}

/// Fresh, unrotated tile of the given shape letter. Panics on unknown names;
/// intended for tests and fixtures.
pub fn tile(name: &str) -> Tile {
    shape_by_name(name)
        .unwrap_or_else(|| panic!("unknown tile shape: {name}"))
        .tile
}

fn build_tile(shape: u8, d: &ShapeDef) -> Tile {
    // Local ids are handed out per (kind, index) in reading order.
    let mut assigned: Vec<(FeatureType, u8, u8)> = Vec::new();
    let mut segments = [Segment::EMPTY; SEGMENT_COUNT];

    let tokens = d
        .sides
        .iter()
        .flat_map(|side| side.split_whitespace())
        .chain(std::iter::once(d.center));

    for (i, token) in tokens.enumerate() {
        assert!(i < SEGMENT_COUNT, "shape {} has too many segments", d.name);
        let Some((kind, index)) = parse_token(token) else {
            continue;
        };
        let id = match assigned.iter().find(|&&(k, n, _)| k == kind && n == index) {
            Some(&(_, _, id)) => id,
            None => {
                let id = assigned.len() as u8 + 1;
                assigned.push((kind, index, id));
                id
            }
        };
        segments[i] = Segment::new(kind, id);
    }

    let mut tile = Tile::new(shape, segments);
    tile.pennant = d.pennant;
    tile.starting = d.starting;
    tile
}

fn parse_token(token: &str) -> Option<(FeatureType, u8)> {
    let mut chars = token.chars();
    let kind = match chars.next()? {
        'F' => FeatureType::Field,
        'R' => FeatureType::Road,
        'C' => FeatureType::City,
        'M' => FeatureType::Monastery,
        '.' => return None,
        other => panic!("bad segment kind {other:?} in {token:?}"),
    };
    let index = chars.next()?.to_digit(10)? as u8;
    Some((kind, index))
}

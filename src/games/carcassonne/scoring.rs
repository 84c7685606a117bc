//! Scoring for finished structures during play and for everything left on
//! the board at game end.
//!
//! Each call keeps one set of already-scored (position, id) pairs shared by
//! every scorer, so a structure reached from several start segments is paid
//! once per call.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::board::Board;
use super::features::{traverse, walk, FeatureVisitor, Visit};
use super::meeples::collect_meeples;
use super::types::*;

pub const ROAD_POINTS_PER_TILE: u32 = 1;
pub const CITY_POINTS_PER_TILE: u32 = 2;
pub const CITY_POINTS_PER_PENNANT_TILE: u32 = 4;
pub const FIELD_POINTS_PER_CITY: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// After a tile is placed: only finished structures pay.
    Incremental,
    /// Game end: everything pays, fields included.
    Final,
}

/// A structure that produced points. Its meeples have already been taken
/// off the board when this is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredFeature {
    pub feature_type: FeatureType,
    pub origin: Position,
    pub segment: usize,
    pub points: u32,
    pub meeples: MeepleCounts,
    pub locations: [Option<Position>; MEEPLE_COLOR_COUNT + 1],
}

impl ScoredFeature {
    /// Colours paid for this structure.
    pub fn winners(&self) -> Vec<MeepleColor> {
        self.meeples.majority()
    }
}

type Collected = HashSet<(Position, u8)>;

/// Score every structure touching the tile at `pos`, plus any monastery in
/// its 3×3 neighbourhood.
pub fn collect_points(
    board: &mut Board,
    pos: Position,
    mode: ScoringMode,
    mut on_score: impl FnMut(ScoredFeature),
) {
    if !board.is_occupied(pos) {
        return;
    }

    let mut collected = Collected::new();
    for segment in 0..SEGMENT_COUNT {
        score_feature(board, pos, segment, mode, &mut collected, &mut on_score);
    }
    for cell in pos.neighborhood() {
        score_feature(board, cell, CENTER_SEGMENT, mode, &mut collected, &mut on_score);
    }
}

/// Score every structure that holds a meeple. Meeples are visited in
/// row-major board order; one already taken by an earlier structure is
/// skipped.
pub fn collect_all_points(board: &mut Board, mode: ScoringMode, mut on_score: impl FnMut(ScoredFeature)) {
    let mut claimed: Vec<(Position, usize)> = board
        .placed()
        .filter_map(|(pos, tile)| tile.meeple.map(|m| (pos, m.segment)))
        .collect();
    claimed.sort_by_key(|(pos, _)| pos.scan_key());

    let mut collected = Collected::new();
    for (pos, segment) in claimed {
        let still_there = board
            .get(pos)
            .and_then(|t| t.meeple)
            .is_some_and(|m| m.segment == segment);
        if still_there {
            score_feature(board, pos, segment, mode, &mut collected, &mut on_score);
        }
    }
}

fn score_feature(
    board: &mut Board,
    pos: Position,
    segment: usize,
    mode: ScoringMode,
    collected: &mut Collected,
    on_score: &mut impl FnMut(ScoredFeature),
) {
    let Some(tile) = board.get(pos) else {
        return;
    };
    let seg = tile.segment(segment);
    let Some(kind) = seg.kind else {
        return;
    };
    if seg.id == 0 || collected.contains(&(pos, seg.id)) {
        return;
    }

    let points = match kind {
        FeatureType::Road => score_road(board, pos, segment, mode, collected),
        FeatureType::City => score_city(board, pos, segment, mode, collected),
        FeatureType::Monastery => score_monastery(board, pos, seg.id, mode, collected),
        FeatureType::Field => score_field(board, pos, segment, mode, collected),
    };
    if points == 0 {
        return;
    }

    let tally = collect_meeples(board, pos, segment, true);
    tracing::debug!(
        feature = %kind,
        origin = %pos,
        points,
        meeples = tally.counts.total(),
        "feature scored"
    );
    on_score(ScoredFeature {
        feature_type: kind,
        origin: pos,
        segment,
        points,
        meeples: tally.counts,
        locations: tally.locations,
    });
}

/// Sums per-tile points over the segments not yet collected.
struct TileScorer<'a> {
    collected: &'a mut Collected,
    tiles: HashSet<Position>,
    city: bool,
    points: u32,
}

impl FeatureVisitor for TileScorer<'_> {
    fn visit(&mut self, tile: &Tile, visit: Visit) {
        if !self.collected.insert((visit.pos, tile.id(visit.segment))) {
            return;
        }
        if !self.tiles.insert(visit.pos) {
            return;
        }
        self.points += match (self.city, tile.pennant) {
            (false, _) => ROAD_POINTS_PER_TILE,
            (true, false) => CITY_POINTS_PER_TILE,
            (true, true) => CITY_POINTS_PER_PENNANT_TILE,
        };
    }
}

fn tile_points(board: &Board, pos: Position, segment: usize, city: bool, collected: &mut Collected) -> (u32, bool) {
    let mut scorer = TileScorer { collected, tiles: HashSet::new(), city, points: 0 };
    let closed = traverse(board, pos, segment, &mut scorer);
    (scorer.points, closed)
}

fn score_road(board: &Board, pos: Position, segment: usize, mode: ScoringMode, collected: &mut Collected) -> u32 {
    let (points, closed) = tile_points(board, pos, segment, false, collected);
    match mode {
        ScoringMode::Incremental if !closed => 0,
        _ => points,
    }
}

fn score_city(board: &Board, pos: Position, segment: usize, mode: ScoringMode, collected: &mut Collected) -> u32 {
    let (points, closed) = tile_points(board, pos, segment, true, collected);
    match mode {
        ScoringMode::Incremental if closed => points * 2,
        ScoringMode::Incremental => 0,
        ScoringMode::Final => points,
    }
}

fn score_monastery(board: &Board, pos: Position, id: u8, mode: ScoringMode, collected: &mut Collected) -> u32 {
    collected.insert((pos, id));
    let points = pos.neighborhood().filter(|&p| board.is_occupied(p)).count() as u32;
    match mode {
        ScoringMode::Incremental if points < 9 => 0,
        _ => points,
    }
}

/// Gathers the cities bordering a field. A city segment borders the field
/// when one of its ring neighbours carries the field's id.
struct FieldScorer<'a> {
    collected: &'a mut Collected,
    /// Keyed by (row-major position, city id) so phase two runs in board
    /// order.
    cities: BTreeMap<((i32, i32), u8), (Position, usize)>,
}

impl FeatureVisitor for FieldScorer<'_> {
    fn visit(&mut self, tile: &Tile, visit: Visit) {
        let id = tile.id(visit.segment);
        if !self.collected.insert((visit.pos, id)) {
            return;
        }
        for i in 0..RING_SEGMENTS {
            if tile.kind(i) != Some(FeatureType::City) {
                continue;
            }
            let before = (i + RING_SEGMENTS - 1) % RING_SEGMENTS;
            let after = (i + 1) % RING_SEGMENTS;
            if tile.id(before) != id && tile.id(after) != id {
                continue;
            }
            self.cities
                .entry((visit.pos.scan_key(), tile.id(i)))
                .or_insert((visit.pos, i));
        }
    }
}

fn score_field(board: &Board, pos: Position, segment: usize, mode: ScoringMode, collected: &mut Collected) -> u32 {
    if mode == ScoringMode::Incremental {
        return 0;
    }

    let mut scorer = FieldScorer { collected, cities: BTreeMap::new() };
    traverse(board, pos, segment, &mut scorer);
    let mut pending = scorer.cities;

    // Each city counts once however many of its segments border the field.
    let mut points = 0;
    while let Some((_, (city_pos, city_segment))) = pending.pop_first() {
        let city = walk(board, city_pos, city_segment);
        for visit in &city.visits {
            if let Some(tile) = board.get(visit.pos) {
                pending.remove(&(visit.pos.scan_key(), tile.id(visit.segment)));
            }
        }
        if city.closed {
            points += FIELD_POINTS_PER_CITY;
        }
    }
    points
}

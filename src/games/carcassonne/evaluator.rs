//! One-ply placement evaluator for the greedy bot.
//!
//! Every legal (rotation, position) is staged on the board and the
//! structures it touches are re-estimated. A move is worth the change in
//! expected value of those structures for the mover, plus the best
//! unclaimed structure on the new tile it could put a meeple on.

use std::collections::{HashMap, HashSet};

use rand::Rng;

use super::board::Board;
use super::features::{traverse, FeatureVisitor, Visit};
use super::types::*;

/// How many tiles of the deck fit a cell whose known edges show
/// `[cities][roads]` city and road centres. Every tile is counted under the
/// exact number of city and road edges it has.
pub const DEMAND_SUPPLY: [[u32; 5]; 5] = [
    [4, 2, 17, 4, 1],
    [5, 0, 10, 3, 0],
    [13, 0, 5, 0, 0],
    [4, 3, 0, 0, 0],
    [1, 0, 0, 0, 0],
];

/// Own-tile probes: side centres and the tile centre.
const OWN_PROBES: [usize; 5] = [1, 4, 7, 10, 12];

/// Neighbourhood probes as (dx, dy, segment): the facing sides of the four
/// neighbours, the cells two steps away, the diagonal cells' sides turned
/// towards the new tile and the centres of all eight neighbours.
const NEIGHBOR_PROBES: [(i32, i32, usize); 24] = [
    (0, -1, 7),
    (1, 0, 10),
    (0, 1, 1),
    (-1, 0, 4),
    (0, -2, 7),
    (2, 0, 10),
    (0, 2, 1),
    (-2, 0, 4),
    (-1, -1, 4),
    (-1, -1, 7),
    (1, -1, 7),
    (1, -1, 10),
    (1, 1, 10),
    (1, 1, 1),
    (-1, 1, 1),
    (-1, 1, 4),
    (-1, -1, 12),
    (0, -1, 12),
    (1, -1, 12),
    (1, 0, 12),
    (1, 1, 12),
    (0, 1, 12),
    (-1, 1, 12),
    (-1, 0, 12),
];

/// Chance that some tile fitting the empty cell at `pos` is drawn within
/// `remaining` draws, judged only by the city and road edges around it.
pub fn tile_probability(board: &Board, pos: Position, remaining: u32) -> f64 {
    let (mut cities, mut roads, mut unknown) = (0usize, 0usize, 0usize);
    for side in SIDES {
        match board.get(pos.neighbor(side)) {
            None => unknown += 1,
            Some(tile) => match tile.kind(side.opposite().center_segment()) {
                Some(FeatureType::City) => cities += 1,
                Some(FeatureType::Road) => roads += 1,
                _ => {}
            },
        }
    }

    let mut supply = 0;
    for i in 0..=unknown {
        for j in 0..=unknown {
            supply += DEMAND_SUPPLY
                .get(cities + i)
                .and_then(|row| row.get(roads + j))
                .copied()
                .unwrap_or(0);
        }
    }

    let per_draw = (supply as f64 / TILE_COUNT as f64).min(1.0);
    1.0 - (1.0 - per_draw).powi(remaining as i32)
}

/// Expected-value estimate of one structure.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEstimate {
    pub feature_type: FeatureType,
    pub points: u32,
    /// Estimated chance the structure gets finished.
    pub completion: f64,
    pub meeples: MeepleCounts,
}

impl FeatureEstimate {
    /// Points if finished weighted against what it pays unfinished (half for
    /// cities).
    pub fn value(&self) -> f64 {
        let finished = self.points as f64;
        let unfinished = match self.feature_type {
            FeatureType::City => (self.points / 2) as f64,
            _ => finished,
        };
        self.completion * finished + (1.0 - self.completion) * unfinished
    }

    /// [`value`](Self::value) signed by who would get it: positive when
    /// `color` holds at least as many meeples as anyone else, negative when
    /// outnumbered, zero when nobody is in.
    pub fn relative_value(&self, color: MeepleColor) -> f64 {
        let own = self.meeples.get(color);
        let other = self.meeples.max_excluding(color);
        if own == 0 && other == 0 {
            0.0
        } else if own >= other {
            self.value()
        } else {
            -self.value()
        }
    }

    pub fn is_unclaimed(&self) -> bool {
        self.meeples.is_empty()
    }
}

struct Estimator<'a> {
    board: &'a Board,
    remaining: u32,
    estimate: FeatureEstimate,
    members: Vec<(Position, u8)>,
    tiles: HashSet<Position>,
    borders: HashSet<Position>,
}

impl FeatureVisitor for Estimator<'_> {
    fn visit(&mut self, tile: &Tile, visit: Visit) {
        let id = tile.id(visit.segment);
        self.members.push((visit.pos, id));
        if visit.revisited {
            return;
        }

        if self.tiles.insert(visit.pos) {
            self.estimate.points += match (self.estimate.feature_type, tile.pennant) {
                (FeatureType::City, true) => 4,
                (FeatureType::City, false) => 2,
                _ => 1,
            };
        }

        for side in SIDES {
            if tile.id(side.center_segment()) != id {
                continue;
            }
            let border = visit.pos.neighbor(side);
            if self.board.is_occupied(border) || !self.borders.insert(border) {
                continue;
            }
            self.estimate.completion *= tile_probability(self.board, border, self.remaining);
        }

        if let Some(color) = tile.meeple_in(id) {
            self.estimate.meeples.add(color);
        }
    }
}

/// Estimate the structure at (`pos`, `segment`) and list the (position, id)
/// pairs it covers. Callers skip fields and empty segments.
pub fn estimate_feature(
    board: &Board,
    pos: Position,
    segment: usize,
    remaining: u32,
) -> Option<(FeatureEstimate, Vec<(Position, u8)>)> {
    let tile = board.get(pos)?;
    let seg = tile.segment(segment);
    let kind = seg.kind?;
    if seg.is_empty() {
        return None;
    }

    let mut estimate = FeatureEstimate {
        feature_type: kind,
        points: 0,
        completion: 1.0,
        meeples: MeepleCounts::default(),
    };

    if kind == FeatureType::Monastery {
        for cell in pos.neighborhood() {
            if board.is_occupied(cell) {
                estimate.points += 1;
            } else {
                estimate.completion *= tile_probability(board, cell, remaining);
            }
        }
        if let Some(color) = tile.meeple_in(seg.id) {
            estimate.meeples.add(color);
        }
        return Some((estimate, vec![(pos, seg.id)]));
    }

    let mut estimator = Estimator {
        board,
        remaining,
        estimate,
        members: Vec::new(),
        tiles: HashSet::new(),
        borders: HashSet::new(),
    };
    traverse(board, pos, segment, &mut estimator);
    Some((estimator.estimate, estimator.members))
}

/// Estimates of every non-field structure on the board before a move.
#[derive(Debug, Clone, Default)]
pub struct BoardEstimate {
    features: Vec<FeatureEstimate>,
    index: HashMap<(Position, u8), usize>,
}

impl BoardEstimate {
    pub fn scan(board: &Board, remaining: u32) -> Self {
        let mut placed: Vec<Position> = board.placed().map(|(pos, _)| pos).collect();
        placed.sort_by_key(|p| p.scan_key());

        let mut scan = Self::default();
        for pos in placed {
            let Some(tile) = board.get(pos) else {
                continue;
            };
            for segment in 0..SEGMENT_COUNT {
                let seg = tile.segment(segment);
                if seg.is_empty() || seg.kind == Some(FeatureType::Field) {
                    continue;
                }
                if scan.index.contains_key(&(pos, seg.id)) {
                    continue;
                }
                let Some((estimate, members)) = estimate_feature(board, pos, segment, remaining) else {
                    continue;
                };
                let idx = scan.features.len();
                scan.features.push(estimate);
                for member in members {
                    scan.index.entry(member).or_insert(idx);
                }
            }
        }
        scan
    }

    pub fn lookup(&self, pos: Position, id: u8) -> Option<(usize, &FeatureEstimate)> {
        let idx = *self.index.get(&(pos, id))?;
        self.features.get(idx).map(|f| (idx, f))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalParams {
    /// Width of the uniform noise added to every estimate.
    pub jitter: f64,
}

impl Default for EvalParams {
    fn default() -> Self {
        Self { jitter: 1.0 }
    }
}

/// The mover as the evaluator sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mover {
    pub color: MeepleColor,
    pub supply: u32,
}

/// A chosen move: `tile` is already turned `rotation` quarter turns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub pos: Position,
    pub rotation: u8,
    pub tile: Tile,
    pub meeple: Option<usize>,
    pub value: f64,
}

#[inline]
fn jitter<R: Rng + ?Sized>(rng: &mut R, amplitude: f64, value: f64) -> f64 {
    value + amplitude * (rng.gen::<f64>() - 0.5)
}

struct ProbeState<'a, R: Rng + ?Sized> {
    before: &'a BoardEstimate,
    mover: Mover,
    remaining: u32,
    amplitude: f64,
    rng: &'a mut R,
    included: HashSet<(Position, u8)>,
    excluded: HashSet<usize>,
    total: f64,
    best_meeple: Option<usize>,
    best_meeple_value: f64,
}

impl<R: Rng + ?Sized> ProbeState<'_, R> {
    fn probe(&mut self, board: &Board, pos: Position, segment: usize, meeple_allowed: bool) {
        let Some(tile) = board.get(pos) else {
            return;
        };
        let seg = tile.segment(segment);
        if seg.is_empty() || seg.kind == Some(FeatureType::Field) {
            return;
        }

        if !self.included.contains(&(pos, seg.id)) {
            if let Some((estimate, members)) = estimate_feature(board, pos, segment, self.remaining) {
                self.included.extend(members);
                let relative = estimate.relative_value(self.mover.color);
                self.total += jitter(&mut *self.rng, self.amplitude, relative);

                if meeple_allowed && estimate.is_unclaimed() && self.mover.supply > 0 {
                    let value = jitter(&mut *self.rng, self.amplitude, estimate.value());
                    if value > self.best_meeple_value {
                        self.best_meeple = Some(segment);
                        self.best_meeple_value = value;
                    }
                }
            }
        }

        if let Some((idx, old)) = self.before.lookup(pos, seg.id) {
            if self.excluded.insert(idx) {
                self.total -= old.relative_value(self.mover.color);
            }
        }
    }
}

/// Value of placing `tile` (already rotated) at `pos`, and the meeple
/// segment that goes with it. The board is left unchanged.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_placement<R: Rng + ?Sized>(
    board: &mut Board,
    before: &BoardEstimate,
    tile: Tile,
    pos: Position,
    mover: Mover,
    remaining: u32,
    params: &EvalParams,
    rng: &mut R,
) -> (f64, Option<usize>) {
    let trial = board.trial(tile, pos);
    let mut state = ProbeState {
        before,
        mover,
        remaining,
        amplitude: params.jitter,
        rng,
        included: HashSet::new(),
        excluded: HashSet::new(),
        total: 0.0,
        best_meeple: None,
        best_meeple_value: 0.0,
    };

    for segment in OWN_PROBES {
        state.probe(&trial, pos, segment, true);
    }
    for (dx, dy, segment) in NEIGHBOR_PROBES {
        state.probe(&trial, pos.offset(dx, dy), segment, false);
    }

    (state.total + state.best_meeple_value, state.best_meeple)
}

/// Best placement of `tile` for `mover`, or `None` when it fits nowhere.
/// Candidates are tried rotation first, then row-major; the first of equal
/// values wins.
pub fn choose_placement<R: Rng + ?Sized>(
    board: &mut Board,
    tile: &Tile,
    mover: Mover,
    remaining: u32,
    params: &EvalParams,
    rng: &mut R,
) -> Option<Placement> {
    let before = BoardEstimate::scan(board, remaining);
    let open = board.open_positions();

    let mut best: Option<Placement> = None;
    let mut evaluated = 0usize;
    let mut candidate = *tile;
    for rotation in 0..4u8 {
        for &pos in &open {
            if !board.edge_compatible(&candidate, pos) {
                continue;
            }
            evaluated += 1;
            let (value, meeple) =
                evaluate_placement(board, &before, candidate, pos, mover, remaining, params, rng);
            if best.as_ref().map_or(true, |b| value > b.value) {
                best = Some(Placement { pos, rotation, tile: candidate, meeple, value });
            }
        }
        candidate.rotate();
    }

    tracing::trace!(
        structures = before.len(),
        open = open.len(),
        evaluated,
        "placement search finished"
    );
    if let Some(p) = &best {
        tracing::debug!(
            color = %mover.color,
            pos = %p.pos,
            rotation = p.rotation,
            meeple = ?p.meeple,
            value = p.value,
            "bot placement chosen"
        );
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::carcassonne::tiles::tile;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CALM: EvalParams = EvalParams { jitter: 0.0 };

    fn c() -> Position {
        Position::center()
    }

    fn start_board() -> Board {
        let mut board = Board::new();
        board.place_permanent(tile("D"), c());
        board
    }

    fn red(supply: u32) -> Mover {
        Mover { color: MeepleColor::Red, supply }
    }

    #[test]
    fn test_demand_supply_covers_the_deck() {
        let total: u32 = DEMAND_SUPPLY.iter().flatten().sum();
        assert_eq!(total as usize, TILE_COUNT);
    }

    #[test]
    fn test_tile_probability() {
        let board = start_board();
        let far = c().offset(10, 10);
        assert_eq!(tile_probability(&board, far, 0), 0.0);
        assert!((tile_probability(&board, far, 3) - 1.0).abs() < 1e-12);

        // Only a city edge is known: 44 of 72 tiles have at least one city.
        let north = c().neighbor(Side::North);
        let p = tile_probability(&board, north, 1);
        assert!((p - 44.0 / 72.0).abs() < 1e-12);
        let p2 = tile_probability(&board, north, 2);
        assert!(p2 > p && p2 < 1.0);
    }

    #[test]
    fn test_feature_value_and_relative_value() {
        let mut est = FeatureEstimate {
            feature_type: FeatureType::City,
            points: 4,
            completion: 0.5,
            meeples: MeepleCounts::default(),
        };
        assert!((est.value() - 3.0).abs() < 1e-12);
        assert_eq!(est.relative_value(MeepleColor::Red), 0.0);
        assert!(est.is_unclaimed());

        est.meeples.add(MeepleColor::Red);
        assert!((est.relative_value(MeepleColor::Red) - 3.0).abs() < 1e-12);
        assert!((est.relative_value(MeepleColor::Blue) + 3.0).abs() < 1e-12);

        est.feature_type = FeatureType::Road;
        assert!((est.value() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_monastery() {
        let mut board = start_board();
        board.place_permanent(tile("B"), c().neighbor(Side::South));
        let (est, members) =
            estimate_feature(&board, c().neighbor(Side::South), CENTER_SEGMENT, 10).unwrap();
        assert_eq!(est.feature_type, FeatureType::Monastery);
        assert_eq!(est.points, 2);
        assert!(est.completion > 0.0 && est.completion <= 1.0);
        assert_eq!(members.len(), 1);
    }

    #[test]
    fn test_scan_skips_fields() {
        let board = start_board();
        let scan = BoardEstimate::scan(&board, 10);
        // City and road of the starting tile.
        assert_eq!(scan.len(), 2);
        let city_id = board.get(c()).unwrap().id(1);
        let (_, city) = scan.lookup(c(), city_id).unwrap();
        assert_eq!(city.feature_type, FeatureType::City);
        assert_eq!(city.points, 2);
        let field_id = board.get(c()).unwrap().id(3);
        assert!(scan.lookup(c(), field_id).is_none());
    }

    #[test]
    fn test_no_legal_placement() {
        let mut board = Board::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(choose_placement(&mut board, &tile("E"), red(7), 10, &CALM, &mut rng).is_none());
    }

    #[test]
    fn test_bot_closes_city_and_claims_it() {
        let mut board = start_board();
        let mut rng = StdRng::seed_from_u64(7);
        let p = choose_placement(&mut board, &tile("E"), red(7), 20, &CALM, &mut rng).unwrap();
        assert_eq!(p.pos, c().neighbor(Side::North));
        assert_eq!(p.rotation, 2);
        assert_eq!(p.meeple, Some(7));
        assert!((p.value - 4.0).abs() < 1e-9);

        assert_eq!(board.tile_count(), 1);
        assert_eq!(board.preview_position(), None);
        assert!(!board.is_occupied(p.pos));
    }

    #[test]
    fn test_no_meeple_without_supply() {
        let mut board = start_board();
        let mut rng = StdRng::seed_from_u64(7);
        let p = choose_placement(&mut board, &tile("E"), red(0), 20, &CALM, &mut rng).unwrap();
        assert_eq!(p.meeple, None);
    }

    #[test]
    fn test_opponent_structure_is_not_joined_for_free() {
        // Blue owns the starting city; closing it only pays Blue.
        let mut board = start_board();
        board.place_meeple(Meeple { color: MeepleColor::Blue, segment: 1 }, c());
        let before = BoardEstimate::scan(&board, 20);
        let mut rng = StdRng::seed_from_u64(3);
        let north = c().neighbor(Side::North);
        let (value, meeple) =
            evaluate_placement(&mut board, &before, tile("E").rotated(2), north, red(7), 20, &CALM, &mut rng);
        assert!(value < 0.0);
        assert_eq!(meeple, None);
    }

    #[test]
    fn test_seeded_search_is_reproducible() {
        let mut board = start_board();
        let params = EvalParams::default();
        let a = choose_placement(&mut board, &tile("V"), red(7), 30, &params, &mut StdRng::seed_from_u64(42));
        let b = choose_placement(&mut board, &tile("V"), red(7), 30, &params, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_structure_seen_from_many_cells_counts_once() {
        // Red's road runs along the row above the new tile, so it shows up
        // on both upper diagonals and all three upper centres. It must be
        // re-estimated once and its old value taken off once.
        let mut board = Board::new();
        for dx in -1..=1 {
            board.place_permanent(tile("U"), c().offset(dx, -1));
        }
        board.place_meeple(Meeple { color: MeepleColor::Red, segment: CENTER_SEGMENT }, c().offset(0, -1));
        let before = BoardEstimate::scan(&board, 20);
        assert_eq!(before.len(), 1);

        let mut rng = StdRng::seed_from_u64(5);
        let (value, meeple) =
            evaluate_placement(&mut board, &before, tile("B"), c(), red(7), 20, &CALM, &mut rng);
        // The road is unchanged, so only the monastery meeple (4 tiles) counts.
        assert!((value - 4.0).abs() < 1e-9, "value {value}");
        assert_eq!(meeple, Some(CENTER_SEGMENT));
        assert_eq!(board.preview_position(), None);
        assert!(!board.is_occupied(c()));
    }
}

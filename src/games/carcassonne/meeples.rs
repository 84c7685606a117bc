//! Meeple counting and return over a traversed structure.

use super::board::Board;
use super::features::{traverse, FeatureVisitor, Visit};
use super::types::*;

/// Meeples found in one structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeepleTally {
    pub counts: MeepleCounts,
    /// One tile per colour where that colour's meeple was found (the last
    /// one seen).
    pub locations: [Option<Position>; MEEPLE_COLOR_COUNT + 1],
}

impl MeepleTally {
    pub fn location(&self, color: MeepleColor) -> Option<Position> {
        self.locations[color.index()]
    }

    fn record(&mut self, color: MeepleColor, pos: Position) {
        self.counts.add(color);
        self.locations[color.index()] = Some(pos);
    }
}

struct MeepleCounter {
    tally: MeepleTally,
    found: Vec<Position>,
}

impl FeatureVisitor for MeepleCounter {
    fn visit(&mut self, tile: &Tile, visit: Visit) {
        if visit.revisited {
            return;
        }
        if let Some(color) = tile.meeple_in(tile.id(visit.segment)) {
            self.tally.record(color, visit.pos);
            self.found.push(visit.pos);
        }
    }
}

/// Count the meeples standing in the structure at (`pos`, `segment`).
pub fn count_meeples(board: &Board, pos: Position, segment: usize) -> MeepleTally {
    let mut counter = MeepleCounter { tally: MeepleTally::default(), found: Vec::new() };
    traverse(board, pos, segment, &mut counter);
    counter.tally
}

/// Like [`count_meeples`]; with `remove` every meeple found is also taken
/// off the board. Returning them to supplies is up to the caller.
pub fn collect_meeples(board: &mut Board, pos: Position, segment: usize, remove: bool) -> MeepleTally {
    let mut counter = MeepleCounter { tally: MeepleTally::default(), found: Vec::new() };
    traverse(board, pos, segment, &mut counter);
    if remove {
        for at in counter.found {
            if let Some(tile) = board.get_mut(at) {
                tile.meeple = None;
            }
        }
    }
    counter.tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::carcassonne::tiles::tile;

    fn c() -> Position {
        Position::center()
    }

    fn road_of_three(board: &mut Board) {
        board.place_permanent(tile("U"), c());
        board.place_permanent(tile("U"), c().neighbor(Side::East));
        board.place_permanent(tile("U"), c().neighbor(Side::West));
    }

    #[test]
    fn test_count_meeples_across_tiles() {
        let mut board = Board::new();
        road_of_three(&mut board);
        board.place_meeple(Meeple { color: MeepleColor::Red, segment: 4 }, c().neighbor(Side::East));
        board.place_meeple(Meeple { color: MeepleColor::Blue, segment: 10 }, c().neighbor(Side::West));

        let tally = count_meeples(&board, c(), CENTER_SEGMENT);
        assert_eq!(tally.counts.get(MeepleColor::Red), 1);
        assert_eq!(tally.counts.get(MeepleColor::Blue), 1);
        assert_eq!(tally.location(MeepleColor::Red), Some(c().neighbor(Side::East)));
        assert_eq!(tally.location(MeepleColor::Green), None);
    }

    #[test]
    fn test_meeple_on_other_structure_ignored() {
        let mut board = Board::new();
        road_of_three(&mut board);
        // Field meeple next to the road.
        board.place_meeple(Meeple { color: MeepleColor::Red, segment: 1 }, c());
        assert!(count_meeples(&board, c(), 4).counts.is_empty());
        assert_eq!(count_meeples(&board, c(), 0).counts.total(), 1);
    }

    #[test]
    fn test_collect_meeples_removes() {
        let mut board = Board::new();
        road_of_three(&mut board);
        board.place_meeple(Meeple { color: MeepleColor::Red, segment: 4 }, c());

        let kept = collect_meeples(&mut board, c(), 4, false);
        assert_eq!(kept.counts.total(), 1);
        assert!(board.get(c()).and_then(|t| t.meeple).is_some());

        let taken = collect_meeples(&mut board, c(), 4, true);
        assert_eq!(taken.counts.get(MeepleColor::Red), 1);
        assert!(board.get(c()).and_then(|t| t.meeple).is_none());
    }

    #[test]
    fn test_empty_cell_counts_nothing() {
        let board = Board::new();
        assert_eq!(count_meeples(&board, c(), 4), MeepleTally::default());
    }
}

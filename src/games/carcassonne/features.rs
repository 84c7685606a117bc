//! Feature traversal: breadth-first walk over the segments of one structure.
//!
//! Features are never stored. A feature is the set of segments reachable
//! from a start segment by following equal ids inside a tile and equal kinds
//! across tile edges, and is rebuilt on demand by [`traverse`].

use std::collections::{HashSet, VecDeque};

use super::board::Board;
use super::types::*;

/// One step of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub pos: Position,
    pub segment: usize,
    /// This exact (position, id) was already dequeued during the walk.
    pub revisited: bool,
}

/// Receives every segment reached by [`traverse`].
pub trait FeatureVisitor {
    fn visit(&mut self, tile: &Tile, visit: Visit);
}

/// Visitor that ignores everything.
pub struct NoopVisitor;

impl FeatureVisitor for NoopVisitor {
    fn visit(&mut self, _tile: &Tile, _visit: Visit) {}
}

/// Walk the structure containing `segment` of the tile at `pos`, calling
/// `visitor` for every reached segment in FIFO order. Returns whether the
/// structure is closed, i.e. no member segment faces an empty cell.
///
/// Starting on an empty cell or on a segment without a structure visits
/// nothing and returns `true`.
pub fn traverse<V: FeatureVisitor + ?Sized>(
    board: &Board,
    pos: Position,
    segment: usize,
    visitor: &mut V,
) -> bool {
    let Some(start) = board.get(pos) else {
        return true;
    };
    if start.segment(segment).is_empty() {
        return true;
    }

    let mut visited: HashSet<(Position, u8)> = HashSet::new();
    let mut queue: VecDeque<(Position, usize)> = VecDeque::new();
    let mut closed = true;
    queue.push_back((pos, segment));

    while let Some((pos, segment)) = queue.pop_front() {
        let Some(tile) = board.get(pos) else {
            continue;
        };
        let id = tile.id(segment);
        let revisited = !visited.insert((pos, id));
        visitor.visit(tile, Visit { pos, segment, revisited });
        if revisited {
            continue;
        }

        for side in SIDES {
            let neighbor_pos = pos.neighbor(side);
            let neighbor = board.get(neighbor_pos);
            let theirs = side.opposite().first_segment();

            // Every matching segment of the side counts: a field can wrap
            // round a road end and touch both neighbouring fields.
            for i in 0..3 {
                let ours = side.facing(i);
                if tile.id(ours) != id {
                    continue;
                }
                let Some(neighbor) = neighbor else {
                    closed = false;
                    continue;
                };
                let across = theirs + i;
                if neighbor.kind(across) == tile.kind(ours)
                    && !visited.contains(&(neighbor_pos, neighbor.id(across)))
                {
                    queue.push_back((neighbor_pos, across));
                }
            }
        }
    }

    closed
}

/// Every segment reached by a traversal, in visiting order.
#[derive(Debug, Clone, Default)]
pub struct FeatureWalk {
    pub visits: Vec<Visit>,
    pub closed: bool,
}

impl FeatureWalk {
    /// Distinct tiles the structure spans.
    pub fn tiles(&self) -> Vec<Position> {
        let mut seen = HashSet::new();
        self.visits
            .iter()
            .filter(|v| seen.insert(v.pos))
            .map(|v| v.pos)
            .collect()
    }
}

struct Recorder<'a>(&'a mut Vec<Visit>);

impl FeatureVisitor for Recorder<'_> {
    fn visit(&mut self, _tile: &Tile, visit: Visit) {
        self.0.push(visit);
    }
}

/// Traverse and record the visits.
pub fn walk(board: &Board, pos: Position, segment: usize) -> FeatureWalk {
    let mut visits = Vec::new();
    let closed = traverse(board, pos, segment, &mut Recorder(&mut visits));
    FeatureWalk { visits, closed }
}

pub fn is_closed(board: &Board, pos: Position, segment: usize) -> bool {
    traverse(board, pos, segment, &mut NoopVisitor)
}

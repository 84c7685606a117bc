//! Board logic: the tile grid, placement validation, open positions and the
//! single reversible preview placement.

use std::ops::Deref;

use super::meeples::count_meeples;
use super::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    /// Index into the permanent tile store.
    Placed(u8),
    Preview,
}

/// Fixed-size grid of optional tile references. Tiles live in the permanent
/// store; the grid only points at them.
#[derive(Debug, Clone)]
pub struct Board {
    tiles: Vec<Tile>,
    positions: Vec<Position>,
    grid: Vec<Option<Cell>>,
    preview: Option<(Position, Tile)>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            tiles: Vec::with_capacity(TILE_COUNT),
            positions: Vec::with_capacity(TILE_COUNT),
            grid: vec![None; (BOARD_SIZE * BOARD_SIZE) as usize],
            preview: None,
        }
    }

    #[inline]
    fn index(pos: Position) -> Option<usize> {
        if (0..BOARD_SIZE).contains(&pos.x) && (0..BOARD_SIZE).contains(&pos.y) {
            Some((pos.y * BOARD_SIZE + pos.x) as usize)
        } else {
            None
        }
    }

    /// Tile at `pos`, including a staged preview. Off-grid reads are empty.
    #[inline]
    pub fn get(&self, pos: Position) -> Option<&Tile> {
        match self.grid[Self::index(pos)?]? {
            Cell::Placed(i) => self.tiles.get(i as usize),
            Cell::Preview => self.preview.as_ref().map(|(_, t)| t),
        }
    }

    #[inline]
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        match self.grid[Self::index(pos)?]? {
            Cell::Placed(i) => self.tiles.get_mut(i as usize),
            Cell::Preview => self.preview.as_mut().map(|(_, t)| t),
        }
    }

    #[inline]
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.get(pos).is_some()
    }

    /// Number of permanently placed tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Permanently placed tiles in placement order.
    pub fn placed(&self) -> impl Iterator<Item = (Position, &Tile)> {
        self.positions.iter().copied().zip(self.tiles.iter())
    }

    pub fn preview_position(&self) -> Option<Position> {
        self.preview.as_ref().map(|(p, _)| *p)
    }

    /// Check if a tile can be placed at the given position as rotated.
    ///
    /// Rules:
    /// 1. Position must be empty
    /// 2. Position must touch at least one placed tile
    /// 3. Every touching edge triple must match kind for kind
    pub fn edge_compatible(&self, tile: &Tile, pos: Position) -> bool {
        if Self::index(pos).is_none() || self.is_occupied(pos) {
            return false;
        }

        let mut has_neighbor = false;
        for side in SIDES {
            let Some(neighbor) = self.get(pos.neighbor(side)) else {
                continue;
            };
            has_neighbor = true;
            if !tile.matches(side, neighbor) {
                return false;
            }
        }

        has_neighbor
    }

    /// Empty cells orthogonally adjacent to a placed tile, in row-major order.
    pub fn open_positions(&self) -> Vec<Position> {
        let mut open: Vec<Position> = self
            .positions
            .iter()
            .flat_map(|&p| SIDES.map(|side| p.neighbor(side)))
            .filter(|&p| Self::index(p).is_some() && !self.is_occupied(p))
            .collect();
        open.sort_by_key(|p| p.scan_key());
        open.dedup();
        open
    }

    /// Every legal (position, quarter turns) for `tile`, rotation-major.
    pub fn legal_placements(&self, tile: &Tile) -> Vec<(Position, u8)> {
        let open = self.open_positions();
        let mut result = Vec::new();
        let mut candidate = *tile;
        for turns in 0..4u8 {
            for &pos in &open {
                if self.edge_compatible(&candidate, pos) {
                    result.push((pos, turns));
                }
            }
            candidate.rotate();
        }
        result
    }

    /// Check if a tile can be placed anywhere on the board in any rotation.
    pub fn has_any_legal_position(&self, tile: &Tile) -> bool {
        let open = self.open_positions();
        let mut candidate = *tile;
        for _ in 0..4 {
            if open.iter().any(|&pos| self.edge_compatible(&candidate, pos)) {
                return true;
            }
            candidate.rotate();
        }
        false
    }

    /// Add a tile to the permanent store. Irreversible.
    ///
    /// Panics when the store is full or the cell is off-grid or taken; the
    /// deck never holds more than [`TILE_COUNT`] tiles.
    pub fn place_permanent(&mut self, tile: Tile, pos: Position) {
        assert!(self.tiles.len() < TILE_COUNT, "permanent tile store is full");
        let idx = Self::index(pos).unwrap_or_else(|| panic!("position {pos} is off the board"));
        assert!(
            !matches!(self.grid[idx], Some(Cell::Placed(_))),
            "position {pos} is already taken"
        );
        if self.preview_position() == Some(pos) {
            self.preview = None;
        }
        self.grid[idx] = Some(Cell::Placed(self.tiles.len() as u8));
        self.tiles.push(tile);
        self.positions.push(pos);
    }

    /// Stage (`Some`) or clear (`None`) the preview placement at `pos`
    /// without touching the permanent store. Staging a new preview drops
    /// any previous one.
    pub fn place_preview(&mut self, tile: Option<Tile>, pos: Position) {
        if let Some((old, _)) = self.preview.take() {
            if let Some(idx) = Self::index(old) {
                if self.grid[idx] == Some(Cell::Preview) {
                    self.grid[idx] = None;
                }
            }
        }

        let Some(tile) = tile else {
            return;
        };
        let Some(idx) = Self::index(pos) else {
            return;
        };
        if self.grid[idx].is_none() {
            self.grid[idx] = Some(Cell::Preview);
            self.preview = Some((pos, tile));
        }
    }

    /// Stage `tile` at `pos` for as long as the returned guard lives.
    pub fn trial(&mut self, tile: Tile, pos: Position) -> TrialPlacement<'_> {
        self.place_preview(Some(tile), pos);
        TrialPlacement { board: self, pos }
    }

    /// Put a meeple on the tile at `pos`. Returns false for an empty cell.
    pub fn place_meeple(&mut self, meeple: Meeple, pos: Position) -> bool {
        match self.get_mut(pos) {
            Some(tile) => {
                tile.meeple = Some(meeple);
                true
            }
            None => false,
        }
    }

    /// Which segments of the tile at `pos` could take a meeple: the segment
    /// must belong to a structure that nobody occupies yet.
    pub fn valid_meeple_segments(&self, pos: Position) -> [bool; SEGMENT_COUNT] {
        let mut valid = [false; SEGMENT_COUNT];
        let Some(tile) = self.get(pos) else {
            return valid;
        };

        // Structures are checked once per local id.
        let mut checked: Vec<(u8, bool)> = Vec::new();
        for (i, slot) in valid.iter_mut().enumerate() {
            let segment = tile.segment(i);
            if segment.is_empty() {
                continue;
            }
            *slot = match checked.iter().find(|(id, _)| *id == segment.id) {
                Some(&(_, free)) => free,
                None => {
                    let free = count_meeples(self, pos, i).counts.is_empty();
                    checked.push((segment.id, free));
                    free
                }
            };
        }
        valid
    }
}

/// A staged preview placement. Derefs to the board with the tile in place
/// and clears the preview when dropped.
pub struct TrialPlacement<'a> {
    board: &'a mut Board,
    pos: Position,
}

impl Deref for TrialPlacement<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl Drop for TrialPlacement<'_> {
    fn drop(&mut self) {
        self.board.place_preview(None, self.pos);
    }
}

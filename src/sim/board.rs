//! Fixed-size playfield grid

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::catalog::{Color, Piece};

/// A grid cell: empty, or the color of the piece that filled it
pub type Cell = Option<Color>;

/// ROWS x COLS grid, row 0 at the top
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
}

impl Board {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![vec![None; cols]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    /// Cell at `(x, y)`, `None` when out of bounds
    pub fn get(&self, pos: IVec2) -> Option<Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.cells[pos.y as usize][pos.x as usize])
    }

    /// Overwrite one cell; out-of-bounds writes are ignored
    pub fn set(&mut self, pos: IVec2, cell: Cell) {
        if self.in_bounds(pos) {
            self.cells[pos.y as usize][pos.x as usize] = cell;
        }
    }

    pub fn in_bounds(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.cols && (pos.y as usize) < self.rows
    }

    /// True iff an occupied sub-cell of `piece` is left/right of the board, at or
    /// below the floor, or on a filled cell. Cells above row 0 never collide.
    pub fn collides(&self, piece: &Piece) -> bool {
        piece.cells().any(|c| {
            if c.x < 0 || c.x as usize >= self.cols || c.y >= self.rows as i32 {
                return true;
            }
            c.y >= 0 && self.cells[c.y as usize][c.x as usize].is_some()
        })
    }

    /// Write `piece` into the grid with its color. Sub-cells outside the grid are dropped.
    pub fn merge(&mut self, piece: &Piece) {
        for c in piece.cells() {
            self.set(c, Some(piece.color));
        }
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.cells[row].iter().all(Option::is_some)
    }

    /// Remove every full row in one pass and refill from the top with empty rows.
    /// Returns the number of rows removed.
    pub fn clear_lines(&mut self) -> usize {
        let before = self.cells.len();
        self.cells.retain(|row| !row.iter().all(Option::is_some));
        let cleared = before - self.cells.len();
        if cleared > 0 {
            let mut refill = vec![vec![None; self.cols]; cleared];
            refill.append(&mut self.cells);
            self.cells = refill;
        }
        cleared
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }
}

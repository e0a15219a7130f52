//! Grid module - the playfield model
//!
//! The grid is a `cols x rows` matrix of cell values where `0` is empty and
//! `1..=15` is the colour index of the piece that filled it.
//! Uses a flat vector in row-major order (`y * cols + x`).
//! Coordinates: (x, y) where x is the column and y is the row, both from the top-left.

use arrayvec::ArrayVec;

use crate::pieces::Piece;
use crate::types::{CellValue, EMPTY, OUT_OF_BOUNDS};

/// Cells removed by one line-clear pass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineClear {
    /// Number of full rows plus full columns
    pub lines: u32,
    /// Union of every cell on a cleared line, each listed once, in row-major order
    pub cells: Vec<(usize, usize)>,
}

impl LineClear {
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    pub fn block_count(&self) -> u32 {
        self.cells.len() as u32
    }
}

/// The game grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cols: usize,
    rows: usize,
    cells: Vec<CellValue>,
}

impl Grid {
    /// Create a new empty grid
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![EMPTY; cols * rows],
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.cols || y as usize >= self.rows {
            return None;
        }
        Some(y as usize * self.cols + x as usize)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Get the cell value at (x, y)
    ///
    /// Coordinates outside the grid yield [`OUT_OF_BOUNDS`] (`-1`), which every
    /// placement check treats as occupied.
    pub fn get(&self, x: i32, y: i32) -> CellValue {
        self.index(x, y).map_or(OUT_OF_BOUNDS, |idx| self.cells[idx])
    }

    /// Write a cell value
    ///
    /// Writes outside the grid are ignored; callers validate with
    /// [`Grid::can_play_piece`] before writing piece cells.
    pub fn set(&mut self, x: i32, y: i32, value: CellValue) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = value;
        }
    }

    /// Check whether every filled cell of `piece`, translated by (x, y), lands on an empty cell
    pub fn can_play_piece(&self, piece: &Piece, x: i32, y: i32) -> bool {
        piece
            .filled()
            .iter()
            .all(|&(dx, dy)| self.get(x + dx as i32, y + dy as i32) == EMPTY)
    }

    /// Place `piece` centred on the clicked cell (x, y)
    ///
    /// The 3x3 mask is anchored one cell up and left of the clicked cell.
    /// Returns false and leaves the grid untouched if any covered cell is taken
    /// or outside the grid.
    pub fn play_piece(&mut self, piece: &Piece, x: i32, y: i32) -> bool {
        let (ax, ay) = (x - 1, y - 1);
        if !self.can_play_piece(piece, ax, ay) {
            return false;
        }

        let value = piece.value();
        for &(dx, dy) in piece.filled().iter() {
            self.set(ax + dx as i32, ay + dy as i32, value);
        }
        true
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= self.rows {
            return false;
        }
        let start = y * self.cols;
        self.cells[start..start + self.cols]
            .iter()
            .all(|&cell| cell != EMPTY)
    }

    /// Check if a column is completely filled
    pub fn is_col_full(&self, x: usize) -> bool {
        if x >= self.cols {
            return false;
        }
        (0..self.rows).all(|y| self.cells[y * self.cols + x] != EMPTY)
    }

    /// Find every full row and column without modifying the grid
    pub fn find_lines(&self) -> LineClear {
        let mut marked = vec![false; self.cells.len()];
        let mut lines = 0;

        for y in (0..self.rows).filter(|&y| self.is_row_full(y)) {
            lines += 1;
            for x in 0..self.cols {
                marked[y * self.cols + x] = true;
            }
        }
        for x in (0..self.cols).filter(|&x| self.is_col_full(x)) {
            lines += 1;
            for y in 0..self.rows {
                marked[y * self.cols + x] = true;
            }
        }

        let cells = marked
            .iter()
            .enumerate()
            .filter(|(_, &hit)| hit)
            .map(|(idx, _)| (idx % self.cols, idx / self.cols))
            .collect();

        LineClear { lines, cells }
    }

    /// Zero every cell on a full row or column and report what was removed
    ///
    /// Rows and columns are detected before anything is zeroed, so a cell shared
    /// by a full row and a full column is counted once.
    pub fn clear_lines(&mut self) -> LineClear {
        let cleared = self.find_lines();
        for &(x, y) in &cleared.cells {
            self.cells[y * self.cols + x] = EMPTY;
        }
        cleared
    }

    /// Get a reference to the internal cells, row-major
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Rebuild a grid from row-major cell values
    ///
    /// Returns None if the value count does not match the dimensions or a value is
    /// outside `0..=15`.
    pub fn from_cells(cols: usize, rows: usize, cells: &[CellValue]) -> Option<Self> {
        if cells.len() != cols * rows {
            return None;
        }
        if cells
            .iter()
            .any(|&v| !(EMPTY..=crate::types::MAX_CELL_VALUE).contains(&v))
        {
            return None;
        }
        Some(Self {
            cols,
            rows,
            cells: cells.to_vec(),
        })
    }

    /// Overwrite every cell from row-major values; ignores mismatched input
    pub fn load_cells(&mut self, cells: &[CellValue]) -> bool {
        match Self::from_cells(self.cols, self.rows, cells) {
            Some(other) => {
                self.cells = other.cells;
                true
            }
            None => false,
        }
    }

    /// Number of occupied cells
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != EMPTY).count()
    }

    /// Clear the entire grid
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = EMPTY;
        }
    }

    /// Row slices, top to bottom
    pub fn rows_iter(&self) -> impl Iterator<Item = &[CellValue]> {
        self.cells.chunks(self.cols.max(1))
    }

    /// Coordinates of the cells a piece would cover if clicked at (x, y)
    pub fn footprint(piece: &Piece, x: i32, y: i32) -> ArrayVec<(i32, i32), 9> {
        piece
            .filled()
            .iter()
            .map(|&(dx, dy)| (x - 1 + dx as i32, y - 1 + dy as i32))
            .collect()
    }
}

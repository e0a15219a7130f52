//! Pieces module - the 15-shape catalogue and quarter-turn rotation
//!
//! Every piece is drawn in a 3x3 mask. Filled cells are painted with the
//! piece's colour value, which is always `id + 1`.

use arrayvec::ArrayVec;

use crate::types::{CellValue, PIECE_COUNT, PIECE_SIZE};

/// Square mask, indexed `[y][x]`
pub type Mask = [[u8; PIECE_SIZE]; PIECE_SIZE];

/// Catalogue entry
struct Shape {
    name: &'static str,
    mask: Mask,
}

const SHAPES: [Shape; PIECE_COUNT as usize] = [
    Shape {
        name: "Line",
        mask: [[0, 1, 0], [0, 1, 0], [0, 1, 0]],
    },
    Shape {
        name: "C",
        mask: [[0, 1, 1], [0, 1, 0], [0, 1, 1]],
    },
    Shape {
        name: "Plus",
        mask: [[0, 1, 0], [1, 1, 1], [0, 1, 0]],
    },
    Shape {
        name: "Dot",
        mask: [[0, 0, 0], [0, 1, 0], [0, 0, 0]],
    },
    Shape {
        name: "Square",
        mask: [[1, 1, 0], [1, 1, 0], [0, 0, 0]],
    },
    Shape {
        name: "L",
        mask: [[0, 1, 0], [0, 1, 0], [0, 1, 1]],
    },
    Shape {
        name: "J",
        mask: [[0, 1, 0], [0, 1, 0], [1, 1, 0]],
    },
    Shape {
        name: "S",
        mask: [[0, 1, 0], [0, 1, 1], [0, 0, 1]],
    },
    Shape {
        name: "Z",
        mask: [[1, 0, 0], [1, 1, 0], [0, 1, 0]],
    },
    Shape {
        name: "T",
        mask: [[1, 1, 1], [0, 1, 0], [0, 0, 0]],
    },
    Shape {
        name: "X",
        mask: [[1, 0, 1], [0, 1, 0], [1, 0, 1]],
    },
    Shape {
        name: "Corner",
        mask: [[0, 0, 0], [0, 1, 1], [0, 1, 0]],
    },
    Shape {
        name: "Inverse Corner",
        mask: [[1, 1, 0], [1, 0, 0], [0, 0, 0]],
    },
    Shape {
        name: "Double",
        mask: [[0, 1, 0], [0, 1, 0], [0, 0, 0]],
    },
    Shape {
        name: "Triple",
        mask: [[0, 0, 0], [1, 1, 1], [0, 0, 0]],
    },
];

/// Rotate a mask 90 degrees clockwise
pub fn rotate_cw(mask: &Mask) -> Mask {
    let mut out = [[0u8; PIECE_SIZE]; PIECE_SIZE];
    for (y, row) in mask.iter().enumerate() {
        for (x, &v) in row.iter().enumerate() {
            out[x][PIECE_SIZE - 1 - y] = v;
        }
    }
    out
}

/// A catalogue piece in some orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    id: u8,
    mask: Mask,
}

impl Piece {
    /// Create the piece with catalogue id `id` in its spawn orientation
    ///
    /// Returns None for ids outside `0..15`.
    pub fn new(id: u8) -> Option<Self> {
        SHAPES.get(id as usize).map(|shape| Self {
            id,
            mask: shape.mask,
        })
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        SHAPES[self.id as usize].name
    }

    /// Colour value painted into the grid
    pub fn value(&self) -> CellValue {
        self.id as CellValue + 1
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// The piece after `quarter_turns` clockwise rotations
    ///
    /// The count is taken modulo 4, so four turns give the same piece back.
    pub fn rotated(&self, quarter_turns: u32) -> Self {
        let mut mask = self.mask;
        for _ in 0..quarter_turns % 4 {
            mask = rotate_cw(&mask);
        }
        Self { id: self.id, mask }
    }

    /// Rotate in place by replacing the mask
    pub fn rotate(&mut self, quarter_turns: u32) {
        *self = self.rotated(quarter_turns);
    }

    /// (x, y) offsets of the filled mask cells, row-major
    pub fn filled(&self) -> ArrayVec<(u8, u8), 9> {
        let mut out = ArrayVec::new();
        for (y, row) in self.mask.iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                if v != 0 {
                    out.push((x as u8, y as u8));
                }
            }
        }
        out
    }

    pub fn block_count(&self) -> usize {
        self.filled().len()
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.id)
    }
}

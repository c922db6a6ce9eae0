use std::fmt;

use crate::error::MoveError;
use crate::piece::{Color, Piece};

/*
* Bitboard:
* Map each board cell to one of nine bits, row-major:
* index 0 -> bit 0, index 1 -> bit 1, index 2 -> bit 2, index 3 -> bit 3, ..., index 8 -> bit 8.
*
*   0 | 1 | 2
*   3 | 4 | 5
*   6 | 7 | 8
*/
const WINNING_MASKS: [u16; 8] = [
    0b000_000_111, // row 0
    0b000_111_000, // row 1
    0b111_000_000, // row 2
    0b001_001_001, // col 0
    0b010_010_010, // col 1
    0b100_100_100, // col 2
    0b100_010_001, // main diagonal
    0b001_010_100, // anti-diagonal
];

const FULL_MASK: u16 = 0b111_111_111;

/// Three cell indices forming a row, column or diagonal.
pub type WinningLine = [usize; 3];

/// The 3×3 grid. Each color owns a 9-bit occupancy mask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Board {
    red_mask: u16,
    blue_mask: u16,
}

impl Board {
    pub const CELLS: usize = 9;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pieces(pieces: &[Piece; Self::CELLS]) -> Self {
        let mut board = Self::new();
        for (index, piece) in pieces.iter().enumerate() {
            board.set(index, *piece);
        }
        board
    }

    pub fn cell_mask(index: usize) -> Result<u16, MoveError> {
        if index < Self::CELLS {
            Ok(1 << index)
        } else {
            Err(MoveError::CellOutOfRange(index))
        }
    }

    pub fn get(&self, index: usize) -> Piece {
        let Ok(cell) = Self::cell_mask(index) else {
            return Piece::Empty;
        };
        if self.red_mask & cell != 0 {
            Piece::Red
        } else if self.blue_mask & cell != 0 {
            Piece::Blue
        } else {
            Piece::Empty
        }
    }

    pub fn cell_is_free(&self, index: usize) -> bool {
        match Self::cell_mask(index) {
            Ok(cell) => (self.red_mask | self.blue_mask) & cell == 0,
            Err(_) => false,
        }
    }

    /// Marks an empty cell. A taken cell is an error and leaves the board untouched.
    pub fn place(&mut self, index: usize, color: Color) -> Result<(), MoveError> {
        let cell = Self::cell_mask(index)?;
        if !self.cell_is_free(index) {
            return Err(MoveError::Occupied(index));
        }
        match color {
            Color::Red => self.red_mask |= cell,
            Color::Blue => self.blue_mask |= cell,
        }
        Ok(())
    }

    /// Overwrites a cell without any rule checks. Out of range indices are ignored.
    pub fn set(&mut self, index: usize, piece: Piece) {
        let Ok(cell) = Self::cell_mask(index) else {
            return;
        };
        self.red_mask &= !cell;
        self.blue_mask &= !cell;
        match piece {
            Piece::Red => self.red_mask |= cell,
            Piece::Blue => self.blue_mask |= cell,
            Piece::Empty => {}
        }
    }

    pub fn pieces(&self) -> [Piece; Self::CELLS] {
        std::array::from_fn(|index| self.get(index))
    }

    /// First line, in fixed scan order, fully owned by a single color.
    pub fn winning_line(&self) -> Option<WinningLine> {
        WINNING_MASKS
            .iter()
            .find(|&&mask| (self.red_mask & mask) == mask || (self.blue_mask & mask) == mask)
            .map(|&mask| mask_to_line(mask))
    }

    pub fn is_full(&self) -> bool {
        (self.red_mask | self.blue_mask) == FULL_MASK
    }

    pub fn occupied(&self) -> u32 {
        (self.red_mask | self.blue_mask).count_ones()
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

fn mask_to_line(mask: u16) -> WinningLine {
    let mut line = [0; 3];
    let mut bits = (0..Board::CELLS).filter(|&index| mask & (1 << index) != 0);
    for slot in line.iter_mut() {
        *slot = bits.next().unwrap_or_default();
    }
    line
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            let cells: Vec<&str> = (0..3)
                .map(|col| match self.get(row * 3 + col) {
                    Piece::Red => "R",
                    Piece::Blue => "B",
                    Piece::Empty => ".",
                })
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

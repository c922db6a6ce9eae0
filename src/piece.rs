use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two seat colors. Seat 0 plays Red, seat 1 plays Blue.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
}

impl Color {
    /// Color allowed to move on `turn`: even turns are Red, odd turns are Blue.
    pub fn from_turn(turn: u32) -> Self {
        if turn % 2 == 0 { Color::Red } else { Color::Blue }
    }

    pub fn from_seat(seat: usize) -> Option<Self> {
        match seat {
            0 => Some(Color::Red),
            1 => Some(Color::Blue),
            _ => None,
        }
    }

    pub fn seat(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Blue => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "Red"),
            Color::Blue => write!(f, "Blue"),
        }
    }
}

/// State of a single cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Piece {
    Red,
    Blue,
    #[default]
    Empty,
}

impl Piece {
    pub fn color(self) -> Option<Color> {
        match self {
            Piece::Red => Some(Color::Red),
            Piece::Blue => Some(Color::Blue),
            Piece::Empty => None,
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, Piece::Empty)
    }
}

impl From<Color> for Piece {
    fn from(color: Color) -> Self {
        match color {
            Color::Red => Piece::Red,
            Color::Blue => Piece::Blue,
        }
    }
}

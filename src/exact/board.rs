//! Board states and decisions.
//!
//! A [`Board`] is a bitmask over the original tile positions: bit `i - 1` is
//! set when tile `i` is still standing. Flips use the same representation, so
//! removing a flip is a single mask operation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};
use crate::exact::config::MAX_BOARD_SIZE;

/// A subset of the tile set {1, ..., N}, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board(u32);

impl Board {
    /// The empty board (every tile flipped).
    pub const EMPTY: Board = Board(0);

    /// Board with all tiles 1..=n standing.
    ///
    /// # Errors
    /// Returns [`SolverError::InvalidState`] when `n` exceeds
    /// [`MAX_BOARD_SIZE`].
    pub fn full(n: u8) -> Result<Self> {
        check_size(n)?;
        Ok(Board(full_mask(n)))
    }

    /// Wrap a raw mask without validation.
    ///
    /// Use [`Board::checked`] when the mask comes from outside the crate.
    pub const fn from_mask(mask: u32) -> Self {
        Board(mask)
    }

    /// Wrap a raw mask, rejecting bits outside the tile set {1..=n}.
    pub fn checked(mask: u32, n: u8) -> Result<Self> {
        check_size(n)?;
        let board = Board(mask);
        if !board.is_subset_of(Board(full_mask(n))) {
            return Err(SolverError::InvalidState(format!(
                "mask {:#b} has tiles outside 1..={}",
                mask, n
            )));
        }
        Ok(board)
    }

    /// Build a board from tile values, validating them against {1..=n}.
    ///
    /// Zero, out-of-range and duplicate values are rejected.
    pub fn from_values(values: &[u8], n: u8) -> Result<Self> {
        crate::exact::codec::encode(values, n).map(Board)
    }

    /// Single-tile board.
    ///
    /// # Errors
    /// Tile values outside 1..=[`MAX_BOARD_SIZE`] are rejected.
    pub fn singleton(value: u8) -> Result<Self> {
        Ok(Board(tile_bit(value)?))
    }

    /// The raw bitmask.
    #[inline]
    pub const fn mask(self) -> u32 {
        self.0
    }

    /// Whether tile `value` is standing.
    #[inline]
    pub fn contains(self, value: u8) -> bool {
        value >= 1 && value <= 32 && self.0 & (1 << (value - 1)) != 0
    }

    /// Number of standing tiles.
    #[inline]
    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether every tile has been flipped.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sum of standing tile values.
    pub fn sum(self) -> u32 {
        self.values().map(u32::from).sum()
    }

    /// Whether every tile of `self` is also in `other`.
    #[inline]
    pub fn is_subset_of(self, other: Board) -> bool {
        self.0 & !other.0 == 0
    }

    /// Remove the tiles of `flip`.
    #[inline]
    pub fn without(self, flip: Board) -> Board {
        Board(self.0 & !flip.0)
    }

    /// Add tile `value`.
    ///
    /// # Errors
    /// Tile values outside 1..=[`MAX_BOARD_SIZE`] are rejected.
    pub fn with(self, value: u8) -> Result<Board> {
        Ok(Board(self.0 | tile_bit(value)?))
    }

    /// Standing tile values in ascending order.
    pub fn values(self) -> impl DoubleEndedIterator<Item = u8> {
        (1..=32u8).filter(move |&v| self.contains(v))
    }

    /// Standing tile values collected into a vector, ascending.
    pub fn to_vec(self) -> Vec<u8> {
        self.values().collect()
    }
}

fn check_size(n: u8) -> Result<()> {
    if n > MAX_BOARD_SIZE {
        return Err(SolverError::InvalidState(format!(
            "board size {} exceeds maximum {}",
            n, MAX_BOARD_SIZE
        )));
    }
    Ok(())
}

/// Mask of tiles 1..=n; `n` must already be checked.
fn full_mask(n: u8) -> u32 {
    ((1u64 << n) - 1) as u32
}

fn tile_bit(value: u8) -> Result<u32> {
    if value == 0 || value > MAX_BOARD_SIZE {
        return Err(SolverError::InvalidState(format!(
            "tile {} outside 1..={}",
            value, MAX_BOARD_SIZE
        )));
    }
    Ok(1 << (value - 1))
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.values().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "}}")
    }
}

/// What a player does after seeing a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Flip these tiles; their values sum to the roll.
    Flip(Board),
    /// Bank the current score and end the game.
    Stop,
}

impl Decision {
    /// The flipped tiles, or the empty board for `Stop`.
    pub fn flip(self) -> Board {
        match self {
            Decision::Flip(board) => board,
            Decision::Stop => Board::EMPTY,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Flip(board) => write!(f, "Flip {}", board),
            Decision::Stop => write!(f, "Stop"),
        }
    }
}

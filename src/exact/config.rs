//! Configuration options for the exact solver.
//!
//! This module provides the problem definition (tile count and dice) together
//! with validation, JSON loading and the statistics reported after a solve.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard upper bound on the number of tiles.
///
/// Board states are stored as `u32` bitmasks, and 2^20 memo entries is
/// already far beyond anything played in practice.
pub const MAX_BOARD_SIZE: u8 = 20;

/// Largest board that solves in seconds rather than minutes.
///
/// Larger boards are accepted but logged as a warning.
pub const RECOMMENDED_MAX_BOARD_SIZE: u8 = 16;

/// Configuration for the exact solver.
///
/// The three problem parameters fully determine `max_points` and the roll
/// distribution. The thread count only affects [`solve_parallel`].
///
/// # Example
/// ```
/// use shut_the_box_solver::exact::SolverConfig;
///
/// let config = SolverConfig::default();
/// assert_eq!(config.board_size, 9);
/// assert_eq!(config.max_points(), 45);
/// ```
///
/// [`solve_parallel`]: crate::exact::ExactSolver::solve_parallel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Number of tiles N; the tile set is {1, ..., N}.
    pub board_size: u8,

    /// Number of dice D rolled each turn.
    #[serde(default = "default_dice")]
    pub num_dice: u8,

    /// Number of sides S on every die.
    #[serde(default = "default_sides")]
    pub num_sides: u8,

    /// Number of worker threads for the parallel solve.
    ///
    /// Set to `None` to use the global rayon pool.
    #[serde(default)]
    pub num_threads: Option<usize>,
}

fn default_dice() -> u8 {
    2
}

fn default_sides() -> u8 {
    6
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::classic()
    }
}

impl SolverConfig {
    /// Create a new SolverConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// The classic game: nine tiles, two six-sided dice.
    pub fn classic() -> Self {
        Self {
            board_size: 9,
            num_dice: default_dice(),
            num_sides: default_sides(),
            num_threads: None,
        }
    }

    /// Two tiles and a single three-sided die.
    ///
    /// Small enough to work out by hand, which makes it the standard
    /// regression fixture.
    pub fn tiny() -> Self {
        Self {
            board_size: 2,
            num_dice: 1,
            num_sides: 3,
            num_threads: None,
        }
    }

    /// Builder method: set the number of tiles.
    pub fn with_board_size(mut self, board_size: u8) -> Self {
        self.board_size = board_size;
        self
    }

    /// Builder method: set the number of dice.
    pub fn with_dice(mut self, num_dice: u8) -> Self {
        self.num_dice = num_dice;
        self
    }

    /// Builder method: set the number of sides per die.
    pub fn with_sides(mut self, num_sides: u8) -> Self {
        self.num_sides = num_sides;
        self
    }

    /// Builder method: set number of threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Score for shutting the box: `N(N+1)/2`.
    pub fn max_points(&self) -> u32 {
        let n = self.board_size as u32;
        n * (n + 1) / 2
    }

    /// Number of distinct board states, `2^N`.
    pub fn num_states(&self) -> usize {
        1usize << self.board_size
    }

    /// Smallest and largest achievable roll, `D` and `D*S`.
    pub fn roll_range(&self) -> (u32, u32) {
        let d = self.num_dice as u32;
        (d, d * self.num_sides as u32)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any errors.
    ///
    /// Capacity problems are reported here, before any state is allocated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_size == 0 {
            return Err(ConfigError::InvalidBoardSize(self.board_size));
        }

        if self.board_size > MAX_BOARD_SIZE {
            return Err(ConfigError::BoardTooLarge {
                size: self.board_size,
                max: MAX_BOARD_SIZE,
            });
        }

        if self.num_dice == 0 {
            return Err(ConfigError::InvalidDice(self.num_dice));
        }

        if self.num_sides == 0 {
            return Err(ConfigError::InvalidSides(self.num_sides));
        }

        if (self.num_sides as u64)
            .checked_pow(self.num_dice as u32)
            .is_none()
        {
            return Err(ConfigError::TooManyOutcomes {
                dice: self.num_dice,
                sides: self.num_sides,
            });
        }

        if self.num_threads == Some(0) {
            return Err(ConfigError::InvalidThreads);
        }

        Ok(())
    }
}

/// Errors that can occur when validating or loading solver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The board must hold at least one tile.
    #[error("Board size {0} is invalid; at least one tile is required")]
    InvalidBoardSize(u8),

    /// The board exceeds what the bitmask representation can hold.
    #[error("Board size {size} exceeds the supported maximum of {max} tiles")]
    BoardTooLarge {
        /// Requested board size.
        size: u8,
        /// Largest supported board size.
        max: u8,
    },

    /// At least one die must be rolled.
    #[error("Dice count {0} is invalid; at least one die is required")]
    InvalidDice(u8),

    /// Dice must have at least one side.
    #[error("Side count {0} is invalid; dice need at least one side")]
    InvalidSides(u8),

    /// `sides^dice` does not fit in the outcome counter.
    #[error("{dice} dice with {sides} sides have too many outcomes to enumerate")]
    TooManyOutcomes {
        /// Number of dice.
        dice: u8,
        /// Sides per die.
        sides: u8,
    },

    /// An explicit thread count of zero.
    #[error("Thread count must be at least 1")]
    InvalidThreads,

    /// The configuration file could not be read.
    #[error("Failed to read config: {0}")]
    IoError(String),

    /// The configuration file is not valid JSON for this struct.
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Statistics reported after a solve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveStats {
    /// Expected optimal score from the full board.
    pub root_value: f64,

    /// Number of distinct board states memoized.
    pub states: usize,

    /// Number of cardinality levels evaluated.
    pub levels: usize,

    /// Whether the level-parallel solver was used.
    pub parallel: bool,

    /// Number of `(available, target)` pairs held by the combination cache.
    pub cached_combinations: usize,

    /// Total time spent solving (in seconds).
    pub elapsed_seconds: f64,

    /// States evaluated per second.
    pub states_per_second: f64,
}

impl SolveStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update states per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.states_per_second = self.states as f64 / self.elapsed_seconds;
        }
    }
}

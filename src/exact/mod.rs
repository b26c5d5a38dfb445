//! Exact solver module.
//!
//! This module computes, for every board of a shut-the-box game, the exact
//! expected final score under optimal flipping and stopping decisions.
//!
//! # Overview
//!
//! The solver is built leaf-first from small pieces:
//! 1. [`codec`]: bijection between tile subsets and dense integer indices
//! 2. [`combinations`]: every group of standing tiles summing to a roll
//! 3. [`distribution`]: exact probability of each dice sum
//! 4. [`storage`]: write-once memo store keyed by board bitmask
//! 5. [`solver`]: the memoized expectimax-with-stopping recursion
//!
//! # Example
//!
//! ```
//! use shut_the_box_solver::exact::{Board, ExactSolver, SolverConfig};
//!
//! let solver = ExactSolver::new(SolverConfig::classic()).unwrap();
//! let full = solver.full_board();
//! let value = solver.expected_value(full).unwrap();
//! println!("Expected score from the opening board: {:.4}", value);
//!
//! // what to do after rolling a 7 on the opening board
//! let decision = solver.decide(full, 7).unwrap();
//! println!("{}", decision);
//! ```
//!
//! # Stopping rule
//!
//! After each roll the player may bank the current score even when a legal
//! flip exists. The value of every roll is therefore the maximum of the stop
//! value and the best continuation, never a forced flip.

pub mod board;
pub mod codec;
pub mod combinations;
pub mod config;
pub mod distribution;
pub mod output;
pub mod solver;
pub mod storage;

// Re-export main types for convenient access
pub use board::{Board, Decision};
pub use codec::{decode, encode};
pub use combinations::{combinations_summing_to, CombinationCache};
pub use config::{ConfigError, SolveStats, SolverConfig, MAX_BOARD_SIZE, RECOMMENDED_MAX_BOARD_SIZE};
pub use distribution::RollDistribution;
pub use output::SolutionOutput;
pub use solver::{ExactSolver, SolverState};
pub use storage::{MemoStore, StorageExport};

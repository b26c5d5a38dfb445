//! # Shut the Box Solver
//!
//! Exact expected-value solver for the single-player dice game *shut the box*
//! (Klappbrett): tiles 1..N stand in a row, each turn the dice are rolled and
//! the player flips a group of standing tiles whose values sum to the roll, or
//! stops. The score is the total value of flipped tiles.
//!
//! ## Features
//!
//! - **Exact Solver**: expected optimal score for every board, memoized over
//!   all `2^N` subsets
//! - **Optimal Stopping**: banking the current score is always an option
//! - **Parallel Solve**: boards of equal size are evaluated concurrently
//! - **Play Environment**: seeded game loop with baseline and exact policies
//! - **Export**: JSON snapshots of the memo store and the full solution
//!
//! ## Quick Start
//!
//! ```
//! use shut_the_box_solver::exact::{ExactSolver, SolverConfig};
//!
//! let mut solver = ExactSolver::new(SolverConfig::classic()).unwrap();
//! let stats = solver.solve();
//! println!("Expected score: {:.4} ({} states)", stats.root_value, stats.states);
//! ```
//!
//! ## Modules
//!
//! - [`exact`]: Board codec, combination enumerator, dice distribution and solver
//! - [`play`]: Game environment, policies and Monte Carlo evaluation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Exact Solver                             │
//! │  - Memoized expectimax     - Level-parallel solve               │
//! │  - Optimal stopping        - Snapshot / export                  │
//! └─────────────────────────────────────────────────────────────────┘
//!          │                    │                     │
//!          ▼                    ▼                     ▼
//!    ┌───────────┐       ┌─────────────┐       ┌────────────┐
//!    │ Bit Codec │       │ Combination │       │    Roll    │
//!    │           │       │ Enumerator  │       │Distribution│
//!    └───────────┘       └─────────────┘       └────────────┘
//!                               ▲
//!                               │ decide(state, roll)
//!                        ┌─────────────┐
//!                        │ Environment │
//!                        │ + Policies  │
//!                        └─────────────┘
//! ```

#![warn(missing_docs)]

/// Crate error types.
pub mod error;

/// Exact solver module.
///
/// This is the core module containing the memoized expected-value solver.
pub mod exact;

/// Play module.
///
/// Contains the game environment, heuristic and exact policies, and the
/// Monte Carlo policy evaluator.
pub mod play;

// Re-export commonly used types at crate root for convenience
pub use error::{Result, SolverError};
pub use exact::{Board, Decision, ExactSolver, RollDistribution, SolveStats, SolverConfig};
pub use play::{Policy, ShutTheBox, SimulationSummary};

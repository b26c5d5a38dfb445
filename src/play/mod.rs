//! Live play on top of the exact solver.
//!
//! - [`env`]: the game environment (`reset` / `step`)
//! - [`policy`]: the [`Policy`] trait, three baselines and the exact policy
//! - [`simulate`](mod@simulate): parallel Monte Carlo evaluation of a policy
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use shut_the_box_solver::exact::{ExactSolver, SolverConfig};
//! use shut_the_box_solver::play::{simulate, ExactPolicy};
//!
//! let config = SolverConfig::classic();
//! let solver = Arc::new(ExactSolver::new(config.clone()).unwrap());
//! let summary = simulate(&config, 1000, 42, |_| {
//!     Box::new(ExactPolicy::new(Arc::clone(&solver)))
//! })
//! .unwrap();
//! println!("mean score {:.3}", summary.mean_score);
//! ```

pub mod env;
pub mod policy;
pub mod simulate;

pub use env::{Observation, ShutTheBox, StepInfo, StepResult};
pub use policy::{
    is_legal, ExactPolicy, LargestNumberPolicy, Policy, PolicyKind, RandomPolicy,
    SmallestNumberPolicy,
};
pub use simulate::{play_episode, simulate, simulate_with_callback, EpisodeResult, SimulationSummary};

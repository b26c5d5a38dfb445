//! Game environment for live play.
//!
//! The environment is a small state machine: [`ShutTheBox::reset`] starts an
//! episode with a fresh roll, and [`ShutTheBox::step`] applies one decision.
//! A flip that matches the roll removes its tiles and rolls again; anything
//! else (stopping, a wrong sum, tiles that are not standing) ends the episode
//! and pays out the current score.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};
use crate::exact::board::{Board, Decision};
use crate::exact::combinations::CombinationCache;
use crate::exact::config::SolverConfig;
use crate::exact::distribution::RollDistribution;

/// What the player sees before deciding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Tiles still standing.
    pub board: Board,
    /// Current dice sum.
    pub roll: u32,
    /// Every legal flip for this roll, ascending by mask.
    pub flips: Vec<Board>,
}

/// Bookkeeping reported alongside every observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Score if the episode ended now.
    pub score: u32,
    /// Number of successful flips so far.
    pub flips: u32,
}

/// Result of one environment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Observation after the step.
    pub observation: Observation,
    /// Final score when the episode terminated, zero otherwise.
    pub reward: f64,
    /// Whether the episode is over.
    pub terminated: bool,
    /// Score and flip count after the step.
    pub info: StepInfo,
}

/// The shut-the-box environment.
#[derive(Debug, Clone)]
pub struct ShutTheBox {
    config: SolverConfig,
    distribution: RollDistribution,
    combinations: std::sync::Arc<CombinationCache>,
    rng: StdRng,
    full: Board,
    board: Board,
    roll: u32,
    flips: u32,
    terminated: bool,
}

impl ShutTheBox {
    /// Create an environment for the given tile set and dice.
    ///
    /// The episode starts terminated; call [`reset`](Self::reset) first.
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        let distribution = RollDistribution::from_config(&config)?;
        let full = Board::full(config.board_size)?;
        Ok(Self {
            full,
            board: full,
            config,
            distribution,
            combinations: std::sync::Arc::new(CombinationCache::new()),
            rng: StdRng::from_entropy(),
            roll: 0,
            flips: 0,
            terminated: true,
        })
    }

    /// Start a new episode with every tile standing and a fresh roll.
    ///
    /// With a seed the episode's rolls are reproducible.
    pub fn reset(&mut self, seed: Option<u64>) -> (Observation, StepInfo) {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.board = self.full;
        self.roll = self.distribution.sample(&mut self.rng);
        self.flips = 0;
        self.terminated = false;
        (self.observation(), self.info())
    }

    /// Apply a decision.
    ///
    /// # Errors
    /// Returns [`SolverError::InvalidState`] when called on a terminated
    /// episode. Illegal flips are not errors: they end the episode.
    pub fn step(&mut self, decision: Decision) -> Result<StepResult> {
        if self.terminated {
            return Err(SolverError::InvalidState(
                "episode has terminated; call reset".to_string(),
            ));
        }

        let flip = decision.flip();
        let legal = !flip.is_empty()
            && flip.is_subset_of(self.board)
            && flip.sum() == self.roll;

        if legal {
            self.board = self.board.without(flip);
            self.flips += 1;
            if self.board.is_empty() {
                self.terminated = true;
            } else {
                self.roll = self.distribution.sample(&mut self.rng);
            }
        } else {
            self.terminated = true;
        }

        let reward = if self.terminated {
            self.score() as f64
        } else {
            0.0
        };

        Ok(StepResult {
            observation: self.observation(),
            reward,
            terminated: self.terminated,
            info: self.info(),
        })
    }

    /// Current observation.
    pub fn observation(&self) -> Observation {
        Observation {
            board: self.board,
            roll: self.roll,
            flips: self.combinations.get(self.board, self.roll),
        }
    }

    /// Score if the episode ended now.
    pub fn score(&self) -> u32 {
        self.config.max_points() - self.board.sum()
    }

    /// Tiles still standing.
    pub fn board(&self) -> Board {
        self.board
    }

    /// Current dice sum.
    pub fn roll(&self) -> u32 {
        self.roll
    }

    /// Whether the current episode is over.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn info(&self) -> StepInfo {
        StepInfo {
            score: self.score(),
            flips: self.flips,
        }
    }
}

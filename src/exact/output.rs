//! Solution output and export utilities.
//!
//! Exports the solved value table (and optionally the optimal decision for
//! every board and roll) to JSON for downstream analysis.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::exact::board::{Board, Decision};
use crate::exact::solver::ExactSolver;

/// Value entry for a single board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEntry {
    /// Codec index of the board.
    pub index: u32,
    /// Standing tiles, ascending.
    pub tiles: Vec<u8>,
    /// Expected optimal final score.
    pub expected_value: f64,
    /// Score for stopping now.
    pub stop_value: f64,
}

/// Optimal decision for one board and roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyEntry {
    /// Codec index of the board.
    pub index: u32,
    /// Dice sum.
    pub roll: u32,
    /// Tiles to flip, or `None` to stop.
    pub flip: Option<Vec<u8>>,
}

/// Solution metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionMetadata {
    /// Number of tiles.
    pub board_size: u8,
    /// Number of dice.
    pub num_dice: u8,
    /// Sides per die.
    pub num_sides: u8,
    /// Score for shutting the box.
    pub max_points: u32,
    /// Expected optimal score from the full board.
    pub root_value: f64,
    /// Number of boards in the table.
    pub num_states: usize,
}

/// Complete solver output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionOutput {
    /// Solver metadata
    pub metadata: SolutionMetadata,
    /// Board values, ascending by index
    pub states: Vec<StateEntry>,
    /// Optimal decisions (empty unless requested)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy: Vec<PolicyEntry>,
}

impl SolutionOutput {
    /// Create output from a solver.
    ///
    /// Every board of the tile set is included; boards not yet memoized are
    /// solved on the way.
    pub fn from_solver(solver: &ExactSolver, include_policy: bool) -> Result<Self> {
        let config = solver.config();
        let mut states = Vec::with_capacity(config.num_states());
        let mut policy = Vec::new();

        for index in 0..config.num_states() as u32 {
            let board = Board::checked(index, config.board_size)?;
            states.push(StateEntry {
                index,
                tiles: board.to_vec(),
                expected_value: solver.expected_value(board)?,
                stop_value: solver.stop_value(board),
            });

            if include_policy && !board.is_empty() {
                for roll in solver.distribution().support() {
                    let flip = match solver.decide(board, roll)? {
                        Decision::Flip(flip) => Some(flip.to_vec()),
                        Decision::Stop => None,
                    };
                    policy.push(PolicyEntry { index, roll, flip });
                }
            }
        }

        Ok(Self {
            metadata: SolutionMetadata {
                board_size: config.board_size,
                num_dice: config.num_dice,
                num_sides: config.num_sides,
                max_points: config.max_points(),
                root_value: solver.root_value(),
                num_states: states.len(),
            },
            states,
            policy,
        })
    }

    /// Save to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Get the entry for a board.
    pub fn get_state(&self, board: Board) -> Option<&StateEntry> {
        self.states.get(board.mask() as usize)
    }

    /// Boards where stopping immediately is optimal for every roll,
    /// i.e. whose value equals their stop value.
    pub fn dead_states(&self) -> Vec<&StateEntry> {
        self.states
            .iter()
            .filter(|s| s.expected_value == s.stop_value)
            .collect()
    }
}

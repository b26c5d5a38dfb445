//! Exact expected-value solver.
//!
//! The value of a board is the expected final score under optimal play, where
//! after every roll the player may flip any group of standing tiles summing to
//! the roll or bank the current score:
//!
//! ```text
//! V(∅)     = max_points
//! V(state) = Σ_r P(r) · max(stop(state), max_{c ∈ flips(state, r)} V(state \ c))
//! stop(s)  = max_points − sum(s)
//! ```
//!
//! Every flip removes at least one tile, so `V(state)` depends only on boards
//! with strictly fewer tiles. The solver exploits this three ways: on-demand
//! recursion with memoization ([`ExactSolver::expected_value`]), a full solve
//! in cardinality order ([`ExactSolver::solve`]) and a level-parallel solve
//! where each level is a rayon batch ([`ExactSolver::solve_parallel`]).

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};
use crate::exact::board::{Board, Decision};
use crate::exact::combinations::CombinationCache;
use crate::exact::config::{SolveStats, SolverConfig, RECOMMENDED_MAX_BOARD_SIZE};
use crate::exact::distribution::RollDistribution;
use crate::exact::storage::{MemoStore, StorageExport};

/// The exact solver.
///
/// Holds the immutable problem definition together with the memo store and
/// the combination cache. All queries take `&self`; the memo store is filled
/// lazily and every entry is written once.
///
/// # Example
/// ```
/// use shut_the_box_solver::exact::{ExactSolver, SolverConfig};
///
/// let mut solver = ExactSolver::new(SolverConfig::classic()).unwrap();
/// let stats = solver.solve();
/// assert_eq!(stats.states, 512);
/// assert!(stats.root_value > 0.0 && stats.root_value < 45.0);
/// ```
pub struct ExactSolver {
    /// Problem definition.
    config: SolverConfig,

    /// Probability of every roll.
    distribution: RollDistribution,

    /// Solved board values.
    storage: MemoStore,

    /// Flip enumerations per `(board, roll)`.
    combinations: CombinationCache,

    /// Board with every tile standing.
    full: Board,

    /// Statistics of the last full solve.
    stats: SolveStats,
}

impl ExactSolver {
    /// Create a solver, validating the configuration up front.
    ///
    /// # Errors
    /// Returns [`SolverError::Config`] for empty or oversized boards and
    /// degenerate dice, before any memory is reserved.
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;

        if config.board_size > RECOMMENDED_MAX_BOARD_SIZE {
            warn!(
                "Board size {} exceeds the recommended maximum of {}; {} states will be memoized",
                config.board_size,
                RECOMMENDED_MAX_BOARD_SIZE,
                config.num_states()
            );
        }

        let distribution = RollDistribution::from_config(&config)?;
        let full = Board::full(config.board_size)?;

        Ok(Self {
            storage: MemoStore::with_capacity(config.num_states()),
            config,
            distribution,
            combinations: CombinationCache::new(),
            full,
            stats: SolveStats::new(),
        })
    }

    /// Score for ending the game now: `max_points − sum(state)`.
    pub fn stop_value(&self, state: Board) -> f64 {
        (self.config.max_points() - state.sum()) as f64
    }

    /// Score for shutting the box.
    pub fn max_points(&self) -> f64 {
        self.config.max_points() as f64
    }

    /// Board with every tile standing.
    pub fn full_board(&self) -> Board {
        self.full
    }

    /// Expected optimal final score from `state`.
    ///
    /// # Errors
    /// Returns [`SolverError::InvalidState`] if the board has tiles outside
    /// the configured tile set.
    pub fn expected_value(&self, state: Board) -> Result<f64> {
        let state = self.check_board(state)?;
        Ok(self.value_of(state))
    }

    /// Expected optimal final score for the board with the given tiles standing.
    ///
    /// # Errors
    /// Zero, duplicate and out-of-range values are rejected.
    pub fn expected_value_of(&self, values: &[u8]) -> Result<f64> {
        let state = Board::from_values(values, self.config.board_size)?;
        Ok(self.value_of(state))
    }

    /// Expected optimal final score from the full board.
    pub fn root_value(&self) -> f64 {
        self.value_of(self.full)
    }

    /// Every legal flip for `roll` with its continuation value, best first.
    ///
    /// Ties are broken by ascending mask so the order is deterministic.
    /// A roll the dice cannot produce has no flips.
    pub fn ranked_flips(&self, state: Board, roll: u32) -> Result<Vec<(Board, f64)>> {
        let state = self.check_board(state)?;
        if !self.distribution.support().contains(&roll) {
            return Ok(Vec::new());
        }
        let mut ranked: Vec<(Board, f64)> = self
            .flips(state, roll)
            .into_iter()
            .map(|flip| (flip, self.value_of(state.without(flip))))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(ranked)
    }

    /// Optimal decision for `state` after rolling `roll`.
    ///
    /// Flips the group with the highest continuation value, unless no group
    /// sums to the roll or the best continuation is no better than banking.
    pub fn decide(&self, state: Board, roll: u32) -> Result<Decision> {
        let stop = self.stop_value(self.check_board(state)?);
        let decision = match self.ranked_flips(state, roll)?.first() {
            Some(&(flip, value)) if value > stop => Decision::Flip(flip),
            _ => Decision::Stop,
        };
        Ok(decision)
    }

    /// Legal flips of `state` for `roll` (cached).
    pub fn flips(&self, state: Board, roll: u32) -> Vec<Board> {
        self.combinations.get(state, roll)
    }

    /// Solve every board in non-decreasing cardinality order.
    ///
    /// After this call the memo store holds all `2^N` boards.
    pub fn solve(&mut self) -> &SolveStats {
        let start_time = Instant::now();
        info!(
            "Solving {} tiles with {}d{} ({} states)",
            self.config.board_size,
            self.config.num_dice,
            self.config.num_sides,
            self.config.num_states()
        );

        let levels = boards_by_cardinality(self.config.board_size);
        for (k, level) in levels.iter().enumerate() {
            for &state in level {
                self.value_of(state);
            }
            debug!("Level {} done: {} boards", k, level.len());
        }

        self.finish(start_time, levels.len(), false)
    }

    /// Solve every board, evaluating each cardinality level in parallel.
    ///
    /// Boards of one level only read values of smaller levels, which are
    /// complete by the time the level starts. Each level's results are
    /// written in one batch after the level finishes. The values are
    /// bit-identical to [`solve`](Self::solve).
    ///
    /// # Errors
    /// Fails only if a dedicated pool for `num_threads` cannot be built.
    pub fn solve_parallel(&mut self) -> Result<&SolveStats> {
        let start_time = Instant::now();
        info!(
            "Solving {} tiles with {}d{} ({} states) in parallel",
            self.config.board_size,
            self.config.num_dice,
            self.config.num_sides,
            self.config.num_states()
        );

        let levels = boards_by_cardinality(self.config.board_size);
        let this = &*self;
        let run = || {
            for (k, level) in levels.iter().enumerate() {
                let results: Vec<(Board, f64)> = level
                    .par_iter()
                    .map(|&state| (state, this.evaluate(state)))
                    .collect();
                let written = this.storage.insert_batch(&results);
                debug!("Level {} done: {} boards ({} new)", k, level.len(), written);
            }
        };

        match self.config.num_threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?
                .install(run),
            None => run(),
        }

        Ok(self.finish(start_time, levels.len(), true))
    }

    /// Memoized value lookup; the board must already be validated.
    fn value_of(&self, state: Board) -> f64 {
        if let Some(value) = self.storage.get(state) {
            return value;
        }
        let value = self.evaluate(state);
        self.storage.insert(state, value);
        value
    }

    /// One application of the expectimax-with-stopping recurrence.
    fn evaluate(&self, state: Board) -> f64 {
        if state.is_empty() {
            return self.max_points();
        }

        // Σ outcomes(r) · best(r) / S^D; a board with no flip for any roll
        // evaluates to exactly its stop value
        let stop = self.stop_value(state);
        let weighted: f64 = self
            .distribution
            .iter_outcomes()
            .map(|(roll, outcomes)| {
                let best = self
                    .flips(state, roll)
                    .into_iter()
                    .map(|flip| self.value_of(state.without(flip)))
                    .fold(stop, f64::max);
                outcomes as f64 * best
            })
            .sum();
        weighted / self.distribution.total_outcomes() as f64
    }

    fn check_board(&self, state: Board) -> Result<Board> {
        Board::checked(state.mask(), self.config.board_size)
    }

    fn finish(&mut self, start_time: Instant, levels: usize, parallel: bool) -> &SolveStats {
        self.stats.root_value = self.root_value();
        self.stats.states = self.storage.len();
        self.stats.levels = levels;
        self.stats.parallel = parallel;
        self.stats.cached_combinations = self.combinations.len();
        self.stats.elapsed_seconds = start_time.elapsed().as_secs_f64();
        self.stats.update_rate();

        info!(
            "Solved: expected score {:.6} over {} states in {:.3}s",
            self.stats.root_value, self.stats.states, self.stats.elapsed_seconds
        );
        debug!(
            "Combination cache: {} entries, {:.1}% hit rate",
            self.combinations.len(),
            self.combinations.hit_rate() * 100.0
        );

        &self.stats
    }

    /// Get the number of boards memoized so far.
    pub fn num_states(&self) -> usize {
        self.storage.len()
    }

    /// Get statistics of the last full solve.
    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    /// Get reference to the memo store for analysis.
    pub fn storage(&self) -> &MemoStore {
        &self.storage
    }

    /// Get reference to the roll distribution.
    pub fn distribution(&self) -> &RollDistribution {
        &self.distribution
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Export solver state for snapshotting.
    pub fn export_state(&self) -> SolverState {
        SolverState {
            config: self.config.clone(),
            storage: self.storage.export(),
            stats: self.stats.clone(),
        }
    }

    /// Import solver state from a snapshot.
    ///
    /// # Errors
    /// Rejects snapshots taken for a different tile set or dice, and
    /// snapshots containing boards outside the tile set.
    pub fn import_state(&mut self, state: SolverState) -> Result<()> {
        let same_problem = state.config.board_size == self.config.board_size
            && state.config.num_dice == self.config.num_dice
            && state.config.num_sides == self.config.num_sides;
        if !same_problem {
            return Err(SolverError::SnapshotMismatch(format!(
                "snapshot is for {} tiles with {}d{}, solver is for {} tiles with {}d{}",
                state.config.board_size,
                state.config.num_dice,
                state.config.num_sides,
                self.config.board_size,
                self.config.num_dice,
                self.config.num_sides
            )));
        }

        for &(mask, _) in &state.storage.entries {
            Board::checked(mask, self.config.board_size)?;
        }

        self.storage.import(state.storage);
        self.stats = state.stats;
        Ok(())
    }

    /// Reset the solver to initial state.
    pub fn reset(&mut self) {
        self.storage.clear();
        self.combinations.clear();
        self.stats = SolveStats::new();
    }
}

/// All boards over `n` tiles grouped by number of standing tiles.
///
/// Within a level boards are ordered by ascending mask.
pub fn boards_by_cardinality(n: u8) -> Vec<Vec<Board>> {
    let mut levels = vec![Vec::new(); n as usize + 1];
    for mask in 0..(1u32 << n) {
        levels[mask.count_ones() as usize].push(Board::from_mask(mask));
    }
    levels
}

/// Serializable solver state for snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverState {
    /// Problem definition the values belong to.
    pub config: SolverConfig,
    /// Storage export.
    pub storage: StorageExport,
    /// Statistics.
    pub stats: SolveStats,
}

impl SolverState {
    /// Save to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Load from JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn tiny() -> ExactSolver {
        ExactSolver::new(SolverConfig::tiny()).unwrap()
    }

    #[test]
    fn test_empty_board_is_max_points() {
        let solver = ExactSolver::new(SolverConfig::classic()).unwrap();
        assert_eq!(solver.expected_value(Board::EMPTY).unwrap(), 45.0);
        assert_eq!(solver.stop_value(Board::EMPTY), 45.0);
    }

    #[test]
    fn test_tiny_board_by_hand() {
        // Two tiles, one three-sided die, max_points = 3.
        //
        // {1}:   roll 1 flips to ∅ (3), rolls 2 and 3 stop at 2      -> 7/3
        // {2}:   roll 2 flips to ∅ (3), rolls 1 and 3 stop at 1      -> 5/3
        // {1,2}: roll 1 -> {2} (5/3), roll 2 -> {1} (7/3), roll 3 -> ∅ (3)
        //        stop is 0, so the value is (5/3 + 7/3 + 3) / 3       -> 7/3
        let solver = tiny();

        let one = solver.expected_value_of(&[1]).unwrap();
        let two = solver.expected_value_of(&[2]).unwrap();
        let both = solver.expected_value_of(&[1, 2]).unwrap();

        assert!((one - 7.0 / 3.0).abs() < EPS, "V({{1}}) = {}", one);
        assert!((two - 5.0 / 3.0).abs() < EPS, "V({{2}}) = {}", two);
        assert!((both - 7.0 / 3.0).abs() < EPS, "V({{1,2}}) = {}", both);

        let recomposed = (two + one + solver.max_points()) / 3.0;
        assert!((both - recomposed).abs() < EPS);
    }

    #[test]
    fn test_three_tile_board() {
        // 1d3 on {1,2,3} after rolling 3: flipping {3} leaves {1,2}, while
        // flipping {1,2} leaves {3}.
        let solver = ExactSolver::new(SolverConfig::tiny().with_board_size(3)).unwrap();
        let board = Board::full(3).unwrap();

        let ranked = solver.ranked_flips(board, 3).unwrap();
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].1 >= ranked[1].1);

        // From {3} alone every non-3 roll is a forced stop at 3.
        let three = solver.expected_value_of(&[3]).unwrap();
        assert!((three - (6.0 + 3.0 + 3.0) / 3.0).abs() < EPS);
    }

    #[test]
    fn test_solve_classic_fills_every_state() {
        let mut solver = ExactSolver::new(SolverConfig::classic()).unwrap();
        let stats = solver.solve().clone();

        assert_eq!(stats.states, 512);
        assert_eq!(stats.levels, 10);
        assert!(!stats.parallel);
        assert_eq!(stats.root_value, solver.root_value());
        assert!(stats.root_value > 0.0 && stats.root_value < 45.0);
    }

    #[test]
    fn test_never_worse_than_stopping() {
        let mut solver = ExactSolver::new(SolverConfig::classic()).unwrap();
        solver.solve();
        for mask in 0..512u32 {
            let board = Board::from_mask(mask);
            let value = solver.expected_value(board).unwrap();
            assert!(value >= solver.stop_value(board), "board {}", board);
            assert!(value <= solver.max_points());
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut sequential = ExactSolver::new(SolverConfig::classic()).unwrap();
        sequential.solve();

        let mut parallel = ExactSolver::new(SolverConfig::classic().with_threads(4)).unwrap();
        let stats = parallel.solve_parallel().unwrap().clone();
        assert!(stats.parallel);
        assert_eq!(stats.states, 512);

        for mask in 0..512u32 {
            let board = Board::from_mask(mask);
            assert_eq!(
                sequential.expected_value(board).unwrap().to_bits(),
                parallel.expected_value(board).unwrap().to_bits(),
                "board {}",
                board
            );
        }
    }

    #[test]
    fn test_on_demand_matches_full_solve() {
        let lazy = ExactSolver::new(SolverConfig::classic()).unwrap();
        let root = lazy.root_value();
        // only boards reachable from the full board are visited
        assert!(lazy.num_states() < 512);

        let mut full = ExactSolver::new(SolverConfig::classic()).unwrap();
        full.solve();
        assert_eq!(root.to_bits(), full.root_value().to_bits());
    }

    #[test]
    fn test_reset_reproduces_values() {
        let mut solver = ExactSolver::new(SolverConfig::classic()).unwrap();
        let first = solver.solve().root_value;
        solver.reset();
        assert_eq!(solver.num_states(), 0);
        let second = solver.solve().root_value;
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(
            solver.expected_value(Board::full(9).unwrap()).unwrap().to_bits(),
            first.to_bits()
        );
    }

    #[test]
    fn test_invalid_states_fail_fast() {
        let solver = ExactSolver::new(SolverConfig::classic()).unwrap();
        assert!(matches!(
            solver.expected_value(Board::from_mask(1 << 9)),
            Err(SolverError::InvalidState(_))
        ));
        assert!(solver.expected_value_of(&[0, 3]).is_err());
        assert!(solver.expected_value_of(&[3, 3]).is_err());
        assert!(solver.expected_value_of(&[10]).is_err());
        assert!(solver.decide(Board::from_mask(1 << 12), 7).is_err());
    }

    #[test]
    fn test_invalid_config_rejected_before_solving() {
        assert!(ExactSolver::new(SolverConfig::new().with_board_size(25)).is_err());
        assert!(ExactSolver::new(SolverConfig::new().with_dice(0)).is_err());
    }

    #[test]
    fn test_decide() {
        let solver = ExactSolver::new(SolverConfig::classic()).unwrap();

        // no tile group sums to 2 on {5, 6}
        let board = Board::from_values(&[5, 6], 9).unwrap();
        assert_eq!(solver.decide(board, 2).unwrap(), Decision::Stop);

        // the only flip shuts the box, which always beats banking
        assert_eq!(
            solver.decide(board, 11).unwrap(),
            Decision::Flip(board)
        );

        // the decision is the top of the ranking
        let full = Board::full(9).unwrap();
        let ranked = solver.ranked_flips(full, 7).unwrap();
        assert_eq!(ranked.len(), 5);
        assert_eq!(solver.decide(full, 7).unwrap(), Decision::Flip(ranked[0].0));
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_impossible_roll_has_no_flips() {
        let solver = ExactSolver::new(SolverConfig::classic()).unwrap();
        let full = Board::full(9).unwrap();

        // 2d6 never shows 1 or 13, though tile groups sum to both
        for roll in [0, 1, 13, 40] {
            assert!(solver.ranked_flips(full, roll).unwrap().is_empty());
            assert_eq!(solver.decide(full, roll).unwrap(), Decision::Stop);
        }
        assert!(!solver.ranked_flips(full, 12).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut solver = tiny();
        solver.solve();
        let snapshot = solver.export_state();

        let mut restored = tiny();
        restored.import_state(snapshot.clone()).unwrap();
        assert_eq!(restored.num_states(), 4);
        assert_eq!(
            restored.storage().get(Board::full(2).unwrap()),
            solver.storage().get(Board::full(2).unwrap())
        );

        let mut other = ExactSolver::new(SolverConfig::classic()).unwrap();
        assert!(matches!(
            other.import_state(snapshot),
            Err(SolverError::SnapshotMismatch(_))
        ));
    }

    #[test]
    fn test_boards_by_cardinality() {
        let levels = boards_by_cardinality(4);
        let sizes: Vec<usize> = levels.iter().map(|l| l.len()).collect();
        assert_eq!(sizes, vec![1, 4, 6, 4, 1]);
        for (k, level) in levels.iter().enumerate() {
            assert!(level.iter().all(|b| b.len() as usize == k));
        }
    }
}

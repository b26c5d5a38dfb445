//! Property-based tests for the codec, enumerator, distribution and solver.

use std::sync::OnceLock;

use approx::assert_abs_diff_eq;
use proptest::prelude::*;

use shut_the_box_solver::exact::codec::{decode, encode, from_flags, to_flags};
use shut_the_box_solver::exact::{
    combinations_summing_to, Board, Decision, ExactSolver, RollDistribution, SolverConfig,
};
use shut_the_box_solver::play::ShutTheBox;

fn classic() -> &'static ExactSolver {
    static SOLVER: OnceLock<ExactSolver> = OnceLock::new();
    SOLVER.get_or_init(|| {
        let mut solver = ExactSolver::new(SolverConfig::classic()).unwrap();
        solver.solve();
        solver
    })
}

/// Strategy: a tile count and a board over it.
fn board_strategy() -> impl Strategy<Value = (u8, Board)> {
    (1u8..=12).prop_flat_map(|n| (Just(n), (0u32..(1u32 << n)).prop_map(Board::from_mask)))
}

proptest! {
    // 1. decode then encode is the identity on every index
    #[test]
    fn codec_round_trip((n, board) in board_strategy()) {
        let values = decode(board.mask(), n).unwrap();
        prop_assert_eq!(encode(&values, n).unwrap(), board.mask());
        prop_assert!(values.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(values.iter().all(|&v| v >= 1 && v <= n));
    }

    // 2. flag vectors agree with the value form
    #[test]
    fn flags_agree_with_values((n, board) in board_strategy()) {
        let flags = to_flags(board.mask(), n).unwrap();
        prop_assert_eq!(flags.len(), n as usize);
        prop_assert_eq!(from_flags(&flags).unwrap(), board.mask());
        prop_assert_eq!(flags.iter().filter(|&&f| f).count() as u32, board.len());
    }

    // 3. every enumerated flip is a subset of the board summing to the target
    #[test]
    fn combinations_are_exact((_, board) in board_strategy(), target in 0u32..=40) {
        let flips = combinations_summing_to(board, target);
        for flip in &flips {
            prop_assert!(!flip.is_empty());
            prop_assert!(flip.is_subset_of(board));
            prop_assert_eq!(flip.sum(), target);
        }
        let mut deduped = flips.clone();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), flips.len());
    }

    // 4. outcome counts sum to S^D and probabilities to one
    #[test]
    fn distribution_normalized(dice in 1u8..=4, sides in 1u8..=10) {
        let dist = RollDistribution::new(dice, sides).unwrap();
        let total: u64 = dist.iter_outcomes().map(|(_, o)| o).sum();
        prop_assert_eq!(total, (sides as u64).pow(dice as u32));
        assert_abs_diff_eq!(dist.iter().map(|(_, p)| p).sum::<f64>(), 1.0, epsilon = 1e-12);
        prop_assert_eq!(dist.probability(dist.min_roll() - 1), 0.0);
        prop_assert_eq!(dist.probability(dist.max_roll() + 1), 0.0);
    }

    // 5. the value lies between the stop value and the maximum
    #[test]
    fn value_bounded(mask in 0u32..512) {
        let solver = classic();
        let board = Board::from_mask(mask);
        let value = solver.expected_value(board).unwrap();
        prop_assert!(value >= solver.stop_value(board));
        prop_assert!(value <= solver.max_points());
    }

    // 6. an extra standing tile costs at most its own value: the larger
    //    board can follow the smaller board's play and leave that tile up
    #[test]
    fn extra_tile_costs_at_most_its_value(mask in 0u32..512, tile in 1u8..=9) {
        let solver = classic();
        let board = Board::from_mask(mask);
        prop_assume!(!board.contains(tile));
        let more = board.with(tile).unwrap();
        let with_tile = solver.expected_value(more).unwrap();
        let without_tile = solver.expected_value(board).unwrap();
        prop_assert!(
            with_tile >= without_tile - tile as f64 - 1e-9,
            "V({}) = {} < V({}) - {} = {}",
            more, with_tile, board, tile, without_tile - tile as f64
        );
    }

    // 7. the chosen flip is legal and attains the best continuation
    #[test]
    fn decision_is_optimal(mask in 1u32..512, roll in 2u32..=12) {
        let solver = classic();
        let board = Board::from_mask(mask);
        let ranked = solver.ranked_flips(board, roll).unwrap();
        match solver.decide(board, roll).unwrap() {
            Decision::Flip(flip) => {
                prop_assert!(flip.is_subset_of(board));
                prop_assert_eq!(flip.sum(), roll);
                prop_assert_eq!(ranked[0].0, flip);
            }
            Decision::Stop => {
                prop_assert!(ranked.iter().all(|&(_, v)| v <= solver.stop_value(board)));
            }
        }
    }

    // 8. an episode never lasts longer than the number of tiles
    #[test]
    fn episode_terminates(seed in any::<u64>()) {
        let mut env = ShutTheBox::new(SolverConfig::classic()).unwrap();
        let (mut obs, _) = env.reset(Some(seed));
        let mut steps = 0;
        loop {
            let decision = obs.flips.first().copied().map_or(Decision::Stop, Decision::Flip);
            let result = env.step(decision).unwrap();
            steps += 1;
            if result.terminated {
                prop_assert_eq!(result.reward, result.info.score as f64);
                break;
            }
            obs = result.observation;
        }
        prop_assert!(steps <= 10);
    }
}

#[test]
fn classic_root_value() {
    let solver = classic();
    assert_eq!(solver.num_states(), 512);
    let root = solver.root_value();
    assert_abs_diff_eq!(root, 33.842491555797, epsilon = 1e-9);
    assert_abs_diff_eq!(root, solver.expected_value(Board::full(9).unwrap()).unwrap(), epsilon = 0.0);
}

#[test]
fn extra_tile_can_raise_value() {
    // values are not monotone in the standing set
    let solver = classic();
    let smaller = Board::from_values(&[2, 5, 6, 9], 9).unwrap();
    let larger = smaller.with(3).unwrap();
    let v_small = solver.expected_value(smaller).unwrap();
    let v_large = solver.expected_value(larger).unwrap();
    assert_abs_diff_eq!(v_small, 30.7463, epsilon = 1e-4);
    assert_abs_diff_eq!(v_large, 31.7403, epsilon = 1e-4);
    assert!(v_large > v_small);
}

#[test]
fn parallel_matches_sequential() {
    let config = SolverConfig::classic().with_board_size(10).with_threads(4);
    let mut sequential = ExactSolver::new(config.clone()).unwrap();
    let mut parallel = ExactSolver::new(config).unwrap();
    sequential.solve();
    parallel.solve_parallel().unwrap();

    for mask in 0..1024u32 {
        let board = Board::from_mask(mask);
        assert_eq!(
            sequential.expected_value(board).unwrap().to_bits(),
            parallel.expected_value(board).unwrap().to_bits(),
            "board {}",
            board
        );
    }
}

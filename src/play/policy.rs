//! Decision policies for the play environment.
//!
//! Any type implementing [`Policy`] can drive a [`ShutTheBox`](super::ShutTheBox)
//! episode. Three baselines are provided alongside the exact policy backed by
//! a solved [`ExactSolver`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::exact::board::{Board, Decision};
use crate::exact::solver::ExactSolver;
use crate::play::env::Observation;

/// A strategy that picks a decision from an observation.
///
/// Implement this trait to evaluate your own strategy with
/// [`simulate`](super::simulate).
///
/// # Example
/// ```
/// use shut_the_box_solver::exact::Decision;
/// use shut_the_box_solver::play::{Observation, Policy};
///
/// struct AlwaysStop;
///
/// impl Policy for AlwaysStop {
///     fn name(&self) -> &str {
///         "always-stop"
///     }
///
///     fn choose(&mut self, _observation: &Observation) -> Decision {
///         Decision::Stop
///     }
/// }
/// ```
pub trait Policy: Send {
    /// Short label used in reports.
    fn name(&self) -> &str;

    /// Pick a decision. Returning a flip that is not in
    /// `observation.flips` ends the episode.
    fn choose(&mut self, observation: &Observation) -> Decision;
}

/// Uniformly random choice among the legal flips. Never stops voluntarily.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    /// Create a seeded random policy.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn choose(&mut self, observation: &Observation) -> Decision {
        if observation.flips.is_empty() {
            return Decision::Stop;
        }
        let pick = self.rng.gen_range(0..observation.flips.len());
        Decision::Flip(observation.flips[pick])
    }
}

/// Flips the group whose values, sorted high to low, are lexicographically
/// largest. Prefers knocking down the big tiles first.
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestNumberPolicy;

impl Policy for LargestNumberPolicy {
    fn name(&self) -> &str {
        "largest"
    }

    fn choose(&mut self, observation: &Observation) -> Decision {
        observation
            .flips
            .iter()
            .copied()
            .max_by_key(|flip| flip.values().rev().collect::<Vec<u8>>())
            .map_or(Decision::Stop, Decision::Flip)
    }
}

/// Flips the group whose values, sorted low to high, are lexicographically
/// smallest.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmallestNumberPolicy;

impl Policy for SmallestNumberPolicy {
    fn name(&self) -> &str {
        "smallest"
    }

    fn choose(&mut self, observation: &Observation) -> Decision {
        observation
            .flips
            .iter()
            .copied()
            .min_by_key(|flip| flip.to_vec())
            .map_or(Decision::Stop, Decision::Flip)
    }
}

/// Plays the optimal decision from a shared solver.
#[derive(Clone)]
pub struct ExactPolicy {
    solver: Arc<ExactSolver>,
}

impl ExactPolicy {
    /// Wrap a solver. Unsolved boards are filled in on demand.
    pub fn new(solver: Arc<ExactSolver>) -> Self {
        Self { solver }
    }
}

impl Policy for ExactPolicy {
    fn name(&self) -> &str {
        "exact"
    }

    /// `decide` only fails for boards outside the solver's tile set, which
    /// an environment built from the same configuration never produces.
    /// Pairing the policy with a different tile set is a caller bug: debug
    /// builds panic, release builds log it and stop.
    fn choose(&mut self, observation: &Observation) -> Decision {
        let decision = self.solver.decide(observation.board, observation.roll);
        debug_assert!(
            decision.is_ok(),
            "board {} is outside the solver's tile set",
            observation.board
        );
        decision.unwrap_or_else(|e| {
            warn!("no decision for {}: {}", observation.board, e);
            Decision::Stop
        })
    }
}

/// Built-in policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// [`RandomPolicy`]
    Random,
    /// [`LargestNumberPolicy`]
    Largest,
    /// [`SmallestNumberPolicy`]
    Smallest,
    /// [`ExactPolicy`]
    Exact,
}

impl PolicyKind {
    /// All built-in policies, baselines first.
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::Random,
        PolicyKind::Largest,
        PolicyKind::Smallest,
        PolicyKind::Exact,
    ];

    /// Instantiate the policy. `seed` only affects [`PolicyKind::Random`].
    pub fn build(self, seed: u64, solver: &Arc<ExactSolver>) -> Box<dyn Policy> {
        match self {
            PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
            PolicyKind::Largest => Box::new(LargestNumberPolicy),
            PolicyKind::Smallest => Box::new(SmallestNumberPolicy),
            PolicyKind::Exact => Box::new(ExactPolicy::new(Arc::clone(solver))),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Random => "random",
            PolicyKind::Largest => "largest",
            PolicyKind::Smallest => "smallest",
            PolicyKind::Exact => "exact",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(PolicyKind::Random),
            "largest" => Ok(PolicyKind::Largest),
            "smallest" => Ok(PolicyKind::Smallest),
            "exact" | "optimal" => Ok(PolicyKind::Exact),
            other => Err(format!(
                "unknown policy '{}' (expected random, largest, smallest or exact)",
                other
            )),
        }
    }
}

/// Whether `decision` is legal for `observation`.
pub fn is_legal(observation: &Observation, decision: Decision) -> bool {
    match decision {
        Decision::Stop => true,
        Decision::Flip(flip) => observation.flips.contains(&flip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::combinations::combinations_summing_to;
    use crate::exact::SolverConfig;

    fn observation(tiles: &[u8], roll: u32) -> Observation {
        let board = Board::from_values(tiles, 9).unwrap();
        Observation {
            board,
            roll,
            flips: combinations_summing_to(board, roll),
        }
    }

    #[test]
    fn test_largest_prefers_big_tiles() {
        let obs = observation(&[1, 2, 3, 4, 5, 6, 7, 8, 9], 9);
        assert_eq!(
            LargestNumberPolicy.choose(&obs),
            Decision::Flip(Board::singleton(9).unwrap())
        );

        // {8,1} beats {6,3}, {5,4} and {5,3,1}
        let obs = observation(&[1, 3, 4, 5, 6, 8], 9);
        assert_eq!(
            LargestNumberPolicy.choose(&obs),
            Decision::Flip(Board::from_values(&[1, 8], 9).unwrap())
        );
    }

    #[test]
    fn test_smallest_prefers_small_tiles() {
        let obs = observation(&[1, 2, 3, 4, 5, 6, 7, 8, 9], 9);
        // {1,2,6} < {1,3,5} < {2,3,4} < ...
        assert_eq!(
            SmallestNumberPolicy.choose(&obs),
            Decision::Flip(Board::from_values(&[1, 2, 6], 9).unwrap())
        );
    }

    #[test]
    fn test_policies_stop_without_flips() {
        let obs = observation(&[5], 3);
        assert!(obs.flips.is_empty());

        assert_eq!(LargestNumberPolicy.choose(&obs), Decision::Stop);
        assert_eq!(SmallestNumberPolicy.choose(&obs), Decision::Stop);
        assert_eq!(RandomPolicy::new(0).choose(&obs), Decision::Stop);
    }

    #[test]
    fn test_random_is_legal_and_seeded() {
        let obs = observation(&[1, 2, 3, 4, 5, 6, 7, 8, 9], 10);
        let mut a = RandomPolicy::new(42);
        let mut b = RandomPolicy::new(42);
        for _ in 0..50 {
            let choice = a.choose(&obs);
            assert!(is_legal(&obs, choice));
            assert_eq!(choice, b.choose(&obs));
        }
    }

    #[test]
    fn test_exact_matches_solver() {
        let solver = Arc::new(ExactSolver::new(SolverConfig::classic()).unwrap());
        let mut policy = ExactPolicy::new(Arc::clone(&solver));

        for roll in 2..=12 {
            let obs = observation(&[1, 2, 3, 4, 5, 6, 7, 8, 9], roll);
            let choice = policy.choose(&obs);
            assert!(is_legal(&obs, choice));
            assert_eq!(choice, solver.decide(obs.board, roll).unwrap());
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside the solver's tile set")]
    fn test_exact_rejects_foreign_board() {
        // solver over {1,2}, observation from the classic board
        let solver = Arc::new(ExactSolver::new(SolverConfig::tiny()).unwrap());
        let mut policy = ExactPolicy::new(solver);
        policy.choose(&observation(&[1, 2, 3, 4, 5, 6, 7, 8, 9], 7));
    }

    #[test]
    fn test_policy_kind_parse() {
        for kind in PolicyKind::ALL {
            assert_eq!(kind.to_string().parse::<PolicyKind>(), Ok(kind));
        }
        assert_eq!("Optimal".parse::<PolicyKind>(), Ok(PolicyKind::Exact));
        assert!("greedy".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn test_policy_kind_build() {
        let solver = Arc::new(ExactSolver::new(SolverConfig::tiny()).unwrap());
        for kind in PolicyKind::ALL {
            assert_eq!(kind.build(7, &solver).name(), kind.to_string());
        }
    }
}

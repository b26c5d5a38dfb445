//! Probability distribution of the dice sum.

use rand::Rng;

use crate::exact::config::{ConfigError, SolverConfig};

/// Exact probability mass function for the sum of `D` fair `S`-sided dice.
///
/// Probabilities are computed from integer outcome counts divided by `S^D`,
/// so the classic two-dice table is exactly `{1,2,3,4,5,6,5,4,3,2,1}/36`.
#[derive(Debug, Clone, PartialEq)]
pub struct RollDistribution {
    num_dice: u8,
    num_sides: u8,
    /// Outcome counts for rolls `D..=D*S`.
    counts: Vec<u64>,
    /// `S^D`.
    total: u64,
}

impl RollDistribution {
    /// Build the distribution for `num_dice` dice with `num_sides` sides.
    pub fn new(num_dice: u8, num_sides: u8) -> Result<Self, ConfigError> {
        if num_dice == 0 {
            return Err(ConfigError::InvalidDice(num_dice));
        }
        if num_sides == 0 {
            return Err(ConfigError::InvalidSides(num_sides));
        }
        let total = (num_sides as u64)
            .checked_pow(num_dice as u32)
            .ok_or(ConfigError::TooManyOutcomes {
                dice: num_dice,
                sides: num_sides,
            })?;
        let sides = num_sides as usize;

        // counts over sums 0..=D*S, convolved one die at a time
        let mut counts = vec![1u64];
        for _ in 0..num_dice {
            let mut next = vec![0u64; counts.len() + sides];
            for (sum, &c) in counts.iter().enumerate() {
                if c == 0 {
                    continue;
                }
                for face in 1..=sides {
                    next[sum + face] += c;
                }
            }
            counts = next;
        }

        Ok(Self {
            num_dice,
            num_sides,
            counts: counts.split_off(num_dice as usize),
            total,
        })
    }

    /// Distribution for the dice of a solver configuration.
    pub fn from_config(config: &SolverConfig) -> Result<Self, ConfigError> {
        Self::new(config.num_dice, config.num_sides)
    }

    /// Smallest achievable roll.
    pub fn min_roll(&self) -> u32 {
        self.num_dice as u32
    }

    /// Largest achievable roll.
    pub fn max_roll(&self) -> u32 {
        self.num_dice as u32 * self.num_sides as u32
    }

    /// Inclusive range of achievable rolls.
    pub fn support(&self) -> std::ops::RangeInclusive<u32> {
        self.min_roll()..=self.max_roll()
    }

    /// P(sum of dice = roll); 0.0 outside the support.
    pub fn probability(&self, roll: u32) -> f64 {
        if roll < self.min_roll() || roll > self.max_roll() {
            return 0.0;
        }
        self.counts[(roll - self.min_roll()) as usize] as f64 / self.total as f64
    }

    /// Number of dice outcomes producing `roll`.
    pub fn outcomes(&self, roll: u32) -> u64 {
        if roll < self.min_roll() || roll > self.max_roll() {
            return 0;
        }
        self.counts[(roll - self.min_roll()) as usize]
    }

    /// Total number of dice outcomes, `S^D`.
    pub fn total_outcomes(&self) -> u64 {
        self.total
    }

    /// Iterate `(roll, outcome count)` over the support.
    pub fn iter_outcomes(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.support().map(move |r| (r, self.outcomes(r)))
    }

    /// Iterate `(roll, probability)` over the support.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.support().map(move |r| (r, self.probability(r)))
    }

    /// Roll the dice and return their sum.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> u32 {
        (0..self.num_dice)
            .map(|_| rng.gen_range(1..=self.num_sides as u32))
            .sum()
    }
}

use std::fmt;

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use thiserror::Error;

pub const DEFAULT_TRIALS: usize = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    #[error("got {a} scores for system A but {b} scores for system B")]
    LengthMismatch { a: usize, b: usize },

    #[error("no scores to resample")]
    EmptyInput,

    #[error("trial count must be at least 1")]
    ZeroTrials,
}

/// Scores of two systems over the same N items, paired by index.
#[derive(Debug, Clone)]
pub struct ScorePairs {
    a: Vec<f64>,
    b: Vec<f64>,
}

impl ScorePairs {
    pub fn new(a: Vec<f64>, b: Vec<f64>) -> Result<Self, BootstrapError> {
        if a.len() != b.len() {
            return Err(BootstrapError::LengthMismatch {
                a: a.len(),
                b: b.len(),
            });
        }
        if a.is_empty() {
            return Err(BootstrapError::EmptyInput);
        }
        Ok(Self { a, b })
    }

    pub fn system_a(&self) -> &[f64] {
        &self.a
    }

    pub fn system_b(&self) -> &[f64] {
        &self.b
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapOutcome {
    pub wins: usize,
    pub trials: usize,
}

impl BootstrapOutcome {
    pub fn win_percentage(&self) -> f64 {
        (self.wins as f64 / self.trials as f64) * 100.0
    }
}

impl fmt::Display for BootstrapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "In {} experiments, b won {} times ({:.6} percent)",
            self.trials,
            self.wins,
            self.win_percentage()
        )
    }
}

/// Run one resampling trial and report whether B won it.
///
/// Draws N indices with replacement and feeds the same index to both
/// systems, so A and B are compared on an identical resampled set of items.
/// B wins only when its sum is strictly greater than A's.
pub fn run_trial<R: Rng>(pairs: &ScorePairs, rng: &mut R) -> bool {
    let n = pairs.a.len();
    let mut sum_a = 0.0_f64;
    let mut sum_b = 0.0_f64;

    for _ in 0..n {
        let index = rng.random_range(0..n);
        sum_a += pairs.a[index];
        sum_b += pairs.b[index];
    }

    sum_b > sum_a
}

/// Count B's wins over `trials` trials drawn from a single RNG stream.
pub fn count_wins<R: Rng>(
    pairs: &ScorePairs,
    trials: usize,
    rng: &mut R,
) -> Result<BootstrapOutcome, BootstrapError> {
    if trials == 0 {
        return Err(BootstrapError::ZeroTrials);
    }

    let wins = (0..trials).filter(|_| run_trial(pairs, rng)).count();
    Ok(BootstrapOutcome { wins, trials })
}

/// Parallel run over the current rayon pool.
///
/// Every trial seeds its own RNG from `(seed, trial index)`, so the win
/// count depends only on the seed and not on how trials are scheduled.
pub fn count_wins_par(
    pairs: &ScorePairs,
    trials: usize,
    seed: u64,
) -> Result<BootstrapOutcome, BootstrapError> {
    if trials == 0 {
        return Err(BootstrapError::ZeroTrials);
    }

    let wins: usize = (0..trials)
        .into_par_iter()
        .map(|trial| usize::from(seeded_trial(pairs, seed, trial)))
        .sum();
    Ok(BootstrapOutcome { wins, trials })
}

fn seeded_trial(pairs: &ScorePairs, seed: u64, trial: usize) -> bool {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(seed, trial as u64));
    run_trial(pairs, &mut rng)
}

/// SplitMix64 hash of a base seed and a counter.
#[inline]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng(seed: u64) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(seed)
    }

    #[test]
    fn new_rejects_length_mismatch_before_anything_else() {
        let err = ScorePairs::new(vec![1.0, 1.0, 1.0], vec![1.0, 1.0]).unwrap_err();
        assert_eq!(err, BootstrapError::LengthMismatch { a: 3, b: 2 });
        assert_eq!(
            err.to_string(),
            "got 3 scores for system A but 2 scores for system B"
        );

        let err = ScorePairs::new(Vec::new(), vec![1.0]).unwrap_err();
        assert_eq!(err, BootstrapError::LengthMismatch { a: 0, b: 1 });
    }

    #[test]
    fn new_rejects_empty_input() {
        let err = ScorePairs::new(Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err, BootstrapError::EmptyInput);
    }

    #[test]
    fn zero_trials_is_rejected_on_every_path() {
        let pairs = ScorePairs::new(vec![1.0], vec![2.0]).unwrap();
        assert_eq!(
            count_wins(&pairs, 0, &mut rng(1)),
            Err(BootstrapError::ZeroTrials)
        );
        assert_eq!(count_wins_par(&pairs, 0, 1), Err(BootstrapError::ZeroTrials));
    }

    #[test]
    fn pointwise_dominance_wins_every_trial() {
        let pairs = ScorePairs::new(vec![1.0, 1.0, 1.0], vec![2.0, 2.0, 2.0]).unwrap();
        let outcome = count_wins(&pairs, 10, &mut rng(7)).unwrap();
        assert_eq!(outcome, BootstrapOutcome { wins: 10, trials: 10 });
        assert_eq!(outcome.win_percentage(), 100.0);

        let mixed = ScorePairs::new(vec![0.1, 0.5, 0.9, 0.3], vec![0.2, 0.6, 0.95, 0.31]).unwrap();
        assert_eq!(count_wins(&mixed, 250, &mut rng(3)).unwrap().wins, 250);
    }

    #[test]
    fn identical_scores_never_win() {
        let single = ScorePairs::new(vec![5.0], vec![5.0]).unwrap();
        let outcome = count_wins(&single, 100, &mut rng(11)).unwrap();
        assert_eq!(outcome.wins, 0);
        assert_eq!(outcome.win_percentage(), 0.0);

        let many = ScorePairs::new(vec![0.25, 0.5, 0.75], vec![0.25, 0.5, 0.75]).unwrap();
        assert_eq!(count_wins_par(&many, 200, 5).unwrap().wins, 0);
    }

    #[test]
    fn swapped_scores_split_decisive_trials_evenly() {
        let pairs = ScorePairs::new(vec![1.0, 2.0], vec![2.0, 1.0]).unwrap();
        let reversed = ScorePairs::new(vec![2.0, 1.0], vec![1.0, 2.0]).unwrap();

        // Same seed draws the same indices, so wins on the reversed pairs are
        // exactly the losses on the original pairs.
        let wins = count_wins(&pairs, 1000, &mut rng(2024)).unwrap().wins;
        let losses = count_wins(&reversed, 1000, &mut rng(2024)).unwrap().wins;

        // Mixed draws tie, so roughly half the trials are decisive.
        let decisive = wins + losses;
        assert!((350..=650).contains(&decisive), "decisive trials {decisive}");

        let share = wins as f64 / decisive as f64 * 100.0;
        assert!((35.0..=65.0).contains(&share), "win share {share}");
    }

    #[test]
    fn win_count_stays_within_trial_count() {
        let a: Vec<f64> = (0..40).map(|i| (i as f64 * 0.37).sin()).collect();
        let b: Vec<f64> = (0..40).map(|i| (i as f64 * 0.41).cos()).collect();
        let pairs = ScorePairs::new(a, b).unwrap();

        for trials in [1, 7, 100] {
            let outcome = count_wins(&pairs, trials, &mut rng(trials as u64)).unwrap();
            assert!(outcome.wins <= trials);
            assert_eq!(outcome.trials, trials);
        }
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let a: Vec<f64> = (0..25).map(|i| (i % 5) as f64).collect();
        let b: Vec<f64> = (0..25).map(|i| (i % 7) as f64 * 0.7).collect();
        let pairs = ScorePairs::new(a, b).unwrap();

        let first = count_wins(&pairs, 500, &mut rng(99)).unwrap();
        let second = count_wins(&pairs, 500, &mut rng(99)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn parallel_matches_per_trial_seeding() {
        let a: Vec<f64> = (0..30).map(|i| (i as f64).sqrt()).collect();
        let b: Vec<f64> = (0..30).map(|i| (i as f64 * 1.1).sqrt() - 0.2).collect();
        let pairs = ScorePairs::new(a, b).unwrap();

        let sequential = (0..400)
            .filter(|&trial| seeded_trial(&pairs, 17, trial))
            .count();
        let parallel = count_wins_par(&pairs, 400, 17).unwrap();
        assert_eq!(parallel.wins, sequential);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .unwrap();
        let pooled = pool.install(|| count_wins_par(&pairs, 400, 17)).unwrap();
        assert_eq!(pooled, parallel);
    }

    #[test]
    fn counter_rng_seed_spreads_adjacent_counters() {
        let first = counter_rng_seed(42, 0);
        let second = counter_rng_seed(42, 1);
        assert_ne!(first, second);
        assert_ne!(first, 42);
        assert_eq!(counter_rng_seed(42, 1), second);
    }

    #[test]
    fn summary_line_uses_six_decimals() {
        let outcome = BootstrapOutcome {
            wins: 534,
            trials: 1000,
        };
        assert_eq!(
            outcome.to_string(),
            "In 1000 experiments, b won 534 times (53.400000 percent)"
        );
    }
}

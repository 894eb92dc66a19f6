//! Candidate selection for quizzes: tier filtering and random sampling.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{DifficultyTier, WordRecord};
use crate::error::AppError;

/// Words whose composite score falls in `tier`. Order follows the input.
pub fn filter_by_tier(words: &[WordRecord], tier: DifficultyTier) -> Vec<WordRecord> {
  words
    .iter()
    .filter(|w| w.tier() == tier)
    .cloned()
    .collect()
}

/// Uniform sample of `min(n, words.len())` distinct records.
pub fn sample_words<R: Rng + ?Sized>(words: &[WordRecord], n: usize, rng: &mut R) -> Vec<WordRecord> {
  words.choose_multiple(rng, n).cloned().collect()
}

/// Filter then sample exactly `n` words, or report that the tier is too small.
pub fn select_candidates<R: Rng + ?Sized>(
  words: &[WordRecord],
  tier: DifficultyTier,
  n: usize,
  rng: &mut R,
) -> Result<Vec<WordRecord>, AppError> {
  let pool = filter_by_tier(words, tier);
  if pool.len() < n {
    return Err(AppError::InsufficientData { required: n, available: pool.len() });
  }
  Ok(sample_words(&pool, n, rng))
}

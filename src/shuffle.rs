//! Randomized choice order with the correct answer tracked by text.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::domain::QuizQuestion;

/// Shuffle one question's choices and move `correct_answer_index` to follow the
/// correct text. With duplicate texts the first occurrence wins.
pub fn shuffle_choices<R: Rng + ?Sized>(q: &mut QuizQuestion, rng: &mut R) {
  let correct = q.choices.get(q.correct_answer_index).cloned();
  q.choices.shuffle(rng);

  match correct {
    Some(text) => {
      if let Some(pos) = q.choices.iter().position(|c| *c == text) {
        q.correct_answer_index = pos;
      }
    }
    None => {
      // Unvalidated input: leave the index as the workflow sent it.
      warn!(
        target: "quiz",
        index = q.correct_answer_index,
        choices = q.choices.len(),
        "correct_answer_index out of range; left unchanged"
      );
    }
  }
}

pub fn shuffle_quiz<R: Rng + ?Sized>(quiz: &mut [QuizQuestion], rng: &mut R) {
  for q in quiz.iter_mut() {
    shuffle_choices(q, rng);
  }
}

//! Domain models: stored vocabulary, difficulty tiers, quiz questions and generated recipes.

use serde::{Deserialize, Serialize};

/// Composite score at or above which a word counts as basic.
pub const BASIC_MIN_SCORE: f64 = 12.0;

/// One row of the `words` table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WordRecord {
  pub id: i64,
  pub word: String,
  pub translation: String,
  // Rows created through the recipe path have no scores yet.
  #[serde(default)] pub recognition: Option<f64>,
  #[serde(default)] pub frequency: Option<f64>,
  #[serde(default)] pub simplicity: Option<f64>,
}

impl WordRecord {
  /// recognition + frequency + simplicity, missing attributes count as 0.
  pub fn difficulty_score(&self) -> f64 {
    self.recognition.unwrap_or(0.0) + self.frequency.unwrap_or(0.0) + self.simplicity.unwrap_or(0.0)
  }

  pub fn tier(&self) -> DifficultyTier {
    DifficultyTier::for_score(self.difficulty_score())
  }
}

/// Payload for the insert-or-ignore write path keyed by `word`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct NewWord {
  pub word: String,
  pub translation: String,
}

/// Named difficulty bucket derived from the composite score.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
  #[default]
  Basic,
  Advanced,
}

impl DifficultyTier {
  /// Basic is `score >= 12`, advanced is everything below.
  /// Over integer scores that is exactly `<= 11`, and no fractional score falls in a gap.
  pub fn for_score(score: f64) -> Self {
    if score >= BASIC_MIN_SCORE { DifficultyTier::Basic } else { DifficultyTier::Advanced }
  }
}

/// A multiple-choice question as produced by the quiz workflow.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizQuestion {
  pub question: String,
  pub choices: Vec<String>,
  pub correct_answer_index: usize,
}

pub type QuizSet = Vec<QuizQuestion>;

/// Vocabulary entry attached to a generated recipe.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
  pub word: String,
  pub translation: String,
  #[serde(default)] pub part_of_speech: String,
}

/// Recipe as produced by the recipe workflow (camelCase on the wire).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
  pub dish: String,
  #[serde(default)] pub cooking_time: String,
  #[serde(default)] pub difficulty: String,
  #[serde(default)] pub ingredients: Vec<String>,
  #[serde(default)] pub steps: Vec<String>,
  #[serde(default)] pub vocabulary: Vec<Vocabulary>,
  #[serde(default)] pub tips: Vec<String>,
}

impl Recipe {
  /// Vocabulary rows to upsert into the word store.
  pub fn new_words(&self) -> Vec<NewWord> {
    self.vocabulary
      .iter()
      .map(|v| NewWord { word: v.word.clone(), translation: v.translation.clone() })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn word(r: f64, f: f64, s: f64) -> WordRecord {
    WordRecord {
      id: 1,
      word: "whisk".into(),
      translation: "泡立て器".into(),
      recognition: Some(r),
      frequency: Some(f),
      simplicity: Some(s),
    }
  }

  #[test]
  fn tier_thresholds_are_complementary() {
    assert_eq!(word(4.0, 4.0, 4.0).tier(), DifficultyTier::Basic);
    assert_eq!(word(4.0, 4.0, 3.0).tier(), DifficultyTier::Advanced);
    assert_eq!(word(4.0, 4.0, 3.5).tier(), DifficultyTier::Advanced);
    assert_eq!(word(5.0, 5.0, 5.0).tier(), DifficultyTier::Basic);
    assert_eq!(DifficultyTier::default(), DifficultyTier::Basic);
  }

  #[test]
  fn missing_scores_count_as_zero() {
    let w: WordRecord = serde_json::from_str(r#"{"id":7,"word":"simmer","translation":"煮込む"}"#).unwrap();
    assert_eq!(w.difficulty_score(), 0.0);
    assert_eq!(w.tier(), DifficultyTier::Advanced);
  }

  #[test]
  fn recipe_parses_camel_case_and_lists_new_words() {
    let json = r#"{
      "dish": "Omelette rice",
      "cookingTime": "20 minutes",
      "difficulty": "Easy",
      "ingredients": ["1 egg"],
      "steps": ["Beat the egg."],
      "vocabulary": [{"word": "beat", "translation": "溶く", "partOfSpeech": "verb"}],
      "tips": ["Use low heat."]
    }"#;
    let r: Recipe = serde_json::from_str(json).unwrap();
    assert_eq!(r.cooking_time, "20 minutes");
    assert_eq!(r.new_words(), vec![NewWord { word: "beat".into(), translation: "溶く".into() }]);
  }
}

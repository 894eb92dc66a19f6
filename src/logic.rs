//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Building a quiz: store read → tier filter → sample → workflow → normalize → shuffle
//!   - Driving a `QuizSession` through generation without holding its lock over network calls
//!   - Generating a recipe and saving it together with its vocabulary

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::domain::{DifficultyTier, QuizSet, Recipe, WordRecord};
use crate::envelope::{normalize_quiz, normalize_recipe};
use crate::error::AppError;
use crate::selection::{filter_by_tier, select_candidates};
use crate::session::{QuizSession, SessionSnapshot};
use crate::shuffle::shuffle_quiz;
use crate::state::{AppState, SharedSession};
use crate::store::VocabularyStore;
use crate::workflow::{word_list, WorkflowClient};
use tokio::sync::Mutex;

/// Questions (and sampled words) per quiz.
pub const QUIZ_SIZE: usize = 5;

/// Select words, call the quiz workflow and return a shuffled quiz.
/// Nothing is sent to the workflow when the tier has too few words.
#[instrument(level = "info", skip(store, workflow, rng))]
pub async fn build_quiz<R: Rng + Send>(
  store: &dyn VocabularyStore,
  workflow: &dyn WorkflowClient,
  tier: DifficultyTier,
  n: usize,
  rng: &mut R,
) -> Result<QuizSet, AppError> {
  let words = store.read_all().await?;
  let picked = select_candidates(&words, tier, n, rng)?;
  let body = workflow.generate_quiz(&word_list(&picked)).await?;
  let mut quiz = normalize_quiz(&body)?;
  shuffle_quiz(&mut quiz, rng);
  info!(target: "quiz", ?tier, questions = quiz.len(), "Quiz built");
  Ok(quiz)
}

/// Returns the session to `Idle` if the generating future is dropped
/// before `complete_generation` runs (client disconnect, aborted task).
struct GenerationGuard {
  session: SharedSession,
  ticket: u64,
  armed: bool,
}

impl Drop for GenerationGuard {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    let ticket = self.ticket;
    if let Ok(mut s) = self.session.try_lock() {
      s.abandon_generation(ticket);
      return;
    }
    // Lock is busy; finish the reset on the runtime.
    match tokio::runtime::Handle::try_current() {
      Ok(handle) => {
        let session = self.session.clone();
        handle.spawn(async move {
          session.lock().await.abandon_generation(ticket);
        });
      }
      Err(_) => error!(target: "quiz", ticket, "No runtime to reset an abandoned generation"),
    }
  }
}

/// Run one generation cycle on a session. Overlapping requests are rejected
/// and any failure, including cancellation, leaves the session idle.
#[instrument(level = "info", skip(state, session))]
pub async fn generate_quiz_for(
  state: &AppState,
  session: &SharedSession,
  tier: DifficultyTier,
) -> Result<SessionSnapshot, AppError> {
  let ticket = session.lock().await.begin_generation()?;
  let mut guard = GenerationGuard { session: session.clone(), ticket, armed: true };

  let mut rng = StdRng::from_entropy();
  let outcome = build_quiz(state.store.as_ref(), state.workflow.as_ref(), tier, QUIZ_SIZE, &mut rng).await;

  let mut s = session.lock().await;
  guard.armed = false;
  s.complete_generation(outcome)?;
  Ok(s.snapshot())
}

#[instrument(level = "info", skip(session))]
pub async fn select_answer(
  session: &Mutex<QuizSession>,
  question: usize,
  choice: usize,
) -> Result<SessionSnapshot, AppError> {
  let mut s = session.lock().await;
  s.record_answer(question, choice)?;
  Ok(s.snapshot())
}

#[instrument(level = "info", skip(session))]
pub async fn submit_quiz(session: &Mutex<QuizSession>) -> Result<SessionSnapshot, AppError> {
  let mut s = session.lock().await;
  s.submit()?;
  Ok(s.snapshot())
}

/// Words, optionally restricted to one tier.
#[instrument(level = "info", skip(state))]
pub async fn list_words(state: &AppState, tier: Option<DifficultyTier>) -> Result<Vec<WordRecord>, AppError> {
  let words = state.store.read_all().await?;
  Ok(match tier {
    Some(t) => filter_by_tier(&words, t),
    None => words,
  })
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct RecipeOutcome {
  pub recipe: Recipe,
  /// False when the recipe could not be written to history.
  pub saved: bool,
}

/// Generate a recipe for `dish`, then save it and its vocabulary.
/// Save failures do not fail the request.
#[instrument(level = "info", skip(state, dish), fields(dish_len = dish.len()))]
pub async fn generate_recipe(state: &AppState, dish: &str) -> Result<RecipeOutcome, AppError> {
  let dish = dish.trim();
  if dish.is_empty() {
    return Err(AppError::InvalidInput("Please enter a dish name.".into()));
  }

  let body = state.workflow.generate_recipe(dish).await?;
  let recipe = normalize_recipe(&body)?;
  info!(target: "recipe", dish = %recipe.dish, vocab = recipe.vocabulary.len(), "Recipe generated");

  let saved = save_recipe(state.store.as_ref(), &recipe).await;
  Ok(RecipeOutcome { recipe, saved })
}

async fn save_recipe(store: &dyn VocabularyStore, recipe: &Recipe) -> bool {
  let text = match serde_json::to_string(recipe) {
    Ok(t) => t,
    Err(e) => {
      error!(target: "recipe", error = %e, "Could not serialize recipe");
      return false;
    }
  };
  if let Err(e) = store.insert_recipe(&text).await {
    error!(target: "recipe", error = %e, "Could not save recipe to history");
    return false;
  }

  let words = recipe.new_words();
  if let Err(e) = store.upsert_words(&words).await {
    // History is saved; vocabulary upsert problems are only logged.
    warn!(target: "recipe", error = %e, count = words.len(), "Error upserting words");
  }
  true
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::domain::NewWord;
  use crate::session::Phase;
  use async_trait::async_trait;
  use serde_json::json;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use std::time::Duration;
  use std::sync::{Arc, Mutex as StdMutex};

  #[derive(Default)]
  pub struct FakeStore {
    pub words: Vec<WordRecord>,
    pub fail_recipe: bool,
    pub recipes: StdMutex<Vec<String>>,
    pub upserts: StdMutex<Vec<NewWord>>,
  }

  #[async_trait]
  impl VocabularyStore for FakeStore {
    async fn read_all(&self) -> Result<Vec<WordRecord>, AppError> {
      Ok(self.words.clone())
    }
    async fn upsert_words(&self, words: &[NewWord]) -> Result<(), AppError> {
      self.upserts.lock().unwrap().extend_from_slice(words);
      Ok(())
    }
    async fn insert_recipe(&self, recipe_text: &str) -> Result<(), AppError> {
      if self.fail_recipe {
        return Err(AppError::StoreFailed("HTTP 500".into()));
      }
      self.recipes.lock().unwrap().push(recipe_text.to_string());
      Ok(())
    }
  }

  /// Returns canned bodies and counts calls.
  pub struct FakeWorkflow {
    pub quiz: Result<String, AppError>,
    pub recipe: Result<String, AppError>,
    pub calls: AtomicUsize,
    pub last_word_list: StdMutex<Option<String>>,
    /// Quiz calls never resolve while set.
    pub stall: AtomicBool,
  }

  impl FakeWorkflow {
    pub fn quiz(body: Result<String, AppError>) -> Self {
      Self {
        quiz: body,
        recipe: Err(AppError::RequestFailed("unused".into())),
        calls: AtomicUsize::new(0),
        last_word_list: StdMutex::new(None),
        stall: AtomicBool::new(false),
      }
    }
    pub fn recipe(body: Result<String, AppError>) -> Self {
      Self { recipe: body, ..Self::quiz(Err(AppError::RequestFailed("unused".into()))) }
    }
  }

  #[async_trait]
  impl WorkflowClient for FakeWorkflow {
    async fn generate_quiz(&self, word_list: &str) -> Result<String, AppError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      *self.last_word_list.lock().unwrap() = Some(word_list.to_string());
      if self.stall.load(Ordering::SeqCst) {
        std::future::pending::<()>().await;
      }
      self.quiz.clone()
    }
    async fn generate_recipe(&self, _dish: &str) -> Result<String, AppError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.recipe.clone()
    }
  }

  pub fn words(scores: &[f64]) -> Vec<WordRecord> {
    scores
      .iter()
      .enumerate()
      .map(|(i, s)| WordRecord {
        id: i as i64,
        word: format!("word{i}"),
        translation: format!("訳{i}"),
        recognition: Some(*s),
        frequency: Some(0.0),
        simplicity: Some(0.0),
      })
      .collect()
  }

  pub fn five_question_body() -> String {
    let quiz: Vec<_> = (0..5)
      .map(|i| json!({ "question": format!("Q{i}"), "choices": ["a", "b", "c", "d"], "correct_answer_index": i % 4 }))
      .collect();
    json!({ "data": { "outputs": { "quiz": { "quiz": quiz } } } }).to_string()
  }

  pub fn state(store: FakeStore, workflow: FakeWorkflow) -> (AppState, Arc<FakeStore>, Arc<FakeWorkflow>) {
    let store = Arc::new(store);
    let workflow = Arc::new(workflow);
    let st = AppState::with_collaborators(store.clone(), workflow.clone());
    (st, store, workflow)
  }

  #[tokio::test]
  async fn too_few_advanced_words_aborts_before_any_request() {
    let (st, _, wf) = state(
      FakeStore { words: words(&[1.0, 2.0, 3.0, 15.0, 15.0, 15.0]), ..Default::default() },
      FakeWorkflow::quiz(Ok(five_question_body())),
    );
    let session = Arc::new(Mutex::new(QuizSession::new()));
    let err = generate_quiz_for(&st, &session, DifficultyTier::Advanced).await.unwrap_err();
    assert_eq!(err, AppError::InsufficientData { required: 5, available: 3 });
    assert_eq!(session.lock().await.phase(), Phase::Idle);
    assert_eq!(wf.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn workflow_failure_returns_session_to_idle() {
    let (st, _, _) = state(
      FakeStore { words: words(&[15.0; 6]), ..Default::default() },
      FakeWorkflow::quiz(Err(AppError::RequestFailed("HTTP 500 Internal Server Error".into()))),
    );
    let session = Arc::new(Mutex::new(QuizSession::new()));
    let err = generate_quiz_for(&st, &session, DifficultyTier::Basic).await.unwrap_err();
    assert!(matches!(err, AppError::RequestFailed(_)));
    let s = session.lock().await;
    assert_eq!(s.phase(), Phase::Idle);
    assert!(s.quiz().is_none());
  }

  #[tokio::test]
  async fn successful_generation_then_perfect_score() {
    let (st, _, wf) = state(
      FakeStore { words: words(&[12.0, 13.0, 14.0, 15.0, 16.0, 1.0]), ..Default::default() },
      FakeWorkflow::quiz(Ok(five_question_body())),
    );
    let session = Arc::new(Mutex::new(QuizSession::new()));
    let snap = generate_quiz_for(&st, &session, DifficultyTier::Basic).await.unwrap();
    assert_eq!(snap.phase, Phase::Ready);
    assert_eq!(snap.questions.len(), 5);

    let sent = wf.last_word_list.lock().unwrap().clone().unwrap();
    assert_eq!(sent.lines().count(), 5);
    assert!(!sent.contains("word5"));

    let correct: Vec<usize> = session.lock().await.quiz().unwrap().iter().map(|q| q.correct_answer_index).collect();
    for (i, c) in correct.iter().enumerate() {
      select_answer(&session, i, *c).await.unwrap();
    }
    let done = submit_quiz(&session).await.unwrap();
    assert_eq!((done.score, done.total), (Some(5), Some(5)));
  }

  #[tokio::test]
  async fn shuffled_quiz_keeps_correct_text() {
    let store = FakeStore { words: words(&[20.0; 5]), ..Default::default() };
    let wf = FakeWorkflow::quiz(Ok(five_question_body()));
    let mut rng = StdRng::seed_from_u64(11);
    let quiz = build_quiz(&store, &wf, DifficultyTier::Basic, QUIZ_SIZE, &mut rng).await.unwrap();
    let original = ["a", "b", "c", "d"];
    for (i, q) in quiz.iter().enumerate() {
      assert_eq!(q.choices[q.correct_answer_index], original[i % 4]);
    }
  }

  #[tokio::test]
  async fn submitting_four_of_five_keeps_session_ready() {
    let (st, _, _) = state(
      FakeStore { words: words(&[20.0; 5]), ..Default::default() },
      FakeWorkflow::quiz(Ok(five_question_body())),
    );
    let session = Arc::new(Mutex::new(QuizSession::new()));
    generate_quiz_for(&st, &session, DifficultyTier::Basic).await.unwrap();
    for i in 0..4 {
      select_answer(&session, i, 0).await.unwrap();
    }
    let err = submit_quiz(&session).await.unwrap_err();
    assert_eq!(err, AppError::IncompleteAnswers { answered: 4, total: 5 });
    let s = session.lock().await;
    assert_eq!(s.phase(), Phase::Ready);
    assert_eq!(s.answers().unwrap().len(), 4);
  }

  #[tokio::test]
  async fn cancelled_generation_returns_session_to_idle() {
    let (st, _, wf) = state(
      FakeStore { words: words(&[20.0; 5]), ..Default::default() },
      FakeWorkflow::quiz(Ok(five_question_body())),
    );
    wf.stall.store(true, Ordering::SeqCst);
    let session: SharedSession = Arc::new(Mutex::new(QuizSession::new()));

    let task = {
      let (st, session) = (st.clone(), session.clone());
      tokio::spawn(async move { generate_quiz_for(&st, &session, DifficultyTier::Basic).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.lock().await.phase(), Phase::Generating);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert_eq!(session.lock().await.phase(), Phase::Idle);

    wf.stall.store(false, Ordering::SeqCst);
    let snap = generate_quiz_for(&st, &session, DifficultyTier::Basic).await.unwrap();
    assert_eq!(snap.phase, Phase::Ready);
  }

  #[tokio::test]
  async fn recipe_is_saved_with_vocabulary() {
    let recipe = json!({
      "dish": "Omurice", "cookingTime": "20 min", "difficulty": "Easy",
      "ingredients": ["egg"], "steps": ["Fry."], "tips": [],
      "vocabulary": [{"word": "fry", "translation": "焼く", "partOfSpeech": "verb"}]
    });
    let body = json!({ "data": { "outputs": { "json": recipe.to_string() } } }).to_string();
    let (st, store, _) = state(FakeStore::default(), FakeWorkflow::recipe(Ok(body)));

    let out = generate_recipe(&st, "  オムライス ").await.unwrap();
    assert!(out.saved);
    assert_eq!(out.recipe.dish, "Omurice");
    assert_eq!(store.recipes.lock().unwrap().len(), 1);
    assert_eq!(store.upserts.lock().unwrap()[0].word, "fry");
  }

  #[tokio::test]
  async fn recipe_save_failure_still_returns_recipe() {
    let body = json!({ "data": { "outputs": { "json": { "dish": "Pasta" } } } }).to_string();
    let (st, store, _) = state(FakeStore { fail_recipe: true, ..Default::default() }, FakeWorkflow::recipe(Ok(body)));
    let out = generate_recipe(&st, "pasta").await.unwrap();
    assert!(!out.saved);
    assert!(store.upserts.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn blank_dish_is_rejected_without_a_request() {
    let (st, _, wf) = state(FakeStore::default(), FakeWorkflow::recipe(Ok("{}".into())));
    assert!(matches!(generate_recipe(&st, "   ").await, Err(AppError::InvalidInput(_))));
    assert_eq!(wf.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn list_words_filters_when_tier_given() {
    let (st, _, _) = state(FakeStore { words: words(&[1.0, 12.0, 30.0]), ..Default::default() }, FakeWorkflow::quiz(Ok(String::new())));
    assert_eq!(list_words(&st, None).await.unwrap().len(), 3);
    assert_eq!(list_words(&st, Some(DifficultyTier::Basic)).await.unwrap().len(), 2);
  }
}

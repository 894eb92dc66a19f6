//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Errors become a JSON notice with a matching status code.

use std::sync::Arc;
use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::logic::*;
use crate::protocol::*;
use crate::session::SessionSnapshot;
use crate::state::AppState;

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = match &self {
      AppError::InsufficientData { .. }
      | AppError::IncompleteAnswers { .. }
      | AppError::InvalidSelection { .. }
      | AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::GenerationInProgress | AppError::NoActiveQuiz => StatusCode::CONFLICT,
      AppError::UnknownSession(_) => StatusCode::NOT_FOUND,
      AppError::RequestFailed(_)
      | AppError::MalformedResponse(_)
      | AppError::UnexpectedResponseShape(_)
      | AppError::StoreFailed(_) => StatusCode::BAD_GATEWAY,
    };
    warn!(target: "recipe_vocab", %status, error = %self, "Request ended with notice");
    (status, Json(self.notice())).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, q), fields(tier = ?q.tier))]
pub async fn http_get_words(
  State(state): State<Arc<AppState>>,
  Query(q): Query<WordsQuery>,
) -> Result<Json<WordsOut>, AppError> {
  let words = list_words(&state, q.tier).await?;
  Ok(Json(WordsOut { words }))
}

#[instrument(level = "info", skip(state, body), fields(dish_len = body.dish.len()))]
pub async fn http_post_recipe(
  State(state): State<Arc<AppState>>,
  Json(body): Json<RecipeIn>,
) -> Result<Json<RecipeOutcome>, AppError> {
  let outcome = generate_recipe(&state, &body.dish).await?;
  info!(target: "recipe", dish = %outcome.recipe.dish, saved = outcome.saved, "HTTP recipe served");
  Ok(Json(outcome))
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let session_id = state.create_session().await;
  (StatusCode::CREATED, Json(SessionCreatedOut { session_id }))
}

#[instrument(level = "info", skip(state), fields(%q.session_id))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionQuery>,
) -> Result<Json<SessionSnapshot>, AppError> {
  let session = state.session(&q.session_id).await?;
  let snap = session.lock().await.snapshot();
  Ok(Json(snap))
}

#[instrument(level = "info", skip(state, body), fields(session = %body.session_id, tier = ?body.tier))]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> Result<Json<SessionSnapshot>, AppError> {
  let session = state.session(&body.session_id).await?;
  let snap = generate_quiz_for(&state, &session, body.tier).await?;
  info!(target: "quiz", session = %body.session_id, questions = snap.questions.len(), "HTTP quiz generated");
  Ok(Json(snap))
}

#[instrument(level = "info", skip(state, body), fields(session = %body.session_id, q = body.question_index, c = body.choice_index))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<SessionSnapshot>, AppError> {
  let session = state.session(&body.session_id).await?;
  Ok(Json(select_answer(&session, body.question_index, body.choice_index).await?))
}

#[instrument(level = "info", skip(state, body), fields(session = %body.session_id))]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SubmitIn>,
) -> Result<Json<SessionSnapshot>, AppError> {
  let session = state.session(&body.session_id).await?;
  let snap = submit_quiz(&session).await?;
  info!(target: "quiz", session = %body.session_id, score = ?snap.score, total = ?snap.total, "HTTP quiz submitted");
  Ok(Json(snap))
}

//! Unwrapping the workflow service envelope: `{ data: { outputs: { <key>: ... } } }`.
//!
//! The output value may arrive either as JSON or as a string holding JSON;
//! both are accepted. Nothing beyond the shape of the payload is validated.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{QuizQuestion, QuizSet, Recipe};
use crate::error::AppError;
use crate::util::trunc_for_log;

pub const QUIZ_OUTPUT_KEY: &str = "quiz";
pub const RECIPE_OUTPUT_KEY: &str = "json";

/// Locate `data.outputs.<key>` and decode a string-encoded payload.
pub fn extract_output(body: &str, key: &str) -> Result<Value, AppError> {
  let root: Value = serde_json::from_str(body).map_err(|e| {
    warn!(target: "workflow", error = %e, body = %trunc_for_log(body, 200), "Response body is not JSON");
    AppError::MalformedResponse(format!("response body is not JSON: {e}"))
  })?;

  // An explicit null or empty string counts as a missing output.
  let output = root
    .pointer(&format!("/data/outputs/{key}"))
    .filter(|v| !v.is_null() && v.as_str() != Some(""));
  let Some(output) = output else {
    warn!(target: "workflow", %key, body = %trunc_for_log(body, 200), "Missing output field in response");
    return Err(AppError::UnexpectedResponseShape(format!("missing data.outputs.{key}")));
  };

  match output {
    Value::String(s) => {
      debug!(target: "workflow", %key, len = s.len(), "Output is string-encoded JSON");
      serde_json::from_str(s)
        .map_err(|e| AppError::MalformedResponse(format!("data.outputs.{key} is not valid JSON: {e}")))
    }
    other => Ok(other.clone()),
  }
}

fn decode<T: DeserializeOwned>(value: Value, key: &str) -> Result<T, AppError> {
  serde_json::from_value(value).map_err(|e| AppError::MalformedResponse(format!("data.outputs.{key}: {e}")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuizPayload {
  Wrapped { quiz: Vec<QuizQuestion> },
  Bare(Vec<QuizQuestion>),
}

/// Extract the quiz questions from a raw quiz workflow response.
pub fn normalize_quiz(body: &str) -> Result<QuizSet, AppError> {
  let payload: QuizPayload = decode(extract_output(body, QUIZ_OUTPUT_KEY)?, QUIZ_OUTPUT_KEY)?;
  Ok(match payload {
    QuizPayload::Wrapped { quiz } => quiz,
    QuizPayload::Bare(quiz) => quiz,
  })
}

/// Extract the recipe from a raw recipe workflow response.
pub fn normalize_recipe(body: &str) -> Result<Recipe, AppError> {
  decode(extract_output(body, RECIPE_OUTPUT_KEY)?, RECIPE_OUTPUT_KEY)
}

//! Minimal client for the hosted generation workflows (quiz + recipe).
//!
//! Each call is a single blocking-mode `POST` with a bearer credential; the raw
//! body is returned for `envelope` to unwrap. No retries; transport-default timeouts.
//!
//! NOTE: We never log credentials and keep body excerpts short.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::domain::WordRecord;
use crate::error::AppError;
use crate::util::trunc_for_log;

/// Generation service seam; the HTTP implementation is `WorkflowHttpClient`.
#[async_trait]
pub trait WorkflowClient: Send + Sync {
  /// Run the quiz workflow with a newline-joined word list; returns the raw body.
  async fn generate_quiz(&self, word_list: &str) -> Result<String, AppError>;

  /// Run the recipe workflow for a dish name; returns the raw body.
  async fn generate_recipe(&self, dish: &str) -> Result<String, AppError>;
}

/// `"word (translation)"` lines, one per record.
pub fn word_list(words: &[WordRecord]) -> String {
  words
    .iter()
    .map(|w| format!("{} ({})", w.word, w.translation))
    .collect::<Vec<_>>()
    .join("\n")
}

#[derive(Serialize)]
struct WorkflowRequest<'a> {
  inputs: Value,
  response_mode: &'a str,
  user: &'a str,
}

#[derive(Clone)]
pub struct WorkflowHttpClient {
  pub client: reqwest::Client,
  pub endpoint: String,
  quiz_credential: String,
  recipe_credential: String,
  pub user: String,
}

impl WorkflowHttpClient {
  pub fn new(config: &AppConfig) -> Result<Self, AppError> {
    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| AppError::RequestFailed(format!("could not build HTTP client: {e}")))?;
    Ok(Self {
      client,
      endpoint: config.generation_endpoint.clone(),
      quiz_credential: config.generation_credential.clone(),
      recipe_credential: config.recipe_credential.clone(),
      user: config.workflow_user.clone(),
    })
  }

  #[instrument(level = "info", skip(self, credential, inputs), fields(endpoint = %self.endpoint))]
  async fn run(&self, workflow: &str, credential: &str, inputs: Value) -> Result<String, AppError> {
    let req = WorkflowRequest { inputs, response_mode: "blocking", user: &self.user };
    let start = std::time::Instant::now();

    let res = self.client.post(&self.endpoint)
      .header(USER_AGENT, "recipe-vocab-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", credential))
      .json(&req).send().await
      .map_err(|e| {
        error!(target: "workflow", %workflow, error = %e, "Transport error");
        AppError::RequestFailed(e.to_string())
      })?;

    let status = res.status();
    let body = res.text().await.map_err(|e| AppError::RequestFailed(e.to_string()))?;
    let elapsed = start.elapsed();

    if !status.is_success() {
      error!(target: "workflow", %workflow, %status, ?elapsed, body = %trunc_for_log(&body, 200), "Workflow returned an error status");
      return Err(AppError::RequestFailed(format!("HTTP {}", status)));
    }

    info!(target: "workflow", %workflow, %status, ?elapsed, body_len = body.len(), "Workflow response received");
    Ok(body)
  }
}

#[async_trait]
impl WorkflowClient for WorkflowHttpClient {
  async fn generate_quiz(&self, word_list: &str) -> Result<String, AppError> {
    self.run("quiz", &self.quiz_credential, json!({ "word_list": word_list })).await
  }

  async fn generate_recipe(&self, dish: &str) -> Result<String, AppError> {
    self.run("recipe", &self.recipe_credential, json!({ "recipe_name": dish })).await
  }
}

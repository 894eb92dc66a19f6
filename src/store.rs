//! Vocabulary persistence on Supabase (PostgREST over HTTP).
//!
//! Tables:
//!   - `words(id, word unique, translation, recognition, frequency, simplicity)`
//!   - `recipes(recipe_text)`

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::domain::{NewWord, WordRecord};
use crate::error::AppError;
use crate::util::trunc_for_log;

#[async_trait]
pub trait VocabularyStore: Send + Sync {
  /// Every word row; filtering happens in the caller.
  async fn read_all(&self) -> Result<Vec<WordRecord>, AppError>;

  /// Insert words, ignoring ones whose `word` already exists.
  async fn upsert_words(&self, words: &[NewWord]) -> Result<(), AppError>;

  /// Store a generated recipe as serialized JSON text.
  async fn insert_recipe(&self, recipe_text: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SupabaseStore {
  client: reqwest::Client,
  base_url: String,
  api_key: String,
}

impl SupabaseStore {
  pub fn new(config: &AppConfig) -> Result<Self, AppError> {
    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| AppError::StoreFailed(format!("could not build HTTP client: {e}")))?;
    Ok(Self { client, base_url: config.supabase_url.clone(), api_key: config.supabase_key.clone() })
  }

  fn table_url(&self, table: &str) -> String {
    format!("{}/rest/v1/{}", self.base_url, table)
  }

  fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
    self.client
      .request(method, url)
      .header("apikey", &self.api_key)
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
  }

  async fn check(res: reqwest::Response, what: &str) -> Result<reqwest::Response, AppError> {
    if res.status().is_success() {
      return Ok(res);
    }
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    error!(target: "store", %what, %status, body = %trunc_for_log(&body, 200), "Supabase request failed");
    Err(AppError::StoreFailed(format!("{what}: HTTP {status}")))
  }
}

#[async_trait]
impl VocabularyStore for SupabaseStore {
  #[instrument(level = "info", skip(self))]
  async fn read_all(&self) -> Result<Vec<WordRecord>, AppError> {
    let url = format!(
      "{}?select=id,word,translation,recognition,frequency,simplicity",
      self.table_url("words")
    );
    let res = self.request(reqwest::Method::GET, &url)
      .send().await
      .map_err(|e| AppError::StoreFailed(e.to_string()))?;
    let res = Self::check(res, "read words").await?;
    let words: Vec<WordRecord> = res.json().await.map_err(|e| AppError::StoreFailed(e.to_string()))?;
    info!(target: "store", count = words.len(), "Words loaded");
    Ok(words)
  }

  #[instrument(level = "info", skip(self, words), fields(count = words.len()))]
  async fn upsert_words(&self, words: &[NewWord]) -> Result<(), AppError> {
    if words.is_empty() {
      return Ok(());
    }
    let url = format!("{}?on_conflict=word", self.table_url("words"));
    let res = self.request(reqwest::Method::POST, &url)
      .header(CONTENT_TYPE, "application/json")
      .header("Prefer", "resolution=ignore-duplicates,return=minimal")
      .json(words)
      .send().await
      .map_err(|e| AppError::StoreFailed(e.to_string()))?;
    Self::check(res, "upsert words").await?;
    Ok(())
  }

  #[instrument(level = "info", skip(self, recipe_text), fields(len = recipe_text.len()))]
  async fn insert_recipe(&self, recipe_text: &str) -> Result<(), AppError> {
    let res = self.request(reqwest::Method::POST, &self.table_url("recipes"))
      .header(CONTENT_TYPE, "application/json")
      .header("Prefer", "return=minimal")
      .json(&json!({ "recipe_text": recipe_text }))
      .send().await
      .map_err(|e| AppError::StoreFailed(e.to_string()))?;
    Self::check(res, "insert recipe").await?;
    Ok(())
  }
}

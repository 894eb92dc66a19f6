//! Error taxonomy for the quiz and recipe pipelines.
//!
//! Every variant is recoverable: handlers turn it into a dismissible `Notice`
//! and the session stays (or returns to) a safe state.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
  #[error("Not enough words for this level: need {required}, found {available}.")]
  InsufficientData { required: usize, available: usize },

  #[error("Generation request failed: {0}")]
  RequestFailed(String),

  #[error("Could not parse generated content: {0}")]
  MalformedResponse(String),

  #[error("Unexpected response structure: {0}")]
  UnexpectedResponseShape(String),

  #[error("Please answer all questions ({answered} of {total} answered).")]
  IncompleteAnswers { answered: usize, total: usize },

  #[error("A quiz is already being generated.")]
  GenerationInProgress,

  #[error("No active quiz.")]
  NoActiveQuiz,

  #[error("Invalid selection: question {question}, choice {choice}.")]
  InvalidSelection { question: usize, choice: usize },

  #[error("Unknown session: {0}")]
  UnknownSession(String),

  #[error("Vocabulary store error: {0}")]
  StoreFailed(String),

  #[error("{0}")]
  InvalidInput(String),
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
  Warning,
  Error,
}

/// Transient user-visible notification (the browser shows it as a toast).
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Notice {
  pub level: NoticeLevel,
  pub message: String,
}

impl AppError {
  pub fn level(&self) -> NoticeLevel {
    match self {
      AppError::InsufficientData { .. }
      | AppError::IncompleteAnswers { .. }
      | AppError::GenerationInProgress
      | AppError::InvalidInput(_) => NoticeLevel::Warning,
      _ => NoticeLevel::Error,
    }
  }

  pub fn notice(&self) -> Notice {
    Notice { level: self.level(), message: self.to_string() }
  }
}

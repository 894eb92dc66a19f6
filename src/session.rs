//! Quiz session state machine: Idle → Generating → Ready → Submitted.
//!
//! The session is a plain value; callers serialize access (one per WebSocket
//! connection, or behind a mutex for HTTP sessions). Network calls happen
//! between `begin_generation` and `complete_generation`, so the `Generating`
//! state doubles as the re-entrancy guard.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::QuizSet;
use crate::error::AppError;

/// Selected choice index by question index.
pub type AnswerState = BTreeMap<usize, usize>;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Generating,
    Ready,
    Submitted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Generating,
    Ready { quiz: QuizSet, answers: AnswerState },
    Submitted { quiz: QuizSet, answers: AnswerState, score: usize },
}

#[derive(Clone, Debug)]
pub struct QuizSession {
    state: State,
    /// Bumped by every `begin_generation`; identifies the in-flight cycle.
    ticket: u64,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self { state: State::Idle, ticket: 0 }
    }
}

/// Render view of a session. Correct indices are only revealed after submission.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub questions: Vec<QuestionView>,
    pub answers: AnswerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub question: String,
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer_index: Option<usize>,
}

/// Number of questions whose selected choice equals the correct index.
pub fn score(quiz: &QuizSet, answers: &AnswerState) -> usize {
    quiz.iter()
        .enumerate()
        .filter(|(i, q)| answers.get(i) == Some(&q.correct_answer_index))
        .count()
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Generating => Phase::Generating,
            State::Ready { .. } => Phase::Ready,
            State::Submitted { .. } => Phase::Submitted,
        }
    }

    pub fn quiz(&self) -> Option<&QuizSet> {
        match &self.state {
            State::Ready { quiz, .. } | State::Submitted { quiz, .. } => Some(quiz),
            _ => None,
        }
    }

    pub fn answers(&self) -> Option<&AnswerState> {
        match &self.state {
            State::Ready { answers, .. } | State::Submitted { answers, .. } => Some(answers),
            _ => None,
        }
    }

    /// Enter `Generating`, discarding any previous quiz and answers.
    /// Rejected while another generation is in flight. Returns the ticket
    /// for `abandon_generation`.
    #[instrument(level = "debug", skip(self), fields(phase = ?self.phase()))]
    pub fn begin_generation(&mut self) -> Result<u64, AppError> {
        if self.state == State::Generating {
            warn!(target: "quiz", "Generate requested while already generating");
            return Err(AppError::GenerationInProgress);
        }
        self.state = State::Generating;
        self.ticket = self.ticket.wrapping_add(1);
        Ok(self.ticket)
    }

    /// Back to `Idle` when the cycle identified by `ticket` will never complete.
    /// No-op if that cycle already finished or a newer one started.
    pub fn abandon_generation(&mut self, ticket: u64) -> bool {
        if self.state != State::Generating || self.ticket != ticket {
            return false;
        }
        warn!(target: "quiz", ticket, "Generation abandoned; back to idle");
        self.state = State::Idle;
        true
    }

    /// Leave `Generating`: `Ready` with fresh answers on success, `Idle` on failure.
    #[instrument(level = "debug", skip_all, fields(ok = outcome.is_ok()))]
    pub fn complete_generation(&mut self, outcome: Result<QuizSet, AppError>) -> Result<(), AppError> {
        if self.state != State::Generating {
            return Err(AppError::NoActiveQuiz);
        }
        match outcome {
            Ok(quiz) => {
                info!(target: "quiz", questions = quiz.len(), "Quiz ready");
                self.state = State::Ready { quiz, answers: AnswerState::new() };
                Ok(())
            }
            Err(e) => {
                warn!(target: "quiz", error = %e, "Quiz generation failed; back to idle");
                self.state = State::Idle;
                Err(e)
            }
        }
    }

    /// Record or overwrite the selection for one question.
    pub fn record_answer(&mut self, question: usize, choice: usize) -> Result<(), AppError> {
        let State::Ready { quiz, answers } = &mut self.state else {
            return Err(AppError::NoActiveQuiz);
        };
        let in_bounds = quiz.get(question).map_or(false, |q| choice < q.choices.len());
        if !in_bounds {
            return Err(AppError::InvalidSelection { question, choice });
        }
        answers.insert(question, choice);
        debug!(target: "quiz", question, choice, "Answer recorded");
        Ok(())
    }

    /// Freeze answers and score the quiz. Every question must be answered.
    #[instrument(level = "debug", skip(self), fields(phase = ?self.phase()))]
    pub fn submit(&mut self) -> Result<usize, AppError> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Ready { quiz, answers } => {
                let total = quiz.len();
                let answered = (0..total).filter(|i| answers.contains_key(i)).count();
                if answered != total {
                    self.state = State::Ready { quiz, answers };
                    return Err(AppError::IncompleteAnswers { answered, total });
                }
                let s = score(&quiz, &answers);
                info!(target: "quiz", score = s, total, "Quiz submitted");
                self.state = State::Submitted { quiz, answers, score: s };
                Ok(s)
            }
            other => {
                self.state = other;
                Err(AppError::NoActiveQuiz)
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let reveal = matches!(self.state, State::Submitted { .. });
        let questions = self
            .quiz()
            .map(|quiz| {
                quiz.iter()
                    .map(|q| QuestionView {
                        question: q.question.clone(),
                        choices: q.choices.clone(),
                        correct_answer_index: reveal.then_some(q.correct_answer_index),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let (score, total) = match &self.state {
            State::Submitted { quiz, score, .. } => (Some(*score), Some(quiz.len())),
            _ => (None, None),
        };
        SessionSnapshot {
            phase: self.phase(),
            questions,
            answers: self.answers().cloned().unwrap_or_default(),
            score,
            total,
        }
    }
}

//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{DifficultyTier, WordRecord};
use crate::error::Notice;
use crate::logic::RecipeOutcome;
use crate::session::SessionSnapshot;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NewQuiz {
        #[serde(default)]
        tier: DifficultyTier,
    },
    SelectAnswer {
        #[serde(rename = "questionIndex")]
        question_index: usize,
        #[serde(rename = "choiceIndex")]
        choice_index: usize,
    },
    SubmitQuiz,
    GenerateRecipe {
        dish: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Quiz {
        session: SessionSnapshot,
    },
    Recipe {
        #[serde(flatten)]
        outcome: RecipeOutcome,
    },
    Notice {
        #[serde(flatten)]
        notice: Notice,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct WordsQuery {
    pub tier: Option<DifficultyTier>,
}
#[derive(Serialize)]
pub struct WordsOut {
    pub words: Vec<WordRecord>,
}

#[derive(Deserialize)]
pub struct RecipeIn {
    pub dish: String,
}

#[derive(Serialize)]
pub struct SessionCreatedOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct GenerateIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub tier: DifficultyTier,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "questionIndex")]
    pub question_index: usize,
    #[serde(rename = "choiceIndex")]
    pub choice_index: usize,
}

#[derive(Deserialize)]
pub struct SubmitIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

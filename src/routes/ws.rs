//! WebSocket upgrade + message loop. Each connection owns one quiz session;
//! client messages are handled in order, one JSON reply per message.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use crate::error::AppError;
use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::QuizSession;
use crate::state::{AppState, SharedSession};

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "recipe_vocab", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "recipe_vocab", "WebSocket connected");
  let session: SharedSession = Arc::new(Mutex::new(QuizSession::new()));

  while let Some(Ok(msg)) = socket.recv().await {
    let reply = match next_frame(msg, &state, &session).await {
      Frame::Reply(m) => m,
      Frame::Close => break,
      Frame::Skip => continue,
    };
    // Text replies and pongs share one send path; a dead socket ends the loop.
    if let Err(e) = socket.send(reply).await {
      error!(target: "recipe_vocab", error = %e, "WS send error");
      break;
    }
  }
  info!(target: "recipe_vocab", "WebSocket disconnected");
}

#[derive(Debug, PartialEq)]
enum Frame {
  Reply(Message),
  Close,
  Skip,
}

async fn next_frame(msg: Message, state: &AppState, session: &SharedSession) -> Frame {
  match msg {
    Message::Text(txt) => {
      let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
        Ok(incoming) => {
          debug!(target: "recipe_vocab", "WS received: {:?}", &incoming);
          handle_client_ws(incoming, state, session).await
        }
        Err(e) => notice(AppError::InvalidInput(format!("Invalid JSON: {}", e))),
      };

      let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
        serde_json::json!({ "type": "notice", "level": "error", "message": format!("Serialization error: {}", e) }).to_string()
      });
      Frame::Reply(Message::Text(out))
    }
    Message::Ping(payload) => Frame::Reply(Message::Pong(payload)),
    Message::Close(_) => Frame::Close,
    _ => Frame::Skip,
  }
}

fn notice(e: AppError) -> ServerWsMessage {
  ServerWsMessage::Notice { notice: e.notice() }
}

#[instrument(level = "info", skip(state, session))]
pub(crate) async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  session: &SharedSession,
) -> ServerWsMessage {
  let result = match msg {
    ClientWsMessage::Ping => return ServerWsMessage::Pong,

    ClientWsMessage::NewQuiz { tier } => generate_quiz_for(state, session, tier).await,

    ClientWsMessage::SelectAnswer { question_index, choice_index } => {
      select_answer(session, question_index, choice_index).await
    }

    ClientWsMessage::SubmitQuiz => submit_quiz(session).await,

    ClientWsMessage::GenerateRecipe { dish } => {
      return match generate_recipe(state, &dish).await {
        Ok(outcome) => ServerWsMessage::Recipe { outcome },
        Err(e) => notice(e),
      };
    }
  };

  match result {
    Ok(snapshot) => ServerWsMessage::Quiz { session: snapshot },
    Err(e) => notice(e),
  }
}

//! Recipe vocabulary backend
//!
//! - Axum HTTP + WebSocket API for recipe generation and vocabulary quizzes
//! - Generation delegated to hosted workflows, vocabulary kept in Supabase
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                  : u16 (default 3000)
//!   GENERATION_ENDPOINT   : workflow run URL (required)
//!   GENERATION_CREDENTIAL : bearer credential of the quiz workflow (required)
//!   RECIPE_CREDENTIAL     : bearer credential of the recipe workflow (default: GENERATION_CREDENTIAL)
//!   WORKFLOW_USER         : user label sent with each workflow run
//!   SUPABASE_URL          : project URL (required)
//!   SUPABASE_KEY          : anon/service key (required)
//!   APP_CONFIG_PATH       : optional TOML file with the same settings (env wins)
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod selection;
mod envelope;
mod shuffle;
mod session;
mod store;
mod workflow;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = AppConfig::from_env().map_err(|e| {
    error!(target: "recipe_vocab", error = %e, "Invalid configuration");
    e
  })?;
  let state = Arc::new(AppState::from_config(config)?);

  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "recipe_vocab", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}

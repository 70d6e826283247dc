//! Conjuga · Spanish verb conjugation trainer backend
//!
//! - Axum HTTP + WebSocket API around the quiz engine
//! - Mastery ledger persisted to a single JSON slot on disk
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   QUIZ_CONFIG_PATH : path to TOML config (thresholds, ledger slot, rng seed, places)
//!   LEDGER_DIR       : directory of the ledger slot (overrides config)
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod seeds;
mod generator;
mod ledger;
mod storage;
mod logic;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::load_quiz_config_from_env;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = load_quiz_config_from_env();
  info!(
    target: "conjuga_backend",
    mastery_threshold = config.mastery_threshold,
    strike_limit = config.strike_limit,
    milestone_every = config.milestone_every,
    "Quiz rules"
  );

  // Shared state: sessions, ledger (loaded once here), store, rng.
  let state = Arc::new(AppState::new(config).await);

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "conjuga_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "conjuga_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "conjuga_backend", error = %e, "Could not listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  info!(target: "conjuga_backend", "Shutdown requested");
}

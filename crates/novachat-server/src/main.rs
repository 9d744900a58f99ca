//! novachat-server: end-to-end-encrypted chat relay.
//!
//! Accepts websocket connections on a single `/ws` endpoint, performs a
//! per-connection Diffie-Hellman handshake and welcome exchange, then
//! relays encrypted frames between clients without ever seeing plaintext.

use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Router,
};
use clap::Parser;
use novachat_transport::WebSocketTransport;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handshake;
mod lifecycle;
mod relay;
mod router;
mod state;

use config::Args;
use state::AppState;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log.clone())))
        .init();

    let state = AppState::new();
    let app = Router::new().route("/ws", get(ws_handler)).with_state(state);

    tracing::info!(bind = %args.bind, "starting novachat-server");
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app).await.expect("server error");
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let transport = WebSocketTransport::new(socket);
        lifecycle::run(Arc::clone(&state.registry), transport).await;
    })
}

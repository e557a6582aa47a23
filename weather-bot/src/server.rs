//! Webhook endpoint for Telegram updates.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use tokio::net::TcpListener;
use weather_core::{Dispatcher, SpeechCredential, Update};

/// Per-request speech token, for deployments where the caller mints one.
pub const SPEECH_TOKEN_HEADER: &str = "x-speech-token";

pub struct AppState {
    pub dispatcher: Dispatcher,
    pub speech: Option<SpeechCredential>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(handle_update))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(
    listen: &str,
    dispatcher: Dispatcher,
    speech: Option<SpeechCredential>,
) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind webhook server to {listen}"))?;

    tracing::info!(addr = listen, "webhook server listening");

    let state = Arc::new(AppState { dispatcher, speech });
    axum::serve(listener, router(state))
        .await
        .context("Webhook server error")?;

    Ok(())
}

/// The update is handled to completion before Telegram gets its 200.
async fn handle_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    tracing::debug!(update_id = update.update_id, "received Telegram update");

    let per_request = headers
        .get(SPEECH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(SpeechCredential::new);

    let credential = per_request.as_ref().or(state.speech.as_ref());
    state.dispatcher.handle_update(update, credential).await;

    StatusCode::OK
}

async fn health() -> &'static str {
    "ok"
}

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;

use crate::{config::Config, dispatcher::IntentDispatcher, models::WebhookRequest};

pub fn router(dispatcher: Arc<IntentDispatcher>) -> Router {
    Router::new()
        .route("/", post(handle_webhook))
        .route("/webhook", post(handle_webhook))
        .route("/health", get(health))
        .with_state(dispatcher)
}

pub async fn run_server(config: Config, dispatcher: Arc<IntentDispatcher>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tracing::info!(bind_addr = %config.bind_addr, "Webhook listening");

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Webhook server terminated unexpectedly")?;

    tracing::info!("Webhook stopped");
    Ok(())
}

async fn handle_webhook(
    State(dispatcher): State<Arc<IntentDispatcher>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    tracing::debug!(headers = ?headers, "Request headers");
    tracing::debug!(body = %String::from_utf8_lossy(&body), "Request body");

    let request: WebhookRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed webhook request");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": format!("invalid webhook request: {e}") })),
            )
                .into_response();
        }
    };

    let response = dispatcher.dispatch(&request).await;
    tracing::info!(reply = %response.fulfillment_text, "Replying");

    Json(response).into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

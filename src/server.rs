//! HTTP boundary for the assistant.
//!
//! The host chat runtime delivers one message activity per request; this
//! adapter invokes the turn handler and always replies. A failed turn is
//! logged with its full error chain on the operator channel and answered
//! with the single fixed fault message — a fault never terminates the
//! conversation session and no partial reply is sent after one.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/messages` | One conversational turn |
//! | `GET`  | `/health` | Health check (version, document count) |
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! chat clients.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::turn::{Assistant, FAULT_REPLY};

#[derive(Clone)]
struct AppState {
    assistant: Arc<Assistant>,
    app_id: Option<String>,
}

/// Starts the HTTP server. Runs until the process is terminated.
pub async fn run_server(
    bind: &str,
    app_id: Option<String>,
    assistant: Arc<Assistant>,
) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/messages", post(handle_message))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { assistant, app_id });

    println!("assistant listening on http://{}", bind);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ POST /messages ============

/// Inbound message activity from the host runtime.
#[derive(Deserialize)]
struct MessageRequest {
    text: String,
    /// Session identifier; minted when the client sends none.
    conversation_id: Option<String>,
}

#[derive(Serialize)]
struct MessageReply {
    reply: String,
    conversation_id: String,
}

async fn handle_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Json<MessageReply> {
    let conversation_id = request
        .conversation_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let reply = match state.assistant.handle(&request.text).await {
        Ok(reply) => reply,
        Err(e) => {
            // Full detail goes to the operator channel; the user sees only
            // the fixed message.
            tracing::error!(
                conversation = %conversation_id,
                app = state.app_id.as_deref().unwrap_or("-"),
                error = ?e,
                "turn failed"
            );
            FAULT_REPLY.to_string()
        }
    };

    Json(MessageReply {
        reply,
        conversation_id,
    })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    documents: usize,
    /// When the serving collection was last (re)built — stale documents
    /// mean `update_repo` (or a restart) is due.
    collection_loaded_at: String,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: state.assistant.document_count().await,
        collection_loaded_at: state.assistant.collection_loaded_at().await.to_rfc3339(),
    })
}

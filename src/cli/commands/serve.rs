//! HTTP API server for the chat boundary and analysis endpoints.
//!
//! The chat endpoint runs one orchestrator turn per request and returns the
//! ordered progress events together with the final response. Message
//! persistence belongs to the chat transport, not to this server.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/api/analysis", get(analysis))
        .route("/api/meeting/{thread_id}/url", get(meeting_url))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Mote API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Chat", "POST /chat");
    Output::kv("Analysis", "GET  /api/analysis?url=...");
    Output::kv("Thread URL", "GET  /api/meeting/:thread_id/url");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    thread_id: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct AnalysisParams {
    /// The YouTube or Zoom URL
    url: String,
}

#[derive(Serialize)]
struct AnalysisResponse {
    metadata: serde_json::Value,
    transcript: String,
}

#[derive(Serialize)]
struct ThreadUrlResponse {
    url: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    let outcome = state
        .orchestrator
        .handle_turn(&req.thread_id, &req.message)
        .await;

    Json(outcome)
}

/// Fetch meeting metadata + transcript by URL.
///
/// The transcript is rebuilt from the ordered index chunks when they exist,
/// falling back to the stored raw transcript.
async fn analysis(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalysisParams>,
) -> impl IntoResponse {
    let meeting = match state.orchestrator.meetings().find_by_url(&params.url).await {
        Ok(Some(meeting)) => meeting,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Meeting not found".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let chunks = match state.orchestrator.chunks().get_by_meeting(meeting.id).await {
        Ok(chunks) => chunks,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let transcript = if chunks.is_empty() {
        meeting.transcript.clone()
    } else {
        chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let metadata = serde_json::to_value(&meeting.summary).unwrap_or_default();

    Json(AnalysisResponse {
        metadata,
        transcript,
    })
    .into_response()
}

async fn meeting_url(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> impl IntoResponse {
    let url = state.orchestrator.sessions().get_url(&thread_id);
    Json(ThreadUrlResponse { url })
}

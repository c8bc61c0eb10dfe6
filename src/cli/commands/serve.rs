//! HTTP API server for integration with other systems.
//!
//! Exposes the retrieval chain and feedback log as JSON endpoints.

use crate::agent::FeedbackSystem;
use crate::chain::{ChainInput, TranscriptRetrievalChain};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::HarkError;
use crate::orchestrator::Orchestrator;
use crate::vector_store::SearchHit;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
struct AppState {
    chain: Arc<TranscriptRetrievalChain>,
    feedback: FeedbackSystem,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    preflight::check(Operation::Query)?;

    let orchestrator = Orchestrator::new(settings)?;
    let state = Arc::new(AppState {
        chain: Arc::new(orchestrator.chain()?),
        feedback: orchestrator.feedback(),
    });

    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Hark API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    Output::kv("Search", "POST /search");
    Output::kv("Feedback", "POST /feedback");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/search", post(search))
        .route("/feedback", post(feedback))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

#[derive(Serialize)]
struct SearchResponse {
    formatted_query: String,
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct FeedbackRequest {
    user_id: String,
    query: String,
    response: String,
    rating: u8,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(e: HarkError) -> Response {
    let status = match e {
        HarkError::InvalidInput(_) | HarkError::Feedback(_) => StatusCode::BAD_REQUEST,
        _ => {
            error!("Request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<ChainInput>) -> Response {
    match state.chain.invoke(req).await {
        Ok(output) => Json(output).into_response(),
        Err(e) => error_response(e),
    }
}

async fn search(State(state): State<Arc<AppState>>, Json(req): Json<SearchRequest>) -> Response {
    if req.query.trim().is_empty() {
        return error_response(HarkError::InvalidInput("Query must not be empty".to_string()));
    }

    match state.chain.retrieve(&req.query).await {
        Ok(retrieval) => Json(SearchResponse {
            formatted_query: retrieval.formatted_query,
            results: retrieval.hits,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn feedback(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FeedbackRequest>,
) -> Response {
    let system = state.feedback.clone();
    let result = tokio::task::spawn_blocking(move || {
        system.collect_feedback(
            &req.user_id,
            &req.query,
            &req.response,
            req.rating,
            req.comment.as_deref(),
        )
    })
    .await;

    match result {
        Ok(Ok(feedback)) => (StatusCode::CREATED, Json(feedback)).into_response(),
        Ok(Err(e)) => error_response(e),
        Err(e) => error_response(HarkError::Io(e.into())),
    }
}

// HTTP routes for the advisory service

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use ecobot_llm::{Advisor, AdvisoryError};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

// API state
#[derive(Clone)]
pub struct ApiState {
    pub advisor: Advisor,
}

impl ApiState {
    pub fn new(advisor: Advisor) -> Self {
        Self { advisor }
    }
}

fn default_language() -> String {
    "english".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Language code or display name
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create HTTP router with all API routes
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Produce an advisory for one item
async fn chat_handler(State(state): State<ApiState>, Json(request): Json<ChatRequest>) -> impl IntoResponse {
    match state.advisor.advise(&request.message, &request.language).await {
        Ok(advisory) => {
            info!(
                "Advisory for {:?} in {} ({} chars)",
                advisory.item,
                advisory.language.code,
                advisory.cleaned_text.len()
            );
            (
                StatusCode::OK,
                Json(ChatResponse {
                    response: advisory.cleaned_text,
                    error: None,
                }),
            )
        }
        Err(err) => {
            let status = match &err {
                AdvisoryError::EmptyItem => StatusCode::BAD_REQUEST,
                AdvisoryError::Generation { .. } => {
                    error!("Advisory generation failed: {}", err);
                    StatusCode::BAD_GATEWAY
                }
            };
            (
                status,
                Json(ChatResponse {
                    response: err.user_message(),
                    error: Some(err.code().to_string()),
                }),
            )
        }
    }
}

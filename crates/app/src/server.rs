use crate::cors::CorsConfig;
use crate::rate_limit::RateLimiter;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use doc_assistant_core::{Assistant, RATE_LIMIT_RESPONSE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub assistant: Assistant,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub answer: String,
}

pub fn router(state: AppState, limiter: Arc<RateLimiter>, cors_config: CorsConfig) -> Router {
    let chat_routes = Router::new()
        .route("/chat", post(chat))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit));

    Router::new()
        .route("/", get(root))
        .merge(chat_routes)
        .layer(cors_config.layer())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": "✅ RAG Backend is running!",
        "endpoint": "POST /chat",
    }))
}

async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Json<ChatResponse> {
    let assistant = state.assistant.clone();
    let question = request.question;

    // Run on its own task so a panic below the handler still produces a reply.
    let outcome = tokio::spawn(async move { assistant.answer(&question).await }).await;

    match outcome {
        Ok(answer) => {
            info!(kind = ?answer.kind, "answered question");
            Json(ChatResponse {
                answer: answer.text,
            })
        }
        Err(join_error) => {
            error!(error = %join_error, "answer task failed");
            Json(ChatResponse {
                answer: format!(
                    "⚠️ An unexpected error occurred: {join_error}. Please try again."
                ),
            })
        }
    }
}

/// Over-limit requests are answered with 200 so clients show the message as a
/// regular reply.
async fn rate_limit(State(limiter): State<Arc<RateLimiter>>, request: Request, next: Next) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !limiter.check(client) {
        warn!(%client, limit = limiter.config().max_requests, "rate limit exceeded");
        return Json(ChatResponse {
            answer: RATE_LIMIT_RESPONSE.to_string(),
        })
        .into_response();
    }

    next.run(request).await
}

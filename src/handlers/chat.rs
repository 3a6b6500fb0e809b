use crate::error::{AppError, Result};
use crate::pipeline::ChatOutcome;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

fn default_session_id() -> String {
    "default-session".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default = "default_session_id")]
    pub session_id: String,
    pub query: String,
}

/// POST /chat - Run the full pipeline for one user query.
///
/// # Flow
/// 1. Validate input
/// 2. Snapshot the semantic index (503 before first build)
/// 3. Route, explore graph, plan, execute, respond
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatOutcome>> {
    if request.query.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Query cannot be empty".to_string(),
        ));
    }

    let index = state.index().ok_or(AppError::IndexNotReady)?;

    metrics::counter!("chat_requests_total").increment(1);
    let start = Instant::now();

    let outcome = state
        .pipeline
        .run(
            Arc::clone(&state.embedder),
            index,
            request.session_id,
            request.query,
        )
        .await?;

    metrics::histogram!("chat_duration_seconds").record(start.elapsed().as_secs_f64());
    metrics::histogram!("chat_plan_steps").record(outcome.plan.len() as f64);
    metrics::counter!(
        "chat_routed_total",
        "function" => outcome.selected_function.name.clone()
    )
    .increment(1);

    Ok(Json(outcome))
}

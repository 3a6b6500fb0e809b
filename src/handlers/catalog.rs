use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Serialize)]
pub struct FunctionSummary {
    pub name: String,
    pub business_desc: String,
    pub technical_desc: String,
}

/// GET /functions - The function catalog in routing order.
pub async fn list_functions(State(state): State<Arc<AppState>>) -> Json<Vec<FunctionSummary>> {
    let summaries = state
        .catalog
        .functions()
        .iter()
        .map(|f| FunctionSummary {
            name: f.name.clone(),
            business_desc: f.business_desc.clone(),
            technical_desc: f.technical_desc.clone(),
        })
        .collect();
    Json(summaries)
}

/// GET /graph/functions - Nodes and edges of the function graph.
pub async fn function_graph_data(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.graph.to_data())
}

/// GET /graph/functions/mermaid - Mermaid rendering of the function graph.
pub async fn function_graph_mermaid(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "mermaid": state.graph.to_mermaid() }))
}

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::data::fetcher::DataFetcher;
use crate::tools::{tool_definitions, ToolDispatcher};

pub struct AppState {
    pub dispatcher: ToolDispatcher,
    pub fetcher: Arc<DataFetcher>,
}

#[derive(serde::Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(serde::Deserialize)]
struct SymbolParams {
    prefix: Option<String>,
}

pub async fn run_server(state: Arc<AppState>, addr: &str) {
    let app = Router::new()
        .route("/tools/call", post(call_tool))
        .route("/tools", get(list_tools))
        .route("/symbols", get(get_symbols))
        .route("/health", get(health))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    info!("API server listening on {}", addr);
    axum::serve(listener, app).await.unwrap();
}

async fn call_tool(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToolCallRequest>,
) -> impl IntoResponse {
    Json(state.dispatcher.dispatch(&req.name, &req.arguments).await)
}

async fn list_tools() -> impl IntoResponse {
    Json(tool_definitions())
}

async fn get_symbols(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SymbolParams>,
) -> impl IntoResponse {
    let symbols = state.fetcher.get_available_symbols(params.prefix.as_deref());
    Json(json!({
        "exchange": state.fetcher.exchange_name(),
        "count": symbols.len(),
        "symbols": symbols,
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

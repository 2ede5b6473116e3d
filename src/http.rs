use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::error;

use crate::{
    broadcast::{broadcast, BroadcastReport, Pacing},
    database::ChatStore,
    messenger::Messenger,
    providers::QuoteSource,
};

/// What the HTTP routes need besides the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChatStore>,
    pub quotes: Arc<dyn QuoteSource>,
    pub messenger: Arc<dyn Messenger>,
    pub pacing: Pacing,
}

/// `GET /` and `GET /api/cron`. The webhook route is added by teloxide.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/cron", get(cron))
        .with_state(state)
}

async fn index() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

async fn cron(
    State(state): State<AppState>,
) -> Result<Json<BroadcastReport>, (StatusCode, String)> {
    broadcast(
        state.store.as_ref(),
        state.quotes.as_ref(),
        state.messenger.as_ref(),
        state.pacing,
    )
    .await
    .map(Json)
    .map_err(|e| {
        error!("scheduled broadcast failed: {e}");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::warn;

use sentinel_common::SentinelError;
use sentinel_monitor::{MonitorController, SharedState};

pub struct AppState {
    pub state: SharedState,
    pub controller: MonitorController,
}

pub fn router(app: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/api/alerts", get(get_alerts))
        .route("/api/emails", get(get_emails))
        .route("/api/stats", get(get_stats))
        .route("/api/config", get(get_config))
        .route("/api/config/keywords", post(add_keyword))
        .route("/api/config/keywords/{word}", delete(remove_keyword))
        .route("/api/config/recipient", put(set_recipient))
        .route("/api/monitor/start", post(start_monitoring))
        .route("/api/monitor/stop", post(stop_monitoring))
        .with_state(app)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

// --- Query and body structs ---

#[derive(Deserialize)]
pub struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct KeywordBody {
    keyword: String,
}

#[derive(Deserialize)]
pub struct RecipientBody {
    email: String,
}

fn validation_response(e: SentinelError) -> axum::response::Response {
    warn!(error = %e, "Rejected config update");
    (StatusCode::BAD_REQUEST, e.to_string()).into_response()
}

// --- Handlers ---

async fn get_alerts(
    State(app): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> impl IntoResponse {
    Json(app.state.read().await.alerts(params.limit))
}

async fn get_emails(
    State(app): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> impl IntoResponse {
    Json(app.state.read().await.emails(params.limit))
}

async fn get_stats(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    Json(app.state.read().await.stats())
}

async fn get_config(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    Json(app.state.read().await.config())
}

async fn add_keyword(
    State(app): State<Arc<AppState>>,
    Json(body): Json<KeywordBody>,
) -> axum::response::Response {
    let mut state = app.state.write().await;
    match state.add_keyword(&body.keyword) {
        Ok(()) => Json(state.config()).into_response(),
        Err(e) => validation_response(e),
    }
}

async fn remove_keyword(
    State(app): State<Arc<AppState>>,
    Path(word): Path<String>,
) -> impl IntoResponse {
    let mut state = app.state.write().await;
    state.remove_keyword(&word);
    Json(state.config())
}

async fn set_recipient(
    State(app): State<Arc<AppState>>,
    Json(body): Json<RecipientBody>,
) -> axum::response::Response {
    let mut state = app.state.write().await;
    match state.set_target_email(&body.email) {
        Ok(()) => Json(state.config()).into_response(),
        Err(e) => validation_response(e),
    }
}

async fn start_monitoring(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    app.controller.start().await;
    Json(app.state.read().await.config())
}

async fn stop_monitoring(State(app): State<Arc<AppState>>) -> impl IntoResponse {
    app.controller.stop().await;
    Json(app.state.read().await.config())
}

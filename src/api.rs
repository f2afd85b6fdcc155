// src/api.rs
//! HTTP triggers for the dashboard: task completion/undo, a read-only data
//! bundle, and the admin scorecard recompute (basic-auth gated).

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use tower_http::cors::CorsLayer;

use crate::error::{EngineError, Result};
use crate::progression::{self, ProgressionRules, ToggleResponse};
use crate::scorecard::{self, ScorecardRules, SparkScoreSummary};
use crate::store::{JsonStore, PLAYER_DOC, TASKS_DOC};
use crate::types::{Player, TasksData};

pub const ENV_ADMIN_USER: &str = "ADMIN_USER";
pub const ENV_ADMIN_PASS: &str = "ADMIN_PASS";

/// The single credential pair guarding `/admin/*`.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub user: String,
    pub pass: String,
}

impl AdminCredentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
        }
    }

    pub fn from_env() -> Self {
        Self {
            user: std::env::var(ENV_ADMIN_USER).unwrap_or_else(|_| "admin".to_string()),
            pass: std::env::var(ENV_ADMIN_PASS).unwrap_or_else(|_| "changeme".to_string()),
        }
    }

    fn accepts(&self, user: &str, pass: &str) -> bool {
        user == self.user && pass == self.pass
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub progression: Arc<ProgressionRules>,
    pub scorecard: Arc<ScorecardRules>,
    pub admin: Arc<AdminCredentials>,
}

impl AppState {
    pub fn new(
        store: JsonStore,
        progression: ProgressionRules,
        scorecard: ScorecardRules,
        admin: AdminCredentials,
    ) -> Self {
        Self {
            store: Arc::new(store),
            progression: Arc::new(progression),
            scorecard: Arc::new(scorecard),
            admin: Arc::new(admin),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            JsonStore::from_env(),
            ProgressionRules::load_from_env(),
            ScorecardRules::load_from_env(),
            AdminCredentials::from_env(),
        )
    }
}

pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/score/{slug}", post(admin_score))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/dashboard", get(dashboard))
        .route("/api/complete-task", post(complete_task))
        .nest("/admin", admin_routes)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteTaskReq {
    #[serde(default)]
    task_id: Option<String>,
}

async fn complete_task(
    State(state): State<AppState>,
    Json(body): Json<CompleteTaskReq>,
) -> Result<Json<ToggleResponse>> {
    let task_id = body
        .task_id
        .ok_or_else(|| EngineError::Validation("task id required".to_string()))?;
    let today = chrono::Local::now().date_naive();
    let resp = progression::toggle_by_id(&state.store, &state.progression, &task_id, today)?;
    Ok(Json(resp))
}

#[derive(serde::Serialize)]
struct DashboardResp {
    player: Player,
    tasks: TasksData,
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResp>> {
    let player: Player = state.store.read(PLAYER_DOC)?;
    let tasks: TasksData = state.store.read(TASKS_DOC)?;
    Ok(Json(DashboardResp { player, tasks }))
}

async fn admin_score(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SparkScoreSummary>> {
    let now = chrono::Local::now().date_naive();
    let summary = scorecard::score_spark(&state.store, &state.scorecard, &slug, now)?;
    Ok(Json(summary))
}

async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if authorized(&state.admin, &req) {
        return next.run(req).await;
    }
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, r#"Basic realm="Admin Dashboard""#)],
        "Authentication required",
    )
        .into_response()
}

fn authorized(creds: &AdminCredentials, req: &Request) -> bool {
    let Some(value) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let Some(encoded) = value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    match decoded.split_once(':') {
        Some((user, pass)) => creds.accepts(user, pass),
        None => false,
    }
}

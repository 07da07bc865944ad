/// HTTP surface for the workbook tracker.
///
/// Routes:
/// - `GET /health`
/// - `GET /workbooks` — workbook selector
/// - `GET /progress?handle=&workbook=` — progress lookup
/// - `POST /admin/problems/add`, `POST /admin/problems/delete` — form-encoded
///   `admin_key`, `problem_id`, `workbook_key`
use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use judge_common::solvedac::{JudgeApi, SolvedAcClient};

use crate::admin::{AdminHandlers, AdminOutcome, AdminRejection, AdminRequest};
use crate::config::Config;
use crate::error::AppError;
use crate::model::{ProgressOutcome, WorkbookSummary};
use crate::progress::ProgressTracker;
use crate::store::{JsonFilePersistence, WorkbookStore};

#[derive(Clone)]
pub struct AppState {
    store: Arc<WorkbookStore>,
    progress: Arc<ProgressTracker>,
    admin: Arc<AdminHandlers>,
}

impl AppState {
    pub fn new(
        store: Arc<WorkbookStore>,
        judge: Arc<dyn JudgeApi>,
        admin_key: &str,
        progress_concurrency: usize,
    ) -> Self {
        let progress = Arc::new(ProgressTracker::new(
            Arc::clone(&store),
            Arc::clone(&judge),
            progress_concurrency,
        ));
        let admin = Arc::new(AdminHandlers::new(Arc::clone(&store), judge, admin_key));
        Self {
            store,
            progress,
            admin,
        }
    }

    /// Load workbooks from disk and build the live solved.ac client.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let persistence = JsonFilePersistence::new(&config.workbooks_path);
        let store = Arc::new(WorkbookStore::open(Box::new(persistence))?);
        let judge: Arc<dyn JudgeApi> = Arc::new(SolvedAcClient::new(config.solvedac.clone())?);
        Ok(Self::new(
            store,
            judge,
            &config.admin_key,
            config.progress_concurrency,
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/workbooks", get(list_workbooks))
        .route("/progress", get(progress))
        .route("/admin/problems/add", post(add_problem))
        .route("/admin/problems/delete", post(delete_problem))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
struct ProgressParams {
    handle: Option<String>,
    workbook: Option<String>,
}

#[derive(Debug, Serialize)]
struct AdminResponse {
    ok: bool,
    kind: &'static str,
    message: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn list_workbooks(State(state): State<AppState>) -> Json<Vec<WorkbookSummary>> {
    Json(state.store.summaries().await)
}

async fn progress(
    State(state): State<AppState>,
    Query(params): Query<ProgressParams>,
) -> Json<ProgressOutcome> {
    let outcome = state
        .progress
        .lookup_progress(params.handle.as_deref(), params.workbook.as_deref())
        .await;
    Json(outcome)
}

async fn add_problem(
    State(state): State<AppState>,
    Form(req): Form<AdminRequest>,
) -> (StatusCode, Json<AdminResponse>) {
    admin_response(state.admin.add_problem(&req).await)
}

async fn delete_problem(
    State(state): State<AppState>,
    Form(req): Form<AdminRequest>,
) -> (StatusCode, Json<AdminResponse>) {
    admin_response(state.admin.delete_problem(&req).await)
}

fn admin_response(outcome: AdminOutcome) -> (StatusCode, Json<AdminResponse>) {
    let (status, body) = match outcome {
        AdminOutcome::Success(message) => (
            StatusCode::OK,
            AdminResponse {
                ok: true,
                kind: "success",
                message,
            },
        ),
        AdminOutcome::Info(message) => (
            StatusCode::OK,
            AdminResponse {
                ok: true,
                kind: "info",
                message,
            },
        ),
        AdminOutcome::Rejected(rejection) => (
            rejection_status(&rejection),
            AdminResponse {
                ok: false,
                kind: rejection.code(),
                message: rejection.message(),
            },
        ),
    };
    (status, Json(body))
}

fn rejection_status(rejection: &AdminRejection) -> StatusCode {
    match rejection {
        AdminRejection::InvalidAdminKey => StatusCode::UNAUTHORIZED,
        AdminRejection::InvalidProblemId
        | AdminRejection::ProblemNotOnJudge
        | AdminRejection::NotInWorkbook => StatusCode::BAD_REQUEST,
        AdminRejection::UnknownWorkbook => StatusCode::NOT_FOUND,
        AdminRejection::LookupFailed => StatusCode::SERVICE_UNAVAILABLE,
        AdminRejection::PersistFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

//! HTTP API layer.
//!
//! Thin axum surface over the lifecycle manager and registry: validate
//! untrusted submissions, translate registry lookups into response codes,
//! and never let an internal error reach a client verbatim.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config;
use crate::error::ApiError;
use crate::lifecycle::TaskManager;
use crate::types::{TaskParams, TaskRecord, TaskStatus};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    manager: TaskManager,
}

impl AppState {
    pub fn new(manager: TaskManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &TaskManager {
        &self.manager
    }
}

/// Body of `POST /tasks`.
///
/// `task` is optional at the decode level so a missing field produces the
/// specific admission error instead of a generic body-decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    pub task: Option<String>,
    pub working_directory: Option<String>,
    pub model: Option<String>,
    pub max_turns: Option<u32>,
    pub max_tool_repetitions: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

/// Body of a successful `POST /tasks`.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub task_id: String,
    pub status: TaskStatus,
}

/// Body of `GET /tasks`.
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskRecord>,
}

/// Validate a submission and resolve defaults.
///
/// Admission failures happen here, synchronously, before any record exists.
fn admit(request: SubmitRequest) -> Result<TaskParams, ApiError> {
    let task_text = match request.task {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Err(ApiError::MissingTask),
    };

    let working_directory = match request.working_directory {
        None => std::env::current_dir().map_err(|e| ApiError::Internal(e.into()))?,
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        Some(_) => return Err(ApiError::EmptyWorkingDirectory),
    };
    if !working_directory.exists() {
        return Err(ApiError::WorkingDirectoryMissing);
    }

    Ok(TaskParams {
        task_text,
        model: request.model,
        max_turns: request.max_turns.unwrap_or(config::DEFAULT_MAX_TURNS),
        max_tool_repetitions: request
            .max_tool_repetitions
            .unwrap_or(config::DEFAULT_MAX_TOOL_REPETITIONS),
        timeout_seconds: request
            .timeout_seconds
            .unwrap_or(config::DEFAULT_TIMEOUT_SECONDS),
        working_directory,
    })
}

/// `POST /tasks` — admit a task and dispatch its worker.
///
/// Responds 202 as soon as the record exists and the worker is dispatched;
/// it does not wait for `running`.
pub async fn submit_task(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::InvalidJson)?;
    let params = admit(request)?;
    let task_id = state.manager.submit(params)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            task_id,
            status: TaskStatus::Queued,
        }),
    ))
}

/// `GET /tasks` — snapshot of every known task.
pub async fn list_tasks(State(state): State<AppState>) -> Json<TaskListResponse> {
    Json(TaskListResponse {
        tasks: state.manager.registry().list(),
    })
}

/// `GET /tasks/{task_id}` — full record or 404.
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskRecord>, ApiError> {
    state
        .manager
        .registry()
        .get(&task_id)
        .map(Json)
        .ok_or(ApiError::TaskNotFound)
}

/// `GET /health` — liveness only.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Fallback for unrecognized paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Build the router with permissive CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tasks", post(submit_task).get(list_tasks))
        .route("/tasks/{task_id}", get(get_task))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("Task server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::runner::AgentRunner;

    fn state() -> AppState {
        AppState::new(TaskManager::new(AgentRunner::new(AgentConfig {
            program: "/definitely/not/an/agent".to_string(),
            seed_config: PathBuf::from("/nonexistent-seed.yaml"),
        })))
    }

    fn valid_request() -> SubmitRequest {
        SubmitRequest {
            task: Some("write a readme".to_string()),
            working_directory: Some(std::env::temp_dir().to_string_lossy().into_owned()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn health_body_matches_contract() {
        let Json(body) = health().await;
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn submit_returns_accepted_with_queued_status() {
        let state = state();
        let (status, Json(response)) =
            submit_task(State(state.clone()), Ok(Json(valid_request())))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(response.status, TaskStatus::Queued);
        assert!(state.manager().registry().get(&response.task_id).is_some());
    }

    #[tokio::test]
    async fn submit_rejects_missing_task() {
        let request = SubmitRequest {
            task: None,
            ..valid_request()
        };
        let err = submit_task(State(state()), Ok(Json(request)))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingTask));
    }

    #[tokio::test]
    async fn submit_rejects_whitespace_only_task_without_creating_record() {
        let state = state();
        let request = SubmitRequest {
            task: Some("   \n\t ".to_string()),
            ..valid_request()
        };

        let err = submit_task(State(state.clone()), Ok(Json(request)))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::MissingTask));
        assert!(state.manager().registry().list().is_empty());
    }

    #[tokio::test]
    async fn submit_rejects_blank_working_directory() {
        let request = SubmitRequest {
            working_directory: Some("  ".to_string()),
            ..valid_request()
        };
        let err = submit_task(State(state()), Ok(Json(request)))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::EmptyWorkingDirectory));
    }

    #[tokio::test]
    async fn submit_rejects_nonexistent_working_directory_without_creating_record() {
        let state = state();
        let request = SubmitRequest {
            working_directory: Some("/definitely/does/not/exist".to_string()),
            ..valid_request()
        };

        let err = submit_task(State(state.clone()), Ok(Json(request)))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::WorkingDirectoryMissing));
        assert!(state.manager().registry().list().is_empty());
    }

    #[tokio::test]
    async fn submit_resolves_defaults() {
        let state = state();
        let (_, Json(response)) = submit_task(State(state.clone()), Ok(Json(valid_request())))
            .await
            .unwrap();

        let record = state.manager().registry().get(&response.task_id).unwrap();
        assert_eq!(record.max_turns, config::DEFAULT_MAX_TURNS);
        assert_eq!(record.max_tool_repetitions, config::DEFAULT_MAX_TOOL_REPETITIONS);
        assert_eq!(record.timeout_seconds, config::DEFAULT_TIMEOUT_SECONDS);
        assert!(record.model.is_none());
    }

    #[tokio::test]
    async fn get_task_unknown_id_is_task_not_found() {
        let err = get_task(State(state()), Path("nonexistent-id".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::TaskNotFound));
    }

    #[tokio::test]
    async fn list_tasks_reflects_submissions() {
        let state = state();
        for _ in 0..3 {
            submit_task(State(state.clone()), Ok(Json(valid_request())))
                .await
                .unwrap();
        }

        let Json(response) = list_tasks(State(state)).await;
        assert_eq!(response.tasks.len(), 3);
    }

    #[tokio::test]
    async fn fallback_is_generic_not_found() {
        let err = not_found().await;
        assert!(matches!(err, ApiError::NotFound));
        assert_eq!(err.message(), "not found");
    }
}

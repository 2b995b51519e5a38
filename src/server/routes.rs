//! HTTP route handlers
//!
//! Thin JSON shims over the step controller and topic storage. Engine
//! operations (session creation, step, report) run on blocking tasks;
//! listings hit the file store directly.

use super::auth::AuthUser;
use super::state::ServerAppState;
use crate::engine::RetrieverKind;
use crate::error::ApiError;
use crate::models::{Topic, TopicArgs, TopicView};
use crate::session::StepController;
use crate::storage::topics;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CreateTopicRequest {
    pub name: String,
    #[serde(default)]
    pub args: Option<TopicArgs>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub topic_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StepRequest {
    #[serde(default)]
    pub input: Option<String>,
    /// Accepted for client compatibility; the engine decides the speaker
    /// either way.
    #[serde(default)]
    pub observation: Option<bool>,
}

/// Run a blocking controller operation off the async runtime threads
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {}", e)))?
}

/// `POST /topics`
pub async fn create_topic(
    State(state): State<ServerAppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateTopicRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::InvalidInput("name must not be empty".to_string()));
    }

    let args = body.args.unwrap_or_default();
    // Unknown retriever keys are caught here, not on first session
    RetrieverKind::from_key(&args.retriever)
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

    let topic = Topic {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.0,
        name: body.name,
        created_at: chrono::Utc::now(),
        args,
    };
    topics::save_topic(state.controller.data_dir(), &topic).map_err(ApiError::Internal)?;

    Ok((StatusCode::CREATED, Json(json!({ "id": topic.id }))))
}

/// `GET /topics`
pub async fn list_topics(
    State(state): State<ServerAppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<TopicView>>, ApiError> {
    let topics = topics::list_topics(state.controller.data_dir(), &user.0)
        .map_err(ApiError::Internal)?;
    Ok(Json(
        topics
            .into_iter()
            .map(|t| TopicView {
                id: t.id,
                name: t.name,
                args: t.args,
            })
            .collect(),
    ))
}

/// `DELETE /topics/{id}` — cascades sessions, messages and reports
pub async fn delete_topic(
    State(state): State<ServerAppState>,
    Extension(user): Extension<AuthUser>,
    Path(topic_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.controller.delete_topic(&user.0, &topic_id)?;
    Ok(Json(json!({ "message": "Topic deleted successfully" })))
}

/// `GET /topics/{id}/sessions`
pub async fn topic_sessions(
    State(state): State<ServerAppState>,
    Extension(user): Extension<AuthUser>,
    Path(topic_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = state.controller.topic_sessions(&user.0, &topic_id)?;
    Ok(Json(summaries))
}

/// `POST /sessions` — warm-starts a fresh engine from topic args
pub async fn create_session(
    State(state): State<ServerAppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let controller: Arc<StepController> = state.controller.clone();
    let created =
        run_blocking(move || controller.create_session(&user.0, &body.topic_id)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /sessions/{session_id}/step`
pub async fn step_session(
    State(state): State<ServerAppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
    Json(body): Json<StepRequest>,
) -> Result<impl IntoResponse, ApiError> {
    log::debug!(
        "step session {} (input: {}, observation: {:?})",
        session_id,
        body.input.is_some(),
        body.observation
    );

    let controller = state.controller.clone();
    let outcome =
        run_blocking(move || controller.step(&user.0, &session_id, body.input.as_deref())).await?;
    Ok(Json(outcome))
}

/// `POST /sessions/{session_id}/report`
pub async fn generate_report(
    State(state): State<ServerAppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = state.controller.clone();
    let finalized = run_blocking(move || controller.finalize(&user.0, &session_id)).await?;
    Ok(Json(finalized))
}

/// `GET /sessions/{session_id}/messages`
pub async fn session_messages(
    State(state): State<ServerAppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state.controller.messages(&user.0, &session_id)?;
    Ok(Json(messages))
}

/// `GET /sessions/{session_id}/reports`
pub async fn session_reports(
    State(state): State<ServerAppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let reports = state.controller.reports(&user.0, &session_id)?;
    Ok(Json(reports))
}

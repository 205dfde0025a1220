//! Form session routes: `/v1/forms/*`
//!
//! Drive one multi-step form per session. Every mutating call answers with
//! the updated [`FormSnapshot`] so the client can re-render the step.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lanas_core::form::{FieldId, FieldValue, Transition};

use crate::error::AppError;
use crate::routes::leads::{SubmissionResponse, respond};
use crate::sessions::FormSnapshot;
use crate::state::AppState;

/// Build the `/v1/forms` router.
///
/// Paths:
/// - `POST   /v1/forms`: open a session
/// - `GET    /v1/forms/{id}`: snapshot
/// - `DELETE /v1/forms/{id}`: discard
/// - `PUT    /v1/forms/{id}/fields/{field}`: set a value
/// - `POST   /v1/forms/{id}/fields/{field}/toggle`: toggle a multi-select code
/// - `POST   /v1/forms/{id}/advance`, `/retreat`, `/submit`
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_form))
        .route("/{id}", get(get_form).delete(discard_form))
        .route("/{id}/fields/{field}", put(set_field))
        .route("/{id}/fields/{field}/toggle", post(toggle_field))
        .route("/{id}/advance", post(advance))
        .route("/{id}/retreat", post(retreat))
        .route("/{id}/submit", post(submit))
}

// ── Request / Response types ─────────────────────────────────────────

/// Request body for `PUT /v1/forms/{id}/fields/{field}`.
#[derive(Debug, Deserialize)]
pub struct SetFieldRequest {
    /// A string for single-valued fields, a list of codes for multi-selects.
    pub value: FieldValue,
}

/// Request body for `POST /v1/forms/{id}/fields/{field}/toggle`.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub code: String,
    pub included: bool,
}

/// Response body for `POST /v1/forms/{id}/advance`.
#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    #[serde(flatten)]
    pub transition: Transition,
    pub form: FormSnapshot,
}

/// Response body for `POST /v1/forms/{id}/submit`.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub lead: SubmissionResponse,
    /// The session after submission: back on step 1 and empty. Absent if
    /// the session no longer exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<FormSnapshot>,
}

fn parse_field(name: &str) -> Result<FieldId, AppError> {
    Ok(name.parse::<FieldId>()?)
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn create_form(State(state): State<Arc<AppState>>) -> (StatusCode, Json<FormSnapshot>) {
    let snapshot = state.sessions.create().await;
    tracing::debug!(session = %snapshot.id, "form session opened");
    (StatusCode::CREATED, Json(snapshot))
}

async fn get_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormSnapshot>, AppError> {
    Ok(Json(state.sessions.snapshot(id).await?))
}

async fn discard_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_field(
    State(state): State<Arc<AppState>>,
    Path((id, field)): Path<(Uuid, String)>,
    Json(body): Json<SetFieldRequest>,
) -> Result<Json<FormSnapshot>, AppError> {
    let field = parse_field(&field)?;
    let (result, snapshot) = state
        .sessions
        .update(id, |form| match body.value {
            FieldValue::Text(text) => form.set_field(field, text),
            FieldValue::Selection(codes) => form.set_selection(field, codes),
        })
        .await?;
    result?;
    Ok(Json(snapshot))
}

async fn toggle_field(
    State(state): State<Arc<AppState>>,
    Path((id, field)): Path<(Uuid, String)>,
    Json(body): Json<ToggleRequest>,
) -> Result<Json<FormSnapshot>, AppError> {
    let field = parse_field(&field)?;
    let (result, snapshot) = state
        .sessions
        .update(id, |form| {
            form.toggle_multi_value(field, &body.code, body.included)
        })
        .await?;
    result?;
    Ok(Json(snapshot))
}

async fn advance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdvanceResponse>, AppError> {
    let (result, form) = state.sessions.update(id, |form| form.advance()).await?;
    let transition = result?;
    Ok(Json(AdvanceResponse { transition, form }))
}

async fn retreat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormSnapshot>, AppError> {
    let ((), snapshot) = state
        .sessions
        .update(id, |form| {
            form.retreat();
        })
        .await?;
    Ok(Json(snapshot))
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let mut form = state.sessions.begin_submit(id).await?;

    // Detached so the session is released even when the client disconnects
    // and this handler is dropped mid-submit.
    let task = {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let outcome = state.pipeline.submit_form(&mut form).await;
            let snapshot = state.sessions.finish_submit(id, form).await;
            (outcome, snapshot)
        })
    };
    let (outcome, snapshot) = task.await.map_err(|e| {
        tracing::error!(session = %id, error = %e, "submission task failed");
        AppError::Internal("could not save your answers, please try again".to_owned())
    })?;

    let (status, Json(lead)) = respond(outcome)?;
    Ok((status, Json(SubmitResponse { lead, form: snapshot })))
}

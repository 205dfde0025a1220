//! One-shot lead submission: `POST /v1/leads`
//!
//! Accepts the complete answer set in one request (for clients that keep
//! the form state themselves) and runs it through the same pipeline as a
//! form session submit.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use lanas_core::form::{FieldId, FieldValue, FormFields};
use lanas_core::pipeline::Outcome;

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/v1/leads` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(submit_lead))
}

/// Response body for a stored submission.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Map a pipeline outcome to an HTTP response.
pub(crate) fn respond(outcome: Outcome) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    match outcome {
        Outcome::Success(lead) => Ok((
            StatusCode::CREATED,
            Json(SubmissionResponse {
                id: lead.id,
                created_at: lead.created_at,
            }),
        )),
        Outcome::Invalid(err) => Err(err.into()),
        // Already logged by the pipeline.
        Outcome::StorageError(_) => Err(AppError::Internal(
            "could not save your answers, please try again".to_owned(),
        )),
    }
}

async fn submit_lead(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BTreeMap<String, FieldValue>>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    let mut values = BTreeMap::new();
    for (name, value) in body {
        let field: FieldId = name
            .parse()
            .map_err(|e: lanas_core::error::FormError| AppError::BadRequest(e.to_string()))?;
        values.insert(field, value);
    }
    let fields = FormFields::from_values(values)?;

    respond(state.pipeline.submit(&fields).await)
}

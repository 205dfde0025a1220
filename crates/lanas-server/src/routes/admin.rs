//! Admin routes: `/v1/admin/*`
//!
//! Mounted behind [`admin_auth`](crate::middleware::admin_auth). The lead
//! routes additionally require a privileged identity.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use lanas_core::export::{export_filename, leads_to_csv};
use lanas_core::lead::{LabeledLead, Lead};

use crate::error::AppError;
use crate::middleware::AdminIdentity;
use crate::state::AppState;

/// Build the identity router (`GET /v1/admin/me`).
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/me", get(whoami))
}

/// Build the lead viewer router, nested at `/v1/admin/leads`.
pub fn leads_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_leads))
        .route("/export", get(export_leads))
        .route("/{id}", get(get_lead))
}

/// Response body for `GET /v1/admin/leads`.
#[derive(Debug, Serialize)]
pub struct LeadListResponse {
    pub count: usize,
    pub leads: Vec<Lead>,
}

/// Response body for `GET /v1/admin/leads/{id}`.
#[derive(Debug, Serialize)]
pub struct LeadDetailResponse<'a> {
    pub lead: &'a Lead,
    /// The same answers with catalog codes replaced by display labels.
    pub labeled: LabeledLead<'a>,
}

async fn whoami(Extension(identity): Extension<AdminIdentity>) -> Json<AdminIdentity> {
    Json(identity)
}

async fn list_leads(State(state): State<Arc<AppState>>) -> Result<Json<LeadListResponse>, AppError> {
    let leads = state.leads.list_all().await?;
    Ok(Json(LeadListResponse {
        count: leads.len(),
        leads,
    }))
}

async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let lead = state
        .leads
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("lead {id} not found")))?;
    let body = LeadDetailResponse {
        lead: &lead,
        labeled: lead.labeled(),
    };
    Ok(Json(body).into_response())
}

async fn export_leads(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let leads = state.leads.list_all().await?;
    let csv = leads_to_csv(&leads);
    let filename = export_filename(Utc::now().date_naive());
    tracing::info!(count = leads.len(), file = %filename, "leads exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}

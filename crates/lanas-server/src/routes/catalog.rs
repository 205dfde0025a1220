//! Catalog route: `GET /v1/catalog`
//!
//! Everything a client needs to render the form: the options of every
//! choice question and the step plan with its field rules.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use lanas_core::catalog::{CategoryOptions, all_options};
use lanas_core::steps::StepPlan;

use crate::state::AppState;

/// Build the `/v1/catalog` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(catalog))
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub categories: Vec<CategoryOptions>,
    pub steps: StepPlan,
}

async fn catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        categories: all_options(),
        steps: StepPlan::lead_intake(),
    })
}

//! HTTP routes and router assembly.

pub mod admin;
pub mod catalog;
pub mod forms;
pub mod leads;
pub mod sys;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::middleware as axum_mw;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{admin_auth, require_privileged};
use crate::state::AppState;

/// Concurrent in-flight requests allowed on the public submission routes.
const PUBLIC_CONCURRENCY_LIMIT: usize = 64;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Lead data needs a privileged identity; `/me` only an authenticated one.
    let admin_routes = Router::new()
        .nest(
            "/leads",
            admin::leads_router().route_layer(axum_mw::from_fn(require_privileged)),
        )
        .merge(admin::router())
        .route_layer(axum_mw::from_fn_with_state(Arc::clone(&state), admin_auth));

    let public_routes = Router::new()
        .nest("/v1/forms", forms::router())
        .nest("/v1/leads", leads::router())
        .layer(tower::limit::ConcurrencyLimitLayer::new(
            PUBLIC_CONCURRENCY_LIMIT,
        ));

    // The landing page is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/v1/sys", sys::router())
        .nest("/v1/catalog", catalog::router())
        .nest("/v1/admin", admin_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

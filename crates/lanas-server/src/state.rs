//! Shared application state for the Lanas server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. It holds the submission pipeline, the lead store
//! it writes to, the form session table and the admin token digests.

use std::sync::Arc;
use std::time::Duration;

use lanas_core::notify::Notifier;
use lanas_core::pipeline::SubmissionPipeline;
use lanas_core::store::LeadStore;

use crate::middleware::AdminTokens;
use crate::sessions::SessionStore;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Validate, store, notify.
    pub pipeline: SubmissionPipeline,
    /// Read side of the same store the pipeline writes to.
    pub leads: Arc<dyn LeadStore>,
    /// Live form sessions.
    pub sessions: SessionStore,
    /// Accepted admin bearer tokens.
    pub admin_tokens: AdminTokens,
}

impl AppState {
    #[must_use]
    pub fn new(
        leads: Arc<dyn LeadStore>,
        notifier: Arc<dyn Notifier>,
        admin_tokens: AdminTokens,
        session_ttl: Duration,
    ) -> Self {
        Self {
            pipeline: SubmissionPipeline::new(Arc::clone(&leads), notifier),
            leads,
            sessions: SessionStore::new(session_ttl),
            admin_tokens,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("storage", &self.leads.backend_name())
            .finish_non_exhaustive()
    }
}

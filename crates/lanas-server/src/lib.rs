//! Lanas HTTP server.
//!
//! Wires the lead-intake core, the lead store and the HTTP routes into a
//! running Axum server. Serves the public form API at `/v1/forms` and
//! `/v1/leads`, and the token-protected lead viewer at `/v1/admin`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod notify;
#[cfg(feature = "postgres-backend")]
pub mod repository;
pub mod routes;
pub mod sessions;
pub mod state;

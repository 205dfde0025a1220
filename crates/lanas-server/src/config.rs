//! Server configuration for Lanas.
//!
//! Loads configuration from environment variables with defaults suited to a
//! local development run. Every setting can be overridden via `LANAS_*`
//! variables; `PORT`, `DATABASE_URL` and `RESEND_API_KEY` follow the usual
//! hosting conventions.

use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;

/// Sender used by the original landing page.
pub const DEFAULT_MAIL_FROM: &str = "Lanas Finanças <onboarding@resend.dev>";

/// Resend API endpoint.
pub const DEFAULT_RESEND_URL: &str = "https://api.resend.com/emails";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Where leads are stored.
    pub storage_backend: StorageBackendType,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Bearer token granting the privileged admin identity.
    pub admin_token: Option<String>,
    /// Bearer token of an authenticated, unprivileged staff identity.
    pub staff_token: Option<String>,
    /// Confirmation email settings; `None` disables sending.
    pub mail: Option<MailConfig>,
    /// Idle lifetime of a form session.
    pub session_ttl: Duration,
    /// How often expired sessions are swept.
    pub session_sweep_interval: Duration,
}

/// Resend email settings.
#[derive(Clone)]
pub struct MailConfig {
    pub api_key: String,
    pub from: String,
    pub endpoint: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_key", &"[redacted]")
            .field("from", &self.from)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, leads lost on restart).
    Memory,
    /// Redb single-file storage.
    Redb { path: String },
    /// PostgreSQL `leads` table.
    Postgres { url: String },
}

impl StorageBackendType {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb { .. } => "redb",
            Self::Postgres { .. } => "postgres",
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - `LANAS_BIND_ADDR`: full bind address (default `127.0.0.1:8080`)
    /// - `PORT`: port to bind on `0.0.0.0` when `LANAS_BIND_ADDR` is unset
    /// - `LANAS_STORAGE`: `memory`, `redb` or `postgres` (default `memory`)
    /// - `LANAS_STORAGE_PATH`: redb file (default `./data/leads.redb`)
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `LANAS_LOG_LEVEL`: log filter (default `info`)
    /// - `LANAS_ADMIN_TOKEN`, `LANAS_STAFF_TOKEN`: admin bearer tokens
    /// - `RESEND_API_KEY`, `LANAS_MAIL_FROM`, `LANAS_RESEND_URL`: email
    /// - `LANAS_SESSION_TTL`: form session idle TTL in seconds (default `1800`)
    /// - `LANAS_SESSION_SWEEP_INTERVAL`: seconds between sweeps (default `60`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let default_addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));

        // Priority: LANAS_BIND_ADDR > PORT > default.
        let bind_addr = if let Some(addr) = non_empty("LANAS_BIND_ADDR") {
            addr.parse().unwrap_or(default_addr)
        } else if let Some(port) = non_empty("PORT") {
            SocketAddr::from(([0, 0, 0, 0], port.parse().unwrap_or(DEFAULT_PORT)))
        } else {
            default_addr
        };

        let storage_backend = match non_empty("LANAS_STORAGE")
            .unwrap_or_else(|| "memory".to_owned())
            .to_lowercase()
            .as_str()
        {
            "redb" => StorageBackendType::Redb {
                path: non_empty("LANAS_STORAGE_PATH")
                    .unwrap_or_else(|| "./data/leads.redb".to_owned()),
            },
            "postgres" | "postgresql" => StorageBackendType::Postgres {
                url: non_empty("DATABASE_URL")
                    .unwrap_or_else(|| "postgres://localhost/lanas".to_owned()),
            },
            _ => StorageBackendType::Memory,
        };

        let mail = non_empty("RESEND_API_KEY").map(|api_key| MailConfig {
            api_key,
            from: non_empty("LANAS_MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_owned()),
            endpoint: non_empty("LANAS_RESEND_URL")
                .unwrap_or_else(|| DEFAULT_RESEND_URL.to_owned()),
        });

        let seconds = |key: &str, default: u64| {
            Duration::from_secs(
                non_empty(key)
                    .and_then(|v| v.parse().ok())
                    .filter(|&s: &u64| s > 0)
                    .unwrap_or(default),
            )
        };

        Self {
            bind_addr,
            storage_backend,
            log_level: non_empty("LANAS_LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
            admin_token: non_empty("LANAS_ADMIN_TOKEN"),
            staff_token: non_empty("LANAS_STAFF_TOKEN"),
            mail,
            session_ttl: seconds("LANAS_SESSION_TTL", 1800),
            session_sweep_interval: seconds("LANAS_SESSION_SWEEP_INTERVAL", 60),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

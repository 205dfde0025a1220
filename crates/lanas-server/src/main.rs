//! Lanas server entry point.
//!
//! Opens the lead store, picks the confirmation notifier, then starts the
//! Axum HTTP server with graceful shutdown. A background worker expires idle
//! form sessions and is cancelled on shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use lanas_core::notify::{LogNotifier, Notifier};
use lanas_core::store::{KvLeadStore, LeadStore};
use lanas_storage::MemoryBackend;

use lanas_server::config::{ServerConfig, StorageBackendType};
use lanas_server::middleware::AdminTokens;
use lanas_server::notify::ResendNotifier;
use lanas_server::routes::build_router;
use lanas_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(storage = config.storage_backend.name(), "Lanas starting");

    let state = Arc::new(build_app_state(&config).await?);

    // Shutdown signal channel.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper_handle = {
        let state = Arc::clone(&state);
        let mut rx = shutdown_rx.clone();
        let interval = config.session_sweep_interval;
        tokio::spawn(async move {
            session_sweep_worker(state, &mut rx, interval).await;
        })
    };

    let app = build_router(Arc::clone(&state));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Lanas server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("server error")?;

    info!("waiting for background workers to stop");
    let _ = tokio::time::timeout(Duration::from_secs(10), sweeper_handle).await;

    info!("Lanas server stopped");
    Ok(())
}

async fn build_app_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let leads = build_lead_store(&config.storage_backend).await?;

    let notifier: Arc<dyn Notifier> = match &config.mail {
        Some(mail) => {
            info!(from = %mail.from, "confirmation emails enabled");
            Arc::new(ResendNotifier::new(mail.clone()))
        }
        None => {
            warn!("RESEND_API_KEY not set, confirmation emails disabled");
            Arc::new(LogNotifier)
        }
    };

    let admin_tokens = AdminTokens::new(config.admin_token.as_deref(), config.staff_token.as_deref());
    if !admin_tokens.is_enabled() {
        warn!("LANAS_ADMIN_TOKEN not set, admin routes will reject every request");
    }

    Ok(AppState::new(leads, notifier, admin_tokens, config.session_ttl))
}

async fn build_lead_store(backend: &StorageBackendType) -> anyhow::Result<Arc<dyn LeadStore>> {
    let store: Arc<dyn LeadStore> = match backend {
        StorageBackendType::Memory => {
            info!("using in-memory storage (leads will not persist)");
            Arc::new(KvLeadStore::new(Arc::new(MemoryBackend::new())))
        }
        #[cfg(feature = "redb-backend")]
        StorageBackendType::Redb { path } => {
            info!(path = %path, "using redb storage");
            Arc::new(KvLeadStore::new(Arc::new(
                lanas_storage::RedbBackend::open(path).context("failed to open redb storage")?,
            )))
        }
        #[cfg(not(feature = "redb-backend"))]
        StorageBackendType::Redb { .. } => {
            anyhow::bail!("redb backend requested but feature 'redb-backend' is not enabled");
        }
        #[cfg(feature = "postgres-backend")]
        StorageBackendType::Postgres { url } => {
            info!(url = %"[redacted]", "using PostgreSQL storage");
            Arc::new(
                lanas_server::repository::PgLeadStore::connect(url)
                    .await
                    .context("failed to connect to PostgreSQL storage")?,
            )
        }
        #[cfg(not(feature = "postgres-backend"))]
        StorageBackendType::Postgres { .. } => {
            anyhow::bail!(
                "PostgreSQL backend requested but feature 'postgres-backend' is not enabled"
            );
        }
    };
    Ok(store)
}

/// Background worker that drops form sessions idle past their TTL.
async fn session_sweep_worker(
    state: Arc<AppState>,
    shutdown: &mut watch::Receiver<bool>,
    every: Duration,
) {
    let mut interval = tokio::time::interval(every);
    info!(interval_secs = every.as_secs(), "session sweeper started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let removed = state.sessions.sweep().await;
                if removed > 0 {
                    info!(removed, "expired form sessions removed");
                }
            }
            _ = shutdown.changed() => {
                info!("session sweeper shutting down");
                return;
            }
        }
    }
}

/// Wait for SIGINT or SIGTERM, then broadcast shutdown.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
    let _ = shutdown_tx.send(true);
}

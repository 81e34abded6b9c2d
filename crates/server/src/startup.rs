use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::identity::IdentityConfig;
use crate::routes::{self, ServerState};
use service::{
    ids::UuidGenerator,
    runtime,
    storage::{JsonMapStore, MemoryMapStore},
    tickets::{SharedTicketStore, Ticket, TicketService},
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the configured ticket store: JSON file under `data_dir`, or memory only.
pub async fn build_store(cfg: &AppConfig) -> Result<SharedTicketStore, StartupError> {
    if !cfg.storage.persist {
        info!("ticket persistence disabled; using in-memory store");
        return Ok(Arc::new(MemoryMapStore::<String, Ticket>::new()));
    }
    runtime::ensure_env(&cfg.storage.data_dir).await?;
    let path = cfg.storage.tickets_path();
    let store = JsonMapStore::<String, Ticket>::new(&path).await?;
    info!(path = %path.display(), "ticket store opened");
    Ok(Arc::new(store))
}

pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let store = build_store(cfg).await?;
    Ok(ServerState {
        tickets: Arc::new(TicketService::new(store, Arc::new(UuidGenerator))),
        identity: IdentityConfig {
            jwt_secret: cfg.auth.jwt_secret.clone(),
            allow_caller_header: cfg.auth.allow_caller_header,
        },
    })
}

/// Build the app from `cfg` and serve until `shutdown` resolves.
pub async fn run_with_shutdown<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr: SocketAddr = cfg
        .server
        .bind_addr()
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address: {e}")))?;
    info!(%addr, persist = cfg.storage.persist, "starting ticket server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

//! NavTree HTTP server
//!
//! Wires configuration, the chosen node store and the tree engine into an
//! axum application. The binary in `main.rs` is a thin wrapper around
//! [`start_server`].

pub mod api;
pub mod config;

use std::sync::Arc;

use navtree_core::db::{FileStore, MemoryStore, NodeStore};
use navtree_core::services::TreeService;

pub use api::{create_router, AppState, HttpError};
pub use config::{ConfigError, ServerConfig, StoreKind};

/// Open the configured store and build a seeded engine over it
pub async fn build_service(config: &ServerConfig) -> anyhow::Result<TreeService> {
    let store: Arc<dyn NodeStore> = match config.store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::File => Arc::new(FileStore::open(&config.data_path).await?),
    };

    let service = TreeService::new(store, config.tree.clone())?;
    if let Some(seeded) = service.ensure_seeded().await? {
        tracing::info!(node_id = %seeded.id, "Created placeholder folder in empty tree");
    }
    Ok(service)
}

/// Log every committed tree change at debug level
fn spawn_event_logger(service: &TreeService) {
    let mut rx = service.subscribe_to_events();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => tracing::debug!(event = event.event_type(), "Tree changed"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger fell behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Start the HTTP server and serve until the process exits
///
/// # Errors
///
/// Returns error if configuration is invalid, the store cannot be opened,
/// or the listener fails to bind.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let service = build_service(&config).await?;
    spawn_event_logger(&service);

    let app = create_router(AppState::new(service)).layer(api::cors_layer(&config.cors_origins));

    let addr = config.addr();
    tracing::info!("HTTP server starting on http://{}", addr);
    match config.store {
        StoreKind::File => tracing::info!("Store: {}", config.data_path.display()),
        StoreKind::Memory => tracing::info!("Store: in-memory (data is lost on exit)"),
    }
    tracing::info!("CORS origins: {}", config.cors_origins.join(", "));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

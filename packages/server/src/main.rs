//! NavTree HTTP Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Default settings (port 3001, ~/.navtree/tree.json)
//! cargo run --bin navtree-server
//!
//! # In-memory store on another port
//! NAVTREE_STORE=memory NAVTREE_PORT=3002 cargo run --bin navtree-server
//! ```
//!
//! # Environment Variables
//!
//! See `ServerConfig::from_env`. Logging is controlled with `RUST_LOG`
//! (e.g. "info", "navtree_core=debug", "navtree::audit=info").
//!
//! # Security
//!
//! No authentication. Actor headers are trusted as sent.

use navtree_server::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("NavTree HTTP Server");

    let config = ServerConfig::from_env()?;
    start_server(config).await
}

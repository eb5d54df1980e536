//! serve command - Run the token registry server
//!
//! # Design
//!
//! Builds a multi-threaded tokio runtime, binds the configured address and
//! serves until Ctrl-C or SIGTERM. The registry starts empty and is dropped
//! with the process.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::info;

use crate::cli::Context;
use crate::core::registry::TokenRegistry;
use crate::rpc::Server;

/// Run the server until a termination signal arrives.
pub fn serve(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let addr = ctx.server_addr(&config);

    let runtime = super::runtime()?;
    runtime.block_on(async move {
        let registry = Arc::new(TokenRegistry::new());
        let server = Server::bind(addr.as_str(), registry)
            .await
            .with_context(|| format!("Failed to listen on {}", addr))?;

        server
            .serve(shutdown_signal())
            .await
            .context("Server failed")?;

        Ok(())
    })
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C"),
        _ = terminate => info!("received SIGTERM"),
    }
}

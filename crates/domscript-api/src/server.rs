use crate::{create_router, AppState};
use domscript_core::{DomScriptConfig, Result};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

pub struct Server {
    state: AppState,
    addr: SocketAddr,
}

impl Server {
    pub fn new(addr: SocketAddr, config: &DomScriptConfig) -> Self {
        Self::with_state(addr, AppState::new(config))
    }

    pub fn with_state(addr: SocketAddr, state: AppState) -> Self {
        Self { state, addr }
    }

    pub async fn run(self) -> Result<()> {
        let generator = &self.state.generator;
        match (generator.provider_name(), generator.model_name()) {
            (Some(provider), Some(model)) => info!(
                "Model generation via {} ({}), quality gate runs on first request",
                provider, model
            ),
            _ => info!("Rule engine only"),
        }
        info!("Saved scripts at {}", self.state.scripts.path().display());

        let router = create_router(self.state);
        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        info!("DomScript API listening on http://{}", self.addr);
        info!("  GET  /generate?prompt=<text>");
        info!("  POST /save_script");
        info!("  GET  /get_saved_scripts");
        info!("  GET  /export_userscript/{{id}}");
        info!("  GET  /system_info");
        info!("  GET  /health");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}

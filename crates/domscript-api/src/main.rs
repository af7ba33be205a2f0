use anyhow::{Context, Result};
use domscript_api::{init_tracing, Server};
use domscript_core::ConfigManager;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<()> {
    let manager = ConfigManager::load().context("Failed to load configuration")?;
    let config = manager.config();
    domscript_patterns::validate_config(config).context("Invalid configuration")?;
    init_tracing(&config.logging);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;

    Server::new(addr, config).run().await?;
    Ok(())
}

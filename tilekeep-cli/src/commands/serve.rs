//! Serve command - HTTP tile server over the store.

use console::style;
use tilekeep::app::{AppConfig, TileKeepApp};
use tilekeep::server::TileServer;

use super::common::interrupt_signal;
use crate::error::CliError;

/// Serve tiles until Ctrl+C.
pub async fn run(config: AppConfig, ip: &str, port: u16) -> Result<(), CliError> {
    let app = TileKeepApp::start(config).await?;
    let interrupt = interrupt_signal()?;

    let mut server = TileServer::new(ip, port, app.layer().clone());
    let addr = match server.start().await {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "Tile server failed to start");
            app.shutdown().await;
            return Err(e.into());
        }
    };

    println!("Serving {}", style(app.layer().url_template()).cyan());
    println!("  Tiles:  http://{}/tiles/{{z}}/{{x}}/{{y}}", addr);
    println!("  Status: http://{}/api/status.json", addr);
    println!();
    println!("Press Ctrl+C to stop.");

    tracing::info!(%addr, "Tile server listening");

    interrupt.notified().await;
    tracing::info!("Interrupt received, stopping tile server");
    println!();
    println!("Shutting down...");

    server.stop().await;
    app.shutdown().await;
    Ok(())
}

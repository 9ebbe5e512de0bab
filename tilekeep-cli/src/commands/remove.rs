//! Remove commands - delete all or one stored tile.

use tilekeep::app::{AppConfig, TileKeepApp};
use tilekeep::control::SaveStatus;

use super::common::{PromptHook, TileArgs};
use crate::error::CliError;

fn remove_prompt(status: &SaveStatus) -> String {
    format!("Remove all {} stored tiles?", status.storage_size)
}

/// Remove every stored tile.
pub async fn run_all(mut config: AppConfig, yes: bool) -> Result<(), CliError> {
    if !yes {
        config.control = config
            .control
            .with_confirm_removal(PromptHook::new(remove_prompt));
    }
    let app = TileKeepApp::start(config).await?;

    let result = match app.control().remove_tiles().await {
        Ok(Some(report)) => {
            tracing::info!(removed = report.removed, "Removed all stored tiles");
            println!("Removed {} tiles.", report.removed);
            Ok(())
        }
        Ok(None) => {
            println!("Nothing removed.");
            Ok(())
        }
        Err(e) => Err(CliError::from(e)),
    };

    app.shutdown().await;
    result
}

/// Remove one tile of the configured layer.
pub async fn run_one(config: AppConfig, tile: TileArgs) -> Result<(), CliError> {
    let app = TileKeepApp::start(config).await?;
    let coord = tile.coord();

    let result = app.control().remove_tile(coord).await;
    match &result {
        Ok(true) => println!("Removed tile {}.", coord),
        Ok(false) => println!("Tile {} was not stored.", coord),
        Err(_) => {}
    }

    app.shutdown().await;
    result.map(|_| ()).map_err(CliError::from)
}

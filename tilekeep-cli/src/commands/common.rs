//! Common types and utilities shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use clap::Args;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use tilekeep::cache::BoxFuture;
use tilekeep::config::{config_file_path, ConfigFile};
use tilekeep::control::{ConfirmationHook, SaveStatus};
use tilekeep::coord::TileCoord;
use tokio::sync::Notify;

use crate::error::CliError;

/// Tile address arguments: `z x y`.
#[derive(Debug, Clone, Args)]
pub struct TileArgs {
    /// Zoom level
    pub z: u8,
    /// Column
    pub x: u32,
    /// Row, counted from the north edge
    pub y: u32,
}

impl TileArgs {
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.x, self.y, self.z)
    }
}

/// Load the config file at `path`, or the default location.
///
/// A missing file yields the defaults; a malformed one is an error.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    Ok(ConfigFile::load_from(&path)?)
}

/// Terminal yes/no prompt used as a confirmation hook.
///
/// Runs on the blocking pool so the prompt never stalls the runtime.
pub struct PromptHook {
    render: fn(&SaveStatus) -> String,
}

impl PromptHook {
    pub fn new(render: fn(&SaveStatus) -> String) -> Self {
        Self { render }
    }
}

impl ConfirmationHook for PromptHook {
    fn confirm<'a>(&'a self, status: &'a SaveStatus) -> BoxFuture<'a, bool> {
        let prompt = (self.render)(status);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .unwrap_or(false)
            })
            .await
            .unwrap_or(false)
        })
    }
}

/// Notified once when Ctrl+C is pressed.
pub fn interrupt_signal() -> Result<Arc<Notify>, CliError> {
    let notify = Arc::new(Notify::new());
    let handler_notify = Arc::clone(&notify);
    ctrlc::set_handler(move || {
        handler_notify.notify_one();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;
    Ok(notify)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(Some(&temp_dir.path().join("absent.ini"))).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_load_malformed_config_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[cache]\nbackend = tape\n").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(CliError::Config(_))));
    }

    #[test]
    fn test_tile_args_coord() {
        let args = TileArgs { z: 4, x: 2, y: 3 };
        assert_eq!(args.coord(), TileCoord::new(2, 3, 4));
    }
}

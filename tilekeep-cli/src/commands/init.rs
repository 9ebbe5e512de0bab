//! Init command - initialize configuration file.

use std::path::Path;

use console::style;
use tilekeep::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
pub fn run(path: Option<&Path>) -> Result<(), CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);

    if ConfigFile::ensure_exists_at(&path)? {
        println!("Created configuration file:");
    } else {
        println!("Configuration file already exists:");
    }
    println!("  {}", style(path.display()).cyan());
    println!();
    println!("Edit this file to choose the tile layer and storage location.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

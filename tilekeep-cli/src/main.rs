//! Tilekeep CLI - Command-line interface
//!
//! Saves the tiles of a map area for offline use, inspects and removes
//! them, and serves them back over HTTP.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilekeep::app::AppConfig;
use tilekeep::logging::init_logging;

use commands::common::{load_config, TileArgs};
use commands::save::SaveArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "tilekeep")]
#[command(version, about = "Save map tiles for offline use", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.tilekeep/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tile URL template, overriding the configured layer
    #[arg(long, global = true)]
    template: Option<String>,

    /// Mirror log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file if none exists
    Init,

    /// Download and store the tiles of an area
    Save(SaveArgs),

    /// Remove every stored tile
    Remove {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove one stored tile
    RemoveTile(TileArgs),

    /// Show storage statistics
    Stats,

    /// List stored tiles of the layer
    List {
        /// Print a GeoJSON FeatureCollection instead of a table
        #[arg(long)]
        geojson: bool,
    },

    /// Write one tile to a file, from storage when saved
    Get {
        #[command(flatten)]
        tile: TileArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Serve tiles over HTTP, stored first
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1")]
        ip: String,

        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if let Commands::Init = cli.command {
        return commands::init::run(cli.config.as_deref());
    }

    let config = load_config(cli.config.as_deref())?;
    let _logging_guard = init_logging(&config.logging.file, cli.verbose)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let mut app_config = AppConfig::from_config_file(&config);
    if let Some(template) = cli.template {
        app_config = app_config.with_url_template(template);
    }

    let runtime = tokio::runtime::Runtime::new().map_err(|e| CliError::Runtime(e.to_string()))?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Init => Ok(()),
            Commands::Save(args) => commands::save::run(app_config, args).await,
            Commands::Remove { yes } => commands::remove::run_all(app_config, yes).await,
            Commands::RemoveTile(tile) => commands::remove::run_one(app_config, tile).await,
            Commands::Stats => commands::tiles::run_stats(app_config).await,
            Commands::List { geojson } => commands::tiles::run_list(app_config, geojson).await,
            Commands::Get { tile, output } => {
                commands::tiles::run_get(app_config, tile, &output).await
            }
            Commands::Serve { ip, port } => commands::serve::run(app_config, &ip, port).await,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_save_with_global_flags() {
        let cli = Cli::try_parse_from([
            "tilekeep",
            "save",
            "--bounds",
            "52.3,4.8,52.4,4.95",
            "--zoom",
            "12",
            "--template",
            "https://{s}.example.org/{z}/{x}/{y}.png",
        ])
        .unwrap();
        assert_eq!(
            cli.template.as_deref(),
            Some("https://{s}.example.org/{z}/{x}/{y}.png")
        );
        assert!(matches!(cli.command, Commands::Save(_)));
    }

    #[test]
    fn test_parse_save_zoom_levels_without_zoom() {
        let cli = Cli::try_parse_from([
            "tilekeep",
            "save",
            "--bounds",
            "52.3,4.8,52.4,4.95",
            "--zoom-levels",
            "3,4",
        ])
        .unwrap();
        match cli.command {
            Commands::Save(args) => {
                assert_eq!(args.zoom, None);
                assert_eq!(args.zoom_levels, Some(vec![3, 4]));
            }
            _ => panic!("expected save"),
        }

        assert!(Cli::try_parse_from(["tilekeep", "save", "--bounds", "52.3,4.8,52.4,4.95"]).is_err());
    }

    #[test]
    fn test_parse_get() {
        let cli = Cli::try_parse_from(["tilekeep", "get", "12", "2106", "1348", "-o", "tile.png"])
            .unwrap();
        match cli.command {
            Commands::Get { tile, output } => {
                assert_eq!((tile.z, tile.x, tile.y), (12, 2106, 1348));
                assert_eq!(output, PathBuf::from("tile.png"));
            }
            _ => panic!("expected get"),
        }
    }
}

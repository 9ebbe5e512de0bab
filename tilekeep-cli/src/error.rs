//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and exit codes.

use std::fmt;
use std::process;

use tilekeep::app::AppError;
use tilekeep::config::ConfigFileError;
use tilekeep::control::SaveError;
use tilekeep::provider::FetchError;
use tilekeep::server::ServerError;
use tilekeep::store::StoreError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Invalid command-line argument
    InvalidArgument(String),
    /// Failed to create the Tokio runtime
    Runtime(String),
    /// Failed to start the application
    Startup(AppError),
    /// Save or remove failed
    Save(SaveError),
    /// Tile store access failed
    Store(StoreError),
    /// Failed to download a tile
    Download(FetchError),
    /// Failed to write output file
    FileWrite { path: String, error: std::io::Error },
    /// Tile server error
    Serve(ServerError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Save(SaveError::ZoomTooLow { .. }) => {
                eprintln!();
                eprintln!("Zoom in further, or pass --zoom-levels to save explicit levels.");
            }
            CliError::Serve(ServerError::Bind { .. }) => {
                eprintln!();
                eprintln!("The port may already be in use. Try another with --port.");
            }
            CliError::Startup(AppError::Template(_)) => {
                eprintln!();
                eprintln!("Check url_template in the [layer] section of the config file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Runtime(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
            CliError::Startup(e) => write!(f, "{}", e),
            CliError::Save(e) => write!(f, "{}", e),
            CliError::Store(e) => write!(f, "Tile store error: {}", e),
            CliError::Download(e) => write!(f, "Failed to download tile: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Serve(e) => write!(f, "Tile server error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Startup(e) => Some(e),
            CliError::Save(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Download(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Serve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Startup(e)
    }
}

impl From<SaveError> for CliError {
    fn from(e: SaveError) -> Self {
        CliError::Save(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Download(e)
    }
}

impl From<ServerError> for CliError {
    fn from(e: ServerError) -> Self {
        CliError::Serve(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

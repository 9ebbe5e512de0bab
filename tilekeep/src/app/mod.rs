//! Application bootstrap and lifecycle management.
//!
//! [`TileKeepApp`] wires the pieces of a running tilekeep instance in order:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       TileKeepApp                         │
//! │                                                           │
//! │  1. TileStore  ── "tiles" + "areas" namespaces            │
//! │  2. Fetcher    ── ReqwestFetcher (or injected)            │
//! │  3. OfflineTileLayer (deriver + store + fetcher)          │
//! │  4. SaveControl (save / remove orchestration)             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tilekeep::app::{AppConfig, TileKeepApp};
//! use tilekeep::config::ConfigFile;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?);
//! let app = TileKeepApp::start(config).await?;
//! let session = app.control().save_tiles(&viewport).await?;
//! app.shutdown().await;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::TileKeepApp;
pub use config::AppConfig;
pub use error::AppError;

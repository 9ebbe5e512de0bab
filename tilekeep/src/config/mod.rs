//! Configuration file for the tilekeep command-line tool.
//!
//! `~/.tilekeep/config.ini` holds the layer, storage, download, save and
//! logging options. Settings structs live in [`settings`], constants in
//! [`defaults`], parsing in `parser` and serialization in `writer`.
//!
//! ```ignore
//! use tilekeep::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! println!("{}", config.layer.url_template);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_LOG_FILE_NAME, DEFAULT_REMOVE_TEXT, DEFAULT_SAVE_TEXT,
    DEFAULT_URL_TEMPLATE,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheBackend, CacheSettings, ConfigFile, ControlSettings, DownloadSettings, LayerSettings,
    LoggingSettings, SaveSettings,
};

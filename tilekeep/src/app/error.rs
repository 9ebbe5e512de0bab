//! Application error types.

use std::fmt;

use crate::config::ConfigFileError;
use crate::provider::FetchError;
use crate::store::StoreError;
use crate::template::TemplateError;

/// Errors that can occur while starting the application.
#[derive(Debug)]
pub enum AppError {
    /// Failed to open the tile store.
    StoreOpen(StoreError),

    /// The layer URL template or options are invalid.
    Template(TemplateError),

    /// Failed to build the HTTP fetcher.
    Fetcher(FetchError),

    /// Configuration error.
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::StoreOpen(e) => write!(f, "Failed to open tile store: {}", e),
            AppError::Template(e) => write!(f, "Invalid tile layer: {}", e),
            AppError::Fetcher(e) => write!(f, "Failed to create HTTP client: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::StoreOpen(e) => Some(e),
            AppError::Template(e) => Some(e),
            AppError::Fetcher(e) => Some(e),
            AppError::Config(_) => None,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::StoreOpen(e)
    }
}

impl From<TemplateError> for AppError {
    fn from(e: TemplateError) -> Self {
        AppError::Template(e)
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        AppError::Fetcher(e)
    }
}

impl From<ConfigFileError> for AppError {
    fn from(e: ConfigFileError) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config("missing template".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing template"));
        assert!(err.source().is_none());
    }

    #[test]
    fn test_app_error_from_template_error() {
        let app_err: AppError = TemplateError::Empty.into();
        assert!(matches!(app_err, AppError::Template(_)));
        assert!(app_err.source().is_some());
    }
}

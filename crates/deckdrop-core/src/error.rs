//! Error types module
//!
//! `AppError` is the application-level error shared by the pipeline, the CLI and
//! whatever HTTP layer fronts them. Storage and segmentation keep their own typed
//! errors and convert into `AppError` at the edges.

use std::io;

/// Level an error is reported at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Caller mistakes: bad input, unknown ids
    Debug,
    /// Degraded but completed work
    Warn,
    /// Backend and infrastructure failures
    Error,
}

/// How an error presents itself to a client of whatever surface fronts the
/// pipeline (HTTP status, stable code, retry hint).
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable machine-readable code, e.g. `NOT_FOUND`
    fn error_code(&self) -> &'static str;

    /// True when retrying the same call may succeed
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show to a client
    fn client_message(&self) -> String;

    /// True when the internal message may leak credentials or paths
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Segmentation error: {0}")]
    Segmentation(String),

    #[error("Rendering error: {0}")]
    Rendering(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream authentication failed: {0}")]
    Authentication(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// (status, code, recoverable, action, sensitive, level) per variant.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Segmentation(_) => (
            400,
            "SEGMENTATION_ERROR",
            false,
            Some("Provide non-empty text and a known strategy"),
            false,
            LogLevel::Debug,
        ),
        AppError::Rendering(_) => (
            500,
            "RENDERING_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("The link may have expired; upload the deck again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Configuration(_) => (
            500,
            "CONFIGURATION_ERROR",
            false,
            Some("Check storage backend settings"),
            true,
            LogLevel::Error,
        ),
        AppError::Authentication(_) => (
            502,
            "UPSTREAM_AUTHENTICATION_FAILED",
            true,
            Some("Retry; a fresh token is requested on the next call"),
            true,
            LogLevel::Error,
        ),
        AppError::Unsupported(_) => (
            501,
            "UNSUPPORTED_OPERATION",
            false,
            Some("This operation is not available on the configured backend"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Variant name without payload
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Storage(_) => "Storage",
            AppError::Segmentation(_) => "Segmentation",
            AppError::Rendering(_) => "Rendering",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Configuration(_) => "Configuration",
            AppError::Authentication(_) => "Authentication",
            AppError::Unsupported(_) => "Unsupported",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Message followed by up to five `Caused by:` lines from the source chain.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Segmentation(ref msg) => msg.clone(),
            AppError::Rendering(_) => "Failed to render presentation".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Configuration(_) => "Storage backend is misconfigured".to_string(),
            AppError::Authentication(_) => "Storage backend rejected our credentials".to_string(),
            AppError::Unsupported(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

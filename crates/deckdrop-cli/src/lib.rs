use anyhow::Context;
use deckdrop_core::{AppError, ErrorMetadata, LogLevel};
use deckdrop_services::{SegmentationError, StorageError};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays valid JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Read source text from `path`, or from stdin when the path is absent or `-`.
pub fn read_text(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path).map_err(|e| {
            AppError::InvalidInput(format!("Failed to read {}: {}", path.display(), e)).into()
        }),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// File name to store `path` under: the explicit name, else the path's own.
pub fn upload_name(path: &Path, name: Option<String>) -> anyhow::Result<String> {
    match name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| {
                AppError::InvalidInput(format!("Cannot derive a file name from {}", path.display()))
                    .into()
            }),
    }
}

/// JSON body printed when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error_code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<&'static str>,
    pub recoverable: bool,
}

impl ErrorReport {
    pub fn new(err: &AppError) -> Self {
        Self {
            error_code: err.error_code(),
            message: err.client_message(),
            suggested_action: err.suggested_action(),
            recoverable: err.is_recoverable(),
        }
    }
}

/// Classify a command failure, looking through any context wrapping.
pub fn to_app_error(err: anyhow::Error) -> AppError {
    let err = match err.downcast::<AppError>() {
        Ok(app) => return app,
        Err(err) => err,
    };
    let err = match err.downcast::<StorageError>() {
        Ok(storage) => return storage.into(),
        Err(err) => err,
    };
    let err = match err.downcast::<SegmentationError>() {
        Ok(segmentation) => return segmentation.into(),
        Err(err) => err,
    };
    match err.downcast::<std::io::Error>() {
        Ok(io) => io.into(),
        Err(err) => err.into(),
    }
}

/// Log the full error chain at its level, then print the client-safe report.
pub fn report_failure(err: &AppError) {
    let details = err.detailed_message();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error_type = err.error_type(), "{}", details),
        LogLevel::Warn => tracing::warn!(error_type = err.error_type(), "{}", details),
        LogLevel::Error => tracing::error!(error_type = err.error_type(), "{}", details),
    }

    match serde_json::to_string_pretty(&ErrorReport::new(err)) {
        Ok(out) => println!("{}", out),
        Err(e) => tracing::error!(error = %e, "Failed to serialize error report"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_text_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Intro\n\nBody").unwrap();
        assert_eq!(read_text(Some(&path)).unwrap(), "Intro\n\nBody");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_text(Some(Path::new("/definitely/not/here.txt"))).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }

    #[test]
    fn upload_name_prefers_explicit() {
        let path = Path::new("/tmp/build/deck-final.pptx");
        assert_eq!(
            upload_name(path, Some("Board Deck.pptx".to_string())).unwrap(),
            "Board Deck.pptx"
        );
        assert_eq!(upload_name(path, None).unwrap(), "deck-final.pptx");
        assert_eq!(upload_name(path, Some(" ".to_string())).unwrap(), "deck-final.pptx");
        assert!(upload_name(Path::new("/"), None).is_err());
    }

    #[test]
    fn unreadable_input_is_invalid_input() {
        let err = read_text(Some(Path::new("/definitely/not/here.txt"))).unwrap_err();
        let app = to_app_error(err);
        assert_eq!(app.error_code(), "INVALID_INPUT");
        assert!(app.client_message().contains("here.txt"));
    }

    #[test]
    fn typed_errors_survive_context() {
        let err = anyhow::Error::new(StorageError::NotFound("abc".to_string()))
            .context("Failed to upload deck");
        assert_eq!(to_app_error(err).error_code(), "NOT_FOUND");

        let err = anyhow::Error::new(SegmentationError::EmptyInput);
        let app = to_app_error(err);
        assert_eq!(app.error_code(), "SEGMENTATION_ERROR");
        assert_eq!(app.http_status_code(), 400);

        let err = anyhow::Error::new(AppError::Rendering("renderer offline".to_string()));
        assert_eq!(to_app_error(err).error_code(), "RENDERING_ERROR");
    }

    #[test]
    fn untyped_failures_are_internal_without_leaking() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed");
        let app = to_app_error(anyhow::Error::new(io).context("Failed to read stdin"));
        assert!(matches!(app, AppError::Internal(_)));

        let app = to_app_error(anyhow::anyhow!("token=secret123 rejected"));
        assert_eq!(app.error_code(), "INTERNAL_ERROR");
        assert!(!app.client_message().contains("secret123"));
    }

    #[test]
    fn error_report_carries_code_and_client_message() {
        let report = ErrorReport::new(&AppError::Configuration("S3_BUCKET not configured".to_string()));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error_code"], "CONFIGURATION_ERROR");
        assert_eq!(json["message"], "Storage backend is misconfigured");
        assert_eq!(json["recoverable"], false);
        assert!(json["suggested_action"].is_string());
    }
}

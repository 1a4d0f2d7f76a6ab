use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::time::Duration;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Upload carried no `pcap` file part
    #[error("No file part")]
    MissingFilePart,

    /// The `pcap` part was sent with an empty filename
    #[error("No selected file")]
    EmptyFilename,

    /// Malformed multipart body
    #[error("Invalid upload: {0}")]
    Upload(String),

    /// The decoder could not be launched or refused `-v`
    #[error("tshark is not installed or not found in PATH.")]
    ToolUnavailable,

    /// The decoder exited with a non-zero status
    #[error("Error running tshark: {0}")]
    ToolFailed(String),

    /// The decoder ran past the configured deadline
    #[error("tshark did not finish within {0:?}")]
    ToolTimeout(Duration),

    /// A decoder output field that must be numeric was not
    #[error("invalid {field} value {value:?} on output line {line}")]
    InvalidField {
        field: &'static str,
        value: String,
        line: usize,
    },

    /// Error from I/O operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Fallback when the analysis never produced an outcome
    #[error("Unknown error occurred")]
    Unknown,
}

impl AppError {
    /// Whether the caller sent something we cannot work with
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::MissingFilePart | AppError::EmptyFilename | AppError::Upload(_)
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

/// Result type for application
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_bad_request() {
        assert_eq!(AppError::MissingFilePart.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::EmptyFilename.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Upload("boundary missing".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn tool_errors_map_to_server_error() {
        assert_eq!(
            AppError::ToolUnavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::ToolFailed("bad file".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Unknown.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn messages_match_wire_format() {
        assert_eq!(AppError::MissingFilePart.to_string(), "No file part");
        assert_eq!(AppError::EmptyFilename.to_string(), "No selected file");
        assert_eq!(
            AppError::ToolUnavailable.to_string(),
            "tshark is not installed or not found in PATH."
        );
        assert_eq!(
            AppError::ToolFailed("truncated capture".into()).to_string(),
            "Error running tshark: truncated capture"
        );
    }
}

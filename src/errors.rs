use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

use crate::handlers::cors;

/// Everything that can stop an upload before a success response.
///
/// Notification failures are not in here on purpose; see `NotifyError`.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("No file provided")]
    NoFile,
    #[error("Invalid base64 body")]
    InvalidEncoding,
    #[error("Invalid JSON body")]
    InvalidJson,
    #[error("Missing csv field in request body")]
    MissingCsv,
    /// Required settings are missing or unusable. Raised before any network I/O.
    #[error("{0}")]
    Config(String),
    /// The destination answered, but with a rejection.
    #[error("{service} API error: {status} {body}")]
    Provider {
        service: &'static str,
        status: u16,
        body: String,
    },
    /// Connection, protocol or I/O failure talking to the destination.
    #[error("{0}")]
    Transfer(String),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            UploadError::NoFile
            | UploadError::InvalidEncoding
            | UploadError::InvalidJson
            | UploadError::MissingCsv => StatusCode::BAD_REQUEST,
            UploadError::Config(_) | UploadError::Provider { .. } | UploadError::Transfer(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Convert into the HTTP envelope. Client errors carry only their
    /// reason; server-side errors carry the route's failure label plus the
    /// underlying message.
    pub fn into_app_error(self, failure_label: &str) -> AppError {
        let status = self.status();
        if status.is_client_error() {
            AppError::new(status, self.to_string())
        } else {
            AppError::new(status, failure_label).with_message(self.to_string())
        }
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Transfer(err.to_string())
    }
}

impl From<suppaftp::FtpError> for UploadError {
    fn from(err: suppaftp::FtpError) -> Self {
        UploadError::Transfer(format!("FTP error: {}", err))
    }
}

impl From<ssh2::Error> for UploadError {
    fn from(err: ssh2::Error) -> Self {
        UploadError::Transfer(format!("SFTP error: {}", err))
    }
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::Transfer(err.to_string())
    }
}

/// Failure of a best-effort notification channel. Only ever logged.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid email address `{address}`: {reason}")]
    Address { address: String, reason: String },
    #[error("failed to build email: {0}")]
    Message(String),
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Slack returned {status}: {body}")]
    SlackRejected { status: u16, body: String },
    #[error("Slack request failed: {0}")]
    SlackConnection(String),
}

/// HTTP error envelope: `{error}` or `{error, message}`, always with CORS headers.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: String,
    pub message: Option<String>,
}

impl AppError {
    /// Create a new AppError with a specific status and reason.
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.error, message),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self.message {
            Some(message) => json!({ "error": self.error, "message": message }),
            None => json!({ "error": self.error }),
        };

        let mut response = (self.status, Json(body)).into_response();
        cors::apply(response.headers_mut());
        response
    }
}

//! Inbound request envelope and the file extracted from it.

use axum::http::Method;
use bytes::Bytes;

/// Placeholder used when the client does not send an original file name.
pub const DEFAULT_ORIGINAL_NAME: &str = "TestStock.csv";

/// The parts of an inbound HTTP request the pipeline looks at.
///
/// `OPTIONS` short-circuits in the gate, so `body` is never touched for a
/// preflight.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// HTTP method as received.
    pub method: Method,

    /// Raw `Content-Type` header value, needed to find the multipart boundary.
    pub content_type: Option<String>,

    /// Whether `body` is base64 transport-encoded.
    pub is_base64_encoded: bool,

    /// Request body bytes, untouched.
    pub body: Bytes,
}

impl UploadRequest {
    pub fn new(method: Method, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            content_type: None,
            is_base64_encoded: false,
            body: body.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn base64_encoded(mut self, encoded: bool) -> Self {
        self.is_base64_encoded = encoded;
        self
    }
}

/// A file ready to be handed to a transfer adapter.
///
/// `content` is never empty; the extractor rejects empty payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub content: Bytes,
    pub original_name: Option<String>,
}

impl FilePayload {
    /// Original name as sent by the client, or the fixed placeholder.
    pub fn original_name_or_default(&self) -> &str {
        self.original_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_ORIGINAL_NAME)
    }
}

//! Typed client for the Dropbox content upload endpoint.
//!
//! Covers only `files/upload`: the request argument (`CommitInfo`) travels
//! in the `Dropbox-API-Arg` header, the file bytes are the body, and the
//! answer is the stored file's `FileMetadata`.

use crate::{config::DropboxConfig, errors::UploadError};
use bytes::Bytes;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const UPLOAD_ENDPOINT: &str = "/2/files/upload";
pub const API_ARG_HEADER: &str = "Dropbox-API-Arg";

/// Returns the bearer token or the configuration error every Dropbox
/// adapter reports when it is missing.
pub fn require_token(config: &DropboxConfig) -> Result<String, UploadError> {
    config.access_token.clone().ok_or_else(|| {
        UploadError::Config("DROPBOX_ACCESS_TOKEN environment variable is not set".into())
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    Add,
    Overwrite,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitInfo {
    pub path: String,
    pub mode: WriteMode,
    pub autorename: bool,
    pub mute: bool,
    pub strict_conflict: bool,
}

/// Subset of the metadata Dropbox returns for an uploaded file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub path_display: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_summary: Option<String>,
}

#[derive(Clone)]
pub struct DropboxClient {
    http: Client,
    base_url: String,
    token: String,
}

impl DropboxClient {
    pub fn new(http: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Upload `contents` as described by `arg`.
    ///
    /// A rejection is reported with Dropbox's `error_summary` when the body
    /// carries one, the raw body text otherwise.
    pub async fn files_upload(
        &self,
        arg: &CommitInfo,
        contents: Bytes,
    ) -> Result<FileMetadata, UploadError> {
        let api_arg = header_safe_json(arg)?;
        debug!(path = %arg.path, mode = ?arg.mode, "dropbox files/upload");

        let response = self
            .http
            .post(format!("{}{}", self.base_url.trim_end_matches('/'), UPLOAD_ENDPOINT))
            .bearer_auth(&self.token)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(API_ARG_HEADER, api_arg)
            .body(contents)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(rejection(status, &text));
        }

        serde_json::from_str(&text).map_err(|err| {
            UploadError::Transfer(format!("unexpected Dropbox upload response: {}", err))
        })
    }
}

fn rejection(status: StatusCode, text: &str) -> UploadError {
    let body = serde_json::from_str::<ApiErrorBody>(text)
        .ok()
        .and_then(|b| b.error_summary)
        .unwrap_or_else(|| text.to_string());
    UploadError::Provider {
        service: "Dropbox",
        status: status.as_u16(),
        body,
    }
}

/// Serialize to JSON that is safe inside an HTTP header: every non-ASCII
/// character is written as a `\uXXXX` escape, as Dropbox requires.
pub fn header_safe_json<T: Serialize>(value: &T) -> Result<String, UploadError> {
    let json = serde_json::to_string(value)
        .map_err(|err| UploadError::Transfer(format!("encoding Dropbox-API-Arg: {}", err)))?;

    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() && c != '\x7f' {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn commit(path: &str) -> CommitInfo {
        CommitInfo {
            path: path.into(),
            mode: WriteMode::Add,
            autorename: true,
            mute: false,
            strict_conflict: false,
        }
    }

    #[test]
    fn commit_info_serializes_mode_as_tag() {
        let json = serde_json::to_value(commit("/TestStock/a.csv")).unwrap();
        assert_eq!(json["mode"], "add");
        assert_eq!(json["autorename"], true);
    }

    #[test]
    fn header_json_escapes_non_ascii() {
        let encoded = header_safe_json(&commit("/Bestände/ü.csv")).unwrap();
        assert!(encoded.is_ascii());
        assert!(encoded.contains("\\u00e4"));
        let decoded: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded["path"], "/Bestände/ü.csv");
    }

    #[tokio::test]
    async fn upload_returns_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPLOAD_ENDPOINT))
            .and(header_eq("authorization", "Bearer sl.token"))
            .and(header_eq("content-type", "application/octet-stream"))
            .and(body_bytes(b"a,b\n1,2".to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "a (1).csv",
                "path_display": "/TestStock/a (1).csv",
                "path_lower": "/teststock/a (1).csv",
                "id": "id:abc",
                "size": 7
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = DropboxClient::new(Client::new(), server.uri(), "sl.token");
        let meta = client
            .files_upload(&commit("/TestStock/a.csv"), Bytes::from_static(b"a,b\n1,2"))
            .await
            .unwrap();
        assert_eq!(meta.name, "a (1).csv");
        assert_eq!(meta.path_display.as_deref(), Some("/TestStock/a (1).csv"));
    }

    #[tokio::test]
    async fn rejection_uses_error_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPLOAD_ENDPOINT))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "error_summary": "path/insufficient_space/..",
                "error": {".tag": "path"}
            })))
            .mount(&server)
            .await;

        let client = DropboxClient::new(Client::new(), server.uri(), "sl.token");
        let err = client
            .files_upload(&commit("/TestStock/a.csv"), Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Dropbox API error: 409 path/insufficient_space/.."
        );
    }
}

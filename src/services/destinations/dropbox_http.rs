//! Dropbox through a hand-built content call: overwrite mode, so each upload
//! of the same logical name replaces the previous file.

use super::{
    DestinationAdapter,
    dropbox_client::{
        API_ARG_HEADER, CommitInfo, UPLOAD_ENDPOINT, WriteMode, header_safe_json, require_token,
    },
};
use crate::{
    config::DropboxConfig,
    errors::UploadError,
    models::{
        payload::FilePayload,
        target::{DestinationTarget, UploadOutcome},
    },
    services::naming,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header;
use serde_json::Value;
use tracing::info;

pub struct DropboxHttpAdapter {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    folder: String,
}

impl DropboxHttpAdapter {
    pub fn from_config(config: &DropboxConfig, http: reqwest::Client) -> Result<Self, UploadError> {
        let token = require_token(config)?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", config.content_url.trim_end_matches('/'), UPLOAD_ENDPOINT),
            token,
            folder: config.folder.clone(),
        })
    }
}

#[async_trait]
impl DestinationAdapter for DropboxHttpAdapter {
    fn name(&self) -> &'static str {
        "dropbox-http"
    }

    fn target(&self, payload: &FilePayload, _now: DateTime<Utc>) -> DestinationTarget {
        naming::dropbox_overwrite(&self.folder, payload.original_name_or_default())
    }

    async fn transfer(
        &self,
        payload: &FilePayload,
        target: &DestinationTarget,
    ) -> Result<UploadOutcome, UploadError> {
        let api_arg = header_safe_json(&CommitInfo {
            path: target.remote_path.clone(),
            mode: WriteMode::Overwrite,
            autorename: false,
            mute: false,
            strict_conflict: false,
        })?;

        let response = self
            .http
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(API_ARG_HEADER, api_arg)
            .body(payload.content.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Provider {
                service: "Dropbox",
                status: status.as_u16(),
                body,
            });
        }

        let result: Value = response.json().await?;
        let path = result
            .get("path_display")
            .and_then(Value::as_str)
            .unwrap_or(&target.remote_path)
            .to_string();
        let name = result
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&target.file_name)
            .to_string();
        info!(path = %path, "dropbox upload complete");

        Ok(UploadOutcome { path, name })
    }

    fn path_label(&self) -> &'static str {
        "Dropbox"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn adapter(base_url: &str) -> DropboxHttpAdapter {
        let config = DropboxConfig {
            access_token: Some("sl.token".into()),
            content_url: base_url.into(),
            ..DropboxConfig::default()
        };
        DropboxHttpAdapter::from_config(&config, reqwest::Client::new()).unwrap()
    }

    fn payload() -> FilePayload {
        FilePayload {
            content: Bytes::from_static(b"a,b\n1,2"),
            original_name: Some("My File!.txt".into()),
        }
    }

    #[tokio::test]
    async fn sends_overwrite_argument_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPLOAD_ENDPOINT))
            .and(header_eq("authorization", "Bearer sl.token"))
            .and(|request: &Request| {
                let Some(raw) = request.headers.get(API_ARG_HEADER) else {
                    return false;
                };
                let arg: serde_json::Value = match serde_json::from_slice(raw.as_bytes()) {
                    Ok(arg) => arg,
                    Err(_) => return false,
                };
                arg["path"] == "/TestStock/My_File_.csv"
                    && arg["mode"] == "overwrite"
                    && arg["autorename"] == false
            })
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "My_File_.csv",
                "path_display": "/TestStock/My_File_.csv"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter(&server.uri());
        let target = adapter.target(&payload(), Utc::now());
        let outcome = adapter.transfer(&payload(), &target).await.unwrap();
        assert_eq!(outcome.path, "/TestStock/My_File_.csv");
        assert_eq!(outcome.name, "My_File_.csv");
    }

    #[tokio::test]
    async fn non_success_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(UPLOAD_ENDPOINT))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_access_token"))
            .mount(&server)
            .await;

        let adapter = adapter(&server.uri());
        let target = adapter.target(&payload(), Utc::now());
        let err = adapter.transfer(&payload(), &target).await.unwrap_err();
        assert_eq!(err.to_string(), "Dropbox API error: 401 invalid_access_token");
    }
}

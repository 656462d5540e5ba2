//! Dropbox through the typed client: `add` mode with server-side autorename,
//! so repeated uploads never replace each other.

use super::{
    DestinationAdapter,
    dropbox_client::{CommitInfo, DropboxClient, WriteMode, require_token},
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
use tracing::info;

pub struct DropboxSdkAdapter {
    client: DropboxClient,
    folder: String,
}

impl DropboxSdkAdapter {
    pub fn from_config(config: &DropboxConfig, http: reqwest::Client) -> Result<Self, UploadError> {
        let token = require_token(config)?;
        Ok(Self {
            client: DropboxClient::new(http, config.content_url.clone(), token),
            folder: config.folder.clone(),
        })
    }
}

#[async_trait]
impl DestinationAdapter for DropboxSdkAdapter {
    fn name(&self) -> &'static str {
        "dropbox-sdk"
    }

    fn target(&self, payload: &FilePayload, now: DateTime<Utc>) -> DestinationTarget {
        naming::dropbox_autorename(&self.folder, payload.original_name_or_default(), now)
    }

    async fn transfer(
        &self,
        payload: &FilePayload,
        target: &DestinationTarget,
    ) -> Result<UploadOutcome, UploadError> {
        let arg = CommitInfo {
            path: target.remote_path.clone(),
            mode: WriteMode::Add,
            autorename: true,
            mute: false,
            strict_conflict: false,
        };
        let meta = self.client.files_upload(&arg, payload.content.clone()).await?;

        // Autorename may have moved the file; the server's path is authoritative.
        let path = meta
            .path_display
            .clone()
            .unwrap_or_else(|| target.remote_path.clone());
        info!(requested = %target.remote_path, stored = %path, "dropbox upload complete");

        Ok(UploadOutcome {
            path,
            name: target.file_name.clone(),
        })
    }

    fn path_label(&self) -> &'static str {
        "Dropbox"
    }
}

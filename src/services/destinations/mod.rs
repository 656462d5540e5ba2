//! Transfer adapters.
//!
//! Exactly one adapter runs per request. Which one is decided by the route
//! (`DestinationKind`) and, for remote-file routes, by configuration:
//!
//! - `DropboxSdk`: typed Dropbox client, add + autorename, timestamped name.
//! - `DropboxHttp`: hand-built Dropbox content call, overwrite, sanitized name.
//! - `Sftp` / `Ftp`: fixed file name under `FTP_REMOTE_PATH`, overwrite.
//!
//! Building an adapter is its config validation step: a missing credential
//! fails there, before any network I/O.

pub mod dropbox_client;
pub mod dropbox_http;
pub mod dropbox_sdk;
pub mod ftp;
pub mod remote;
pub mod session;
pub mod sftp;

use crate::{
    config::UploadConfig,
    errors::UploadError,
    models::{
        payload::FilePayload,
        target::{DestinationTarget, UploadOutcome},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use dropbox_http::DropboxHttpAdapter;
pub use dropbox_sdk::DropboxSdkAdapter;
pub use ftp::FtpAdapter;
pub use remote::{Protocol, RemoteSettings};
pub use sftp::SftpAdapter;

/// One destination behind a uniform interface.
#[async_trait]
pub trait DestinationAdapter: Send + Sync {
    /// Short identifier used in logs (`dropbox-sdk`, `sftp`, ...).
    fn name(&self) -> &'static str;

    /// Naming policy for this destination.
    fn target(&self, payload: &FilePayload, now: DateTime<Utc>) -> DestinationTarget;

    /// Perform the single write. Sessions are closed before this returns,
    /// whatever the outcome.
    async fn transfer(
        &self,
        payload: &FilePayload,
        target: &DestinationTarget,
    ) -> Result<UploadOutcome, UploadError>;

    /// How notifications refer to the path (`Dropbox path: ...`).
    fn path_label(&self) -> &'static str {
        "Remote"
    }
}

/// Destination family wired to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKind {
    DropboxSdk,
    DropboxHttp,
    /// SFTP or FTP, chosen from `FTP_PROTOCOL` / `FTP_PORT`.
    RemoteFile,
}

impl DestinationKind {
    /// Validate configuration and build the adapter for this request.
    pub fn adapter(
        self,
        config: &UploadConfig,
        http: &reqwest::Client,
    ) -> Result<Box<dyn DestinationAdapter>, UploadError> {
        Ok(match self {
            DestinationKind::DropboxSdk => {
                Box::new(DropboxSdkAdapter::from_config(&config.dropbox, http.clone())?)
            }
            DestinationKind::DropboxHttp => {
                Box::new(DropboxHttpAdapter::from_config(&config.dropbox, http.clone())?)
            }
            DestinationKind::RemoteFile => {
                let settings = RemoteSettings::from_config(&config.ftp)?;
                match settings.protocol {
                    Protocol::Sftp => Box::new(SftpAdapter::new(settings)),
                    Protocol::Ftp => Box::new(FtpAdapter::new(settings)),
                }
            }
        })
    }
}

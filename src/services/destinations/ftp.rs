//! FTP / explicit FTPS adapter (`suppaftp`, blocking API on the tokio
//! blocking pool).

use super::{
    DestinationAdapter,
    remote::RemoteSettings,
    session::{RemoteSession, upload_file},
};
use crate::{
    errors::UploadError,
    models::{
        payload::FilePayload,
        target::{DestinationTarget, UploadOutcome},
    },
    services::naming,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::Cursor;
use suppaftp::{NativeTlsConnector, NativeTlsFtpStream, native_tls::TlsConnector, types::FileType};
use tracing::{debug, info};

pub struct FtpSession {
    stream: NativeTlsFtpStream,
}

impl FtpSession {
    /// Connect, upgrade to TLS when requested, and log in.
    ///
    /// With TLS on, self-signed certificates and mismatched host names are
    /// accepted.
    pub fn connect(settings: &RemoteSettings) -> Result<Self, UploadError> {
        let mut stream = NativeTlsFtpStream::connect((settings.host.as_str(), settings.port))?;

        if settings.uses_tls() {
            let connector = TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|err| UploadError::Transfer(format!("TLS setup failed: {}", err)))?;
            stream = stream.into_secure(NativeTlsConnector::from(connector), &settings.host)?;
        }

        let mut session = Self { stream };
        if let Err(err) = session.login(settings) {
            let _ = session.close();
            return Err(err);
        }
        Ok(session)
    }

    fn login(&mut self, settings: &RemoteSettings) -> Result<(), UploadError> {
        self.stream.login(&settings.user, &settings.password)?;
        self.stream.transfer_type(FileType::Binary)?;
        Ok(())
    }
}

/// The directory commands `ensure_dir` needs from an FTP control connection.
trait DirControl {
    fn pwd(&mut self) -> Result<String, UploadError>;
    fn cwd(&mut self, dir: &str) -> Result<(), UploadError>;
    fn mkdir(&mut self, dir: &str) -> Result<(), UploadError>;
}

impl DirControl for NativeTlsFtpStream {
    fn pwd(&mut self) -> Result<String, UploadError> {
        Ok(NativeTlsFtpStream::pwd(self)?)
    }

    fn cwd(&mut self, dir: &str) -> Result<(), UploadError> {
        Ok(NativeTlsFtpStream::cwd(self, dir)?)
    }

    fn mkdir(&mut self, dir: &str) -> Result<(), UploadError> {
        Ok(NativeTlsFtpStream::mkdir(self, dir)?)
    }
}

/// Walk `dir` one segment at a time (`CWD`, else `MKD` then `CWD`), then
/// return to the starting directory so later paths resolve as configured.
fn create_dir_all<C: DirControl>(control: &mut C, dir: &str) -> Result<(), UploadError> {
    let start = control.pwd()?;
    if dir.starts_with('/') {
        control.cwd("/")?;
    }
    for segment in dir.split('/').filter(|s| !s.is_empty()) {
        if control.cwd(segment).is_err() {
            debug!(segment, "creating remote directory");
            control.mkdir(segment)?;
            control.cwd(segment)?;
        }
    }
    control.cwd(&start)
}

impl RemoteSession for FtpSession {
    fn ensure_dir(&mut self, dir: &str) -> Result<(), UploadError> {
        create_dir_all(&mut self.stream, dir)
    }

    fn put(&mut self, path: &str, content: &[u8]) -> Result<(), UploadError> {
        let mut reader = Cursor::new(content);
        let written = self.stream.put_file(path, &mut reader)?;
        debug!(path, bytes = written, "ftp upload written");
        Ok(())
    }

    fn close(&mut self) -> Result<(), UploadError> {
        self.stream.quit()?;
        Ok(())
    }
}

pub struct FtpAdapter {
    settings: RemoteSettings,
}

impl FtpAdapter {
    pub fn new(settings: RemoteSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl DestinationAdapter for FtpAdapter {
    fn name(&self) -> &'static str {
        "ftp"
    }

    fn target(&self, _payload: &FilePayload, _now: DateTime<Utc>) -> DestinationTarget {
        naming::fixed_remote(&self.settings.remote_dir)
    }

    async fn transfer(
        &self,
        payload: &FilePayload,
        target: &DestinationTarget,
    ) -> Result<UploadOutcome, UploadError> {
        let settings = self.settings.clone();
        let target = target.clone();
        let content = payload.content.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            let session = FtpSession::connect(&settings)?;
            upload_file(session, &target, &content)
        })
        .await
        .map_err(|err| UploadError::Transfer(format!("FTP upload task failed: {}", err)))??;

        info!(
            host = %self.settings.host,
            tls = self.settings.uses_tls(),
            path = %outcome.path,
            "ftp upload complete"
        );
        Ok(outcome)
    }
}

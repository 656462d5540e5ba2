//! SFTP adapter (`ssh2`, blocking API on the tokio blocking pool).

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
use ssh2::{Session, Sftp};
use std::{io::Write, net::TcpStream, path::Path};
use tracing::{debug, info};

const DIR_MODE: i32 = 0o755;

pub struct SftpSession {
    session: Session,
    sftp: Option<Sftp>,
}

impl SftpSession {
    /// Open TCP, run the SSH handshake, authenticate with a password and
    /// start the SFTP subsystem.
    pub fn connect(settings: &RemoteSettings) -> Result<Self, UploadError> {
        let tcp = TcpStream::connect((settings.host.as_str(), settings.port))?;
        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;

        let mut this = Self {
            session,
            sftp: None,
        };
        if let Err(err) = this.open(settings) {
            let _ = this.close();
            return Err(err);
        }
        Ok(this)
    }

    fn open(&mut self, settings: &RemoteSettings) -> Result<(), UploadError> {
        self.session
            .userauth_password(&settings.user, &settings.password)?;
        self.sftp = Some(self.session.sftp()?);
        Ok(())
    }

    fn sftp(&self) -> Result<&Sftp, UploadError> {
        self.sftp
            .as_ref()
            .ok_or_else(|| UploadError::Transfer("SFTP subsystem is not open".into()))
    }
}

/// Directory primitives used by `create_dir_all`.
trait DirOps {
    fn is_dir(&self, path: &Path) -> bool;
    fn mkdir(&self, path: &Path) -> Result<(), UploadError>;
}

impl DirOps for Sftp {
    fn is_dir(&self, path: &Path) -> bool {
        self.stat(path).map(|stat| stat.is_dir()).unwrap_or(false)
    }

    fn mkdir(&self, path: &Path) -> Result<(), UploadError> {
        Ok(Sftp::mkdir(self, path, DIR_MODE)?)
    }
}

/// Recursive create. Servers disagree on the status code for an existing
/// directory, so a failed `mkdir` on a path that stats as a directory counts
/// as success; anything else propagates.
fn create_dir_all<D: DirOps>(ops: &D, dir: &str) -> Result<(), UploadError> {
    let mut current = String::new();
    if dir.starts_with('/') {
        current.push('/');
    }
    for segment in dir.split('/').filter(|s| !s.is_empty()) {
        if !current.is_empty() && !current.ends_with('/') {
            current.push('/');
        }
        current.push_str(segment);

        let path = Path::new(&current);
        if ops.is_dir(path) {
            continue;
        }
        if let Err(err) = ops.mkdir(path) {
            if ops.is_dir(path) {
                continue;
            }
            return Err(err);
        }
        debug!(dir = %current, "created remote directory");
    }
    Ok(())
}

impl RemoteSession for SftpSession {
    fn ensure_dir(&mut self, dir: &str) -> Result<(), UploadError> {
        create_dir_all(self.sftp()?, dir)
    }

    fn put(&mut self, path: &str, content: &[u8]) -> Result<(), UploadError> {
        let mut file = self.sftp()?.create(Path::new(path))?;
        file.write_all(content)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), UploadError> {
        self.sftp.take();
        self.session.disconnect(None, "upload finished", None)?;
        Ok(())
    }
}

pub struct SftpAdapter {
    settings: RemoteSettings,
}

impl SftpAdapter {
    pub fn new(settings: RemoteSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl DestinationAdapter for SftpAdapter {
    fn name(&self) -> &'static str {
        "sftp"
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
            let session = SftpSession::connect(&settings)?;
            upload_file(session, &target, &content)
        })
        .await
        .map_err(|err| UploadError::Transfer(format!("SFTP upload task failed: {}", err)))??;

        info!(host = %self.settings.host, path = %outcome.path, "sftp upload complete");
        Ok(outcome)
    }
}

//! Scoped remote-file sessions.
//!
//! An FTP or SFTP connection is wrapped in a `SessionGuard` the moment it
//! exists; the guard closes it when dropped, on success, on error and on
//! unwind alike. A close failure is logged and never replaces the outcome
//! of the work done inside the session.

use crate::{
    errors::UploadError,
    models::target::{DestinationTarget, UploadOutcome},
};
use tracing::debug;

/// The three operations an FTP-like upload needs.
pub trait RemoteSession {
    /// Create `dir` and its parents; an existing directory is not an error.
    fn ensure_dir(&mut self, dir: &str) -> Result<(), UploadError>;

    /// Write `content` to `path`, replacing any existing file.
    fn put(&mut self, path: &str, content: &[u8]) -> Result<(), UploadError>;

    fn close(&mut self) -> Result<(), UploadError>;
}

struct SessionGuard<S: RemoteSession>(S);

impl<S: RemoteSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if let Err(err) = self.0.close() {
            debug!(error = %err, "closing remote session failed");
        }
    }
}

/// Run `work` against `session`, then close it no matter what.
pub fn with_session<S, T, F>(session: S, work: F) -> Result<T, UploadError>
where
    S: RemoteSession,
    F: FnOnce(&mut S) -> Result<T, UploadError>,
{
    let mut guard = SessionGuard(session);
    work(&mut guard.0)
}

/// Ensure the target directory, then write the file.
pub fn upload_file<S: RemoteSession>(
    session: S,
    target: &DestinationTarget,
    content: &[u8],
) -> Result<UploadOutcome, UploadError> {
    with_session(session, |session| {
        let dir = target.remote_dir();
        if !dir.is_empty() && dir != "/" {
            session.ensure_dir(dir)?;
        }
        session.put(&target.remote_path, content)?;
        Ok(UploadOutcome {
            path: target.remote_path.clone(),
            name: target.file_name.clone(),
        })
    })
}

//! Where a payload ends up, and what the destination reported back.

/// How the destination treats an existing file at the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Keep the existing file and let the server pick a free name.
    AddAutorename,
    /// Replace whatever is at the path.
    Overwrite,
    /// Always the same file name, always replaced; no history.
    FixedNameOverwrite,
}

/// Remote location derived by a naming policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTarget {
    /// Full remote path, including `file_name`.
    pub remote_path: String,
    pub file_name: String,
    pub overwrite_policy: OverwritePolicy,
}

impl DestinationTarget {
    /// Parent directory of `remote_path`, empty when the path has no slash.
    pub fn remote_dir(&self) -> &str {
        match self.remote_path.rfind('/') {
            Some(idx) => &self.remote_path[..idx],
            None => "",
        }
    }
}

/// What a successful transfer reports. The destination's own view of the
/// path wins over the one we asked for (autorename may have changed it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub path: String,
    pub name: String,
}

//! Destination naming policies.
//!
//! Each policy is a pure function of the original name and the current
//! instant. Only the timestamped policy depends on the instant, so callers
//! must not expect the same name across calls.

use crate::models::target::{DestinationTarget, OverwritePolicy};
use chrono::{DateTime, SecondsFormat, Utc};

/// Prefix for timestamped Dropbox names and the fallback stem.
pub const NAME_PREFIX: &str = "TestStock";
/// Single file name used for every FTP/SFTP upload.
pub const FIXED_REMOTE_NAME: &str = "TestStockCSV.csv";

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
///
/// Idempotent: the output only contains allowed characters.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Drop a trailing `.ext` (at least one character after the last dot).
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() && !name[idx + 1..].contains('/') => &name[..idx],
        _ => name,
    }
}

/// Sanitized stem of `original_name`, falling back to `TestStock` when
/// nothing usable is left.
pub fn csv_stem(original_name: &str) -> String {
    let sanitized = sanitize(original_name);
    let stem = strip_extension(&sanitized);
    if stem.is_empty() {
        NAME_PREFIX.to_string()
    } else {
        stem.to_string()
    }
}

/// RFC 3339 UTC with milliseconds, `:` and `.` replaced so it is safe in a
/// file name: `2026-10-16T09-30-00-123Z`.
pub fn file_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Dropbox overwrite policy: `<folder>/<stem>.csv`, replaced on each upload.
pub fn dropbox_overwrite(folder: &str, original_name: &str) -> DestinationTarget {
    let file_name = format!("{}.csv", csv_stem(original_name));
    DestinationTarget {
        remote_path: join_remote(folder, &file_name),
        file_name,
        overwrite_policy: OverwritePolicy::Overwrite,
    }
}

/// Dropbox autorename policy: `<folder>/TestStock_<timestamp>_<stem>.csv`;
/// collisions are resolved by the server, never overwritten.
pub fn dropbox_autorename(
    folder: &str,
    original_name: &str,
    now: DateTime<Utc>,
) -> DestinationTarget {
    let file_name = format!(
        "{}_{}_{}.csv",
        NAME_PREFIX,
        file_timestamp(now),
        csv_stem(original_name)
    );
    DestinationTarget {
        remote_path: join_remote(folder, &file_name),
        file_name,
        overwrite_policy: OverwritePolicy::AddAutorename,
    }
}

/// FTP/SFTP policy: always `FIXED_REMOTE_NAME` under the configured directory.
pub fn fixed_remote(remote_dir: &str) -> DestinationTarget {
    DestinationTarget {
        remote_path: join_remote(remote_dir, FIXED_REMOTE_NAME),
        file_name: FIXED_REMOTE_NAME.to_string(),
        overwrite_policy: OverwritePolicy::FixedNameOverwrite,
    }
}

/// `dir/name` with runs of slashes collapsed to one.
pub fn join_remote(dir: &str, name: &str) -> String {
    let joined = format!("{}/{}", dir, name);
    let mut out = String::with_capacity(joined.len());
    let mut prev_slash = false;
    for c in joined.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap()
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn sanitize_replaces_disallowed_characters() {
        assert_eq!(sanitize("My File!.txt"), "My_File_.txt");
        assert_eq!(sanitize("stock-2026_v1.csv"), "stock-2026_v1.csv");
        assert_eq!(sanitize("a/b\\c"), "a_b_c");
        assert_eq!(sanitize("prix€.csv"), "prix_.csv");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for name in ["My File!.txt", "../../etc/passwd", "ünïcödé name.csv", "", "plain"] {
            let once = sanitize(name);
            assert_eq!(sanitize(&once), once, "{name}");
        }
    }

    #[test]
    fn strip_extension_only_removes_last_suffix() {
        assert_eq!(strip_extension("report.final.xlsx"), "report.final");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension("trailing."), "trailing.");
    }

    #[test]
    fn csv_stem_falls_back_when_empty() {
        assert_eq!(csv_stem(".csv"), "TestStock");
        assert_eq!(csv_stem(""), "TestStock");
        assert_eq!(csv_stem("My File!.txt"), "My_File_");
    }

    #[test]
    fn timestamp_has_no_colons_or_dots() {
        assert_eq!(file_timestamp(instant()), "2026-10-16T09-30-00-123Z");
    }

    #[test]
    fn dropbox_overwrite_forces_csv_extension() {
        let target = dropbox_overwrite("/TestStock", "My File!.txt");
        assert_eq!(target.file_name, "My_File_.csv");
        assert_eq!(target.remote_path, "/TestStock/My_File_.csv");
        assert_eq!(target.overwrite_policy, OverwritePolicy::Overwrite);
    }

    #[test]
    fn dropbox_autorename_wraps_stem_with_timestamp() {
        let target = dropbox_autorename("/TestStock", "My File!.txt", instant());
        assert_eq!(
            target.file_name,
            "TestStock_2026-10-16T09-30-00-123Z_My_File_.csv"
        );
        assert_eq!(
            target.remote_path,
            "/TestStock/TestStock_2026-10-16T09-30-00-123Z_My_File_.csv"
        );
        assert_eq!(target.overwrite_policy, OverwritePolicy::AddAutorename);
    }

    #[test]
    fn dropbox_autorename_is_deterministic_for_same_instant() {
        let a = dropbox_autorename("/TestStock", "x.csv", instant());
        let b = dropbox_autorename("/TestStock", "x.csv", instant());
        assert_eq!(a, b);
    }

    #[test]
    fn fixed_remote_collapses_slashes() {
        assert_eq!(fixed_remote("/").remote_path, "/TestStockCSV.csv");
        assert_eq!(
            fixed_remote("/uploads//daily/").remote_path,
            "/uploads/daily/TestStockCSV.csv"
        );
        assert_eq!(fixed_remote("inbox").remote_path, "inbox/TestStockCSV.csv");
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use std::{env, fmt};

/// Server bind configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "CSV upload relay (Dropbox, FTP, SFTP)")]
pub struct Args {
    /// Host to bind to (overrides UPLOAD_RELAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides UPLOAD_RELAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("UPLOAD_RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("UPLOAD_RELAY_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing UPLOAD_RELAY_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading UPLOAD_RELAY_PORT"),
        };

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub const DEFAULT_DROPBOX_CONTENT_URL: &str = "https://content.dropboxapi.com";
pub const DEFAULT_DROPBOX_FOLDER: &str = "/TestStock";
pub const DEFAULT_FTP_REMOTE_PATH: &str = "/";

/// Every option the upload handlers recognize, read per request.
///
/// Values are kept as the raw strings found in the environment; adapters and
/// notifiers decide at use time whether what they need is present and valid.
/// Empty strings are treated as absent.
#[derive(Clone, Default)]
pub struct UploadConfig {
    pub dropbox: DropboxConfig,
    pub ftp: FtpConfig,
    pub smtp: SmtpConfig,
    pub slack: SlackConfig,
}

#[derive(Clone)]
pub struct DropboxConfig {
    pub access_token: Option<String>,
    pub content_url: String,
    pub folder: String,
}

#[derive(Clone)]
pub struct FtpConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: Option<String>,
    pub protocol: Option<String>,
    pub remote_path: String,
    pub secure: bool,
}

#[derive(Clone, Default)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub to: Option<String>,
    pub from: Option<String>,
}

#[derive(Clone, Default)]
pub struct SlackConfig {
    pub webhook_url: Option<String>,
    pub channel: Option<String>,
    pub username: Option<String>,
}

impl Default for DropboxConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            content_url: DEFAULT_DROPBOX_CONTENT_URL.into(),
            folder: DEFAULT_DROPBOX_FOLDER.into(),
        }
    }
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            user: None,
            password: None,
            port: None,
            protocol: None,
            remote_path: DEFAULT_FTP_REMOTE_PATH.into(),
            secure: false,
        }
    }
}

impl UploadConfig {
    /// Snapshot the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup (tests pass a map instead of
    /// mutating the process environment).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let smtp_user = get("SMTP_USER");
        Self {
            dropbox: DropboxConfig {
                access_token: get("DROPBOX_ACCESS_TOKEN"),
                content_url: get("DROPBOX_CONTENT_URL")
                    .unwrap_or_else(|| DEFAULT_DROPBOX_CONTENT_URL.into()),
                folder: get("DROPBOX_UPLOAD_FOLDER").unwrap_or_else(|| DEFAULT_DROPBOX_FOLDER.into()),
            },
            ftp: FtpConfig {
                host: get("FTP_HOST"),
                user: get("FTP_USER"),
                password: get("FTP_PASSWORD"),
                port: get("FTP_PORT"),
                protocol: get("FTP_PROTOCOL"),
                remote_path: get("FTP_REMOTE_PATH")
                    .unwrap_or_else(|| DEFAULT_FTP_REMOTE_PATH.into()),
                secure: get("FTP_SECURE").is_some_and(|v| is_enabled_flag(&v)),
            },
            smtp: SmtpConfig {
                host: get("SMTP_HOST"),
                port: get("SMTP_PORT"),
                from: get("EMAIL_FROM").or_else(|| smtp_user.clone()),
                user: smtp_user,
                password: get("SMTP_PASS"),
                to: get("EMAIL_TO"),
            },
            slack: SlackConfig {
                webhook_url: get("SLACK_WEBHOOK_URL"),
                channel: get("SLACK_CHANNEL"),
                username: get("SLACK_USERNAME"),
            },
        }
    }
}

/// `FTP_SECURE` is exact-match: only `"true"` and `"1"` enable TLS.
pub fn is_enabled_flag(value: &str) -> bool {
    matches!(value, "true" | "1")
}

/// Where the handlers get their `UploadConfig` from on each request.
#[derive(Clone)]
pub enum ConfigSource {
    Env,
    Fixed(UploadConfig),
}

impl ConfigSource {
    pub fn load(&self) -> UploadConfig {
        match self {
            ConfigSource::Env => UploadConfig::from_env(),
            ConfigSource::Fixed(cfg) => cfg.clone(),
        }
    }
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() { "<set>" } else { "<unset>" }
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("dropbox", &self.dropbox)
            .field("ftp", &self.ftp)
            .field("smtp", &self.smtp)
            .field("slack", &self.slack)
            .finish()
    }
}

impl fmt::Debug for DropboxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropboxConfig")
            .field("access_token", &redact(&self.access_token))
            .field("content_url", &self.content_url)
            .field("folder", &self.folder)
            .finish()
    }
}

impl fmt::Debug for FtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("port", &self.port)
            .field("protocol", &self.protocol)
            .field("remote_path", &self.remote_path)
            .field("secure", &self.secure)
            .finish()
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("to", &self.to)
            .field("from", &self.from)
            .finish()
    }
}

impl fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackConfig")
            .field("webhook_url", &redact(&self.webhook_url))
            .field("channel", &self.channel)
            .field("username", &self.username)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> UploadConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        UploadConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = lookup(&[]);
        assert!(cfg.dropbox.access_token.is_none());
        assert_eq!(cfg.dropbox.content_url, DEFAULT_DROPBOX_CONTENT_URL);
        assert_eq!(cfg.dropbox.folder, "/TestStock");
        assert_eq!(cfg.ftp.remote_path, "/");
        assert!(!cfg.ftp.secure);
        assert!(cfg.slack.webhook_url.is_none());
    }

    #[test]
    fn empty_values_count_as_absent() {
        let cfg = lookup(&[("DROPBOX_ACCESS_TOKEN", ""), ("FTP_REMOTE_PATH", "")]);
        assert!(cfg.dropbox.access_token.is_none());
        assert_eq!(cfg.ftp.remote_path, "/");
    }

    #[test]
    fn ftp_secure_uses_exact_match() {
        for (raw, expected) in [
            ("true", true),
            ("1", true),
            ("True", false),
            ("0", false),
            ("false", false),
            ("yes", false),
        ] {
            let cfg = lookup(&[("FTP_SECURE", raw)]);
            assert_eq!(cfg.ftp.secure, expected, "FTP_SECURE={raw}");
        }
    }

    #[test]
    fn email_from_falls_back_to_smtp_user() {
        let cfg = lookup(&[("SMTP_USER", "bot@example.com")]);
        assert_eq!(cfg.smtp.from.as_deref(), Some("bot@example.com"));

        let cfg = lookup(&[
            ("SMTP_USER", "bot@example.com"),
            ("EMAIL_FROM", "noreply@example.com"),
        ]);
        assert_eq!(cfg.smtp.from.as_deref(), Some("noreply@example.com"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = lookup(&[
            ("DROPBOX_ACCESS_TOKEN", "sl.very-secret"),
            ("FTP_PASSWORD", "hunter2"),
            ("SMTP_PASS", "app-password"),
        ]);
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("sl.very-secret"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("app-password"));
        assert!(rendered.contains("<set>"));
    }
}

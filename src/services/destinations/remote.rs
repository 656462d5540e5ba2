//! Connection settings shared by the SFTP and FTP adapters.

use crate::{config::FtpConfig, errors::UploadError};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Sftp,
    Ftp,
}

impl Protocol {
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Sftp => 22,
            Protocol::Ftp => 21,
        }
    }
}

/// Validated FTP/SFTP settings for one request.
#[derive(Clone)]
pub struct RemoteSettings {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub remote_dir: String,
    /// Explicit FTPS (`AUTH TLS`). Ignored for SFTP.
    pub secure: bool,
}

impl RemoteSettings {
    /// Resolve protocol and port, and require host and credentials.
    ///
    /// Protocol precedence: `FTP_PROTOCOL` if set, else port 22 means SFTP
    /// and any other port FTP. With neither set the default is SFTP on 22.
    pub fn from_config(config: &FtpConfig) -> Result<Self, UploadError> {
        let (Some(host), Some(user), Some(password)) = (
            config.host.clone(),
            config.user.clone(),
            config.password.clone(),
        ) else {
            return Err(UploadError::Config(
                "FTP configuration incomplete. Check FTP_HOST, FTP_USER, and FTP_PASSWORD environment variables."
                    .into(),
            ));
        };

        let explicit_port = config
            .port
            .as_deref()
            .map(|raw| {
                raw.trim().parse::<u16>().map_err(|_| {
                    UploadError::Config(format!("FTP_PORT value `{}` is not a valid port", raw))
                })
            })
            .transpose()?;

        let explicit_protocol = config
            .protocol
            .as_deref()
            .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
                "sftp" => Ok(Protocol::Sftp),
                "ftp" => Ok(Protocol::Ftp),
                _ => Err(UploadError::Config(format!(
                    "FTP_PROTOCOL value `{}` is not supported; use `sftp` or `ftp`",
                    raw
                ))),
            })
            .transpose()?;

        let (protocol, port) = match (explicit_protocol, explicit_port) {
            (Some(protocol), Some(port)) => (protocol, port),
            (Some(protocol), None) => (protocol, protocol.default_port()),
            (None, Some(22)) => (Protocol::Sftp, 22),
            (None, Some(port)) => (Protocol::Ftp, port),
            (None, None) => (Protocol::Sftp, Protocol::Sftp.default_port()),
        };

        Ok(Self {
            protocol,
            host,
            port,
            user,
            password,
            remote_dir: config.remote_path.clone(),
            secure: config.secure,
        })
    }

    /// Whether the FTP session negotiates TLS before logging in.
    pub fn uses_tls(&self) -> bool {
        self.protocol == Protocol::Ftp && self.secure
    }
}

impl fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("remote_dir", &self.remote_dir)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadConfig;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<RemoteSettings, UploadError> {
        let mut map: HashMap<&str, &str> = [
            ("FTP_HOST", "files.example.com"),
            ("FTP_USER", "uploader"),
            ("FTP_PASSWORD", "secret"),
        ]
        .into_iter()
        .collect();
        map.extend(pairs.iter().copied());
        let cfg = UploadConfig::from_lookup(|key| map.get(key).map(|v| v.to_string()));
        RemoteSettings::from_config(&cfg.ftp)
    }

    #[test]
    fn defaults_to_sftp_on_22() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.protocol, Protocol::Sftp);
        assert_eq!(s.port, 22);
        assert_eq!(s.remote_dir, "/");
    }

    #[test]
    fn port_selects_protocol() {
        assert_eq!(settings(&[("FTP_PORT", "22")]).unwrap().protocol, Protocol::Sftp);
        assert_eq!(settings(&[("FTP_PORT", "21")]).unwrap().protocol, Protocol::Ftp);
        assert_eq!(settings(&[("FTP_PORT", "2121")]).unwrap().protocol, Protocol::Ftp);
    }

    #[test]
    fn explicit_protocol_wins_over_port() {
        let s = settings(&[("FTP_PORT", "22"), ("FTP_PROTOCOL", "ftp")]).unwrap();
        assert_eq!(s.protocol, Protocol::Ftp);
        assert_eq!(s.port, 22);

        let s = settings(&[("FTP_PROTOCOL", "ftp")]).unwrap();
        assert_eq!(s.port, 21);

        let s = settings(&[("FTP_PORT", "2222"), ("FTP_PROTOCOL", "SFTP")]).unwrap();
        assert_eq!(s.protocol, Protocol::Sftp);
        assert_eq!(s.port, 2222);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(settings(&[("FTP_PORT", "ftp")]), Err(UploadError::Config(_))));
        assert!(matches!(settings(&[("FTP_PROTOCOL", "scp")]), Err(UploadError::Config(_))));
    }

    #[test]
    fn tls_follows_secure_flag_exactly() {
        let ftp = [("FTP_PROTOCOL", "ftp")];
        assert!(!settings(&ftp).unwrap().uses_tls());
        for (raw, expected) in [("true", true), ("1", true), ("True", false), ("0", false), ("false", false)] {
            let s = settings(&[ftp[0], ("FTP_SECURE", raw)]).unwrap();
            assert_eq!(s.uses_tls(), expected, "FTP_SECURE={raw}");
        }
        // SFTP is encrypted by SSH; the FTPS switch does not apply.
        assert!(!settings(&[("FTP_SECURE", "true")]).unwrap().uses_tls());
    }

    #[test]
    fn missing_credentials_fail_fast() {
        let cfg = UploadConfig::default();
        let err = RemoteSettings::from_config(&cfg.ftp).unwrap_err();
        assert!(err.to_string().starts_with("FTP configuration incomplete"));
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", settings(&[]).unwrap());
        assert!(!rendered.contains("secret"));
    }
}

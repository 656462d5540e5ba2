use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use tracing::warn;

use super::{NotificationChannel, UploadEvent};
use crate::{config::SmtpConfig, errors::NotifyError};

/// Port on which SMTP expects TLS from the first byte.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP notifier. Only exists when host, port, user, password, recipient and
/// sender are all configured.
pub struct EmailNotifier {
    host: String,
    port: u16,
    user: String,
    password: String,
    to: String,
    from: String,
}

impl EmailNotifier {
    pub fn from_config(config: &SmtpConfig) -> Option<Self> {
        let host = config.host.clone()?;
        let raw_port = config.port.clone()?;
        let user = config.user.clone()?;
        let password = config.password.clone()?;
        let to = config.to.clone()?;
        let from = config.from.clone()?;

        let Ok(port) = raw_port.trim().parse::<u16>() else {
            warn!(value = %raw_port, "SMTP_PORT is not a valid port; email notification disabled");
            return None;
        };

        Some(Self {
            host,
            port,
            user,
            password,
            to,
            from,
        })
    }

    pub fn implicit_tls(&self) -> bool {
        self.port == IMPLICIT_TLS_PORT
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let creds = Credentials::new(self.user.clone(), self.password.clone());

        let builder = if self.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
                .map_err(|e| NotifyError::Smtp(e.to_string()))?
        } else {
            let tls = TlsParameters::new(self.host.clone())
                .map_err(|e| NotifyError::Smtp(e.to_string()))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
                .tls(Tls::Opportunistic(tls))
        };

        Ok(builder.port(self.port).credentials(creds).build())
    }

    fn message(&self, event: &UploadEvent) -> Result<Message, NotifyError> {
        let from = self.from.parse().map_err(|e: lettre::address::AddressError| {
            NotifyError::Address {
                address: self.from.clone(),
                reason: e.to_string(),
            }
        })?;
        let to = self.to.parse().map_err(|e: lettre::address::AddressError| {
            NotifyError::Address {
                address: self.to.clone(),
                reason: e.to_string(),
            }
        })?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(event.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(event.body())
            .map_err(|e| NotifyError::Message(e.to_string()))
    }
}

#[async_trait]
impl NotificationChannel for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, event: &UploadEvent) -> Result<(), NotifyError> {
        let message = self.message(event)?;
        self.transport()?
            .send(message)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;
        Ok(())
    }
}

impl fmt::Debug for EmailNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailNotifier")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("to", &self.to)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

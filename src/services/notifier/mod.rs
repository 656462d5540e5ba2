//! Best-effort notifications sent after a successful transfer.
//!
//! Channels are enabled by configuration alone: a channel whose required
//! settings are missing is skipped with a warning. Failures are logged and
//! never reach the HTTP response.

pub mod email;
pub mod slack;

use crate::{config::UploadConfig, errors::NotifyError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, warn};

pub use email::EmailNotifier;
pub use slack::SlackNotifier;

/// What the notification is about.
#[derive(Debug, Clone)]
pub struct UploadEvent {
    pub file_name: String,
    pub path: String,
    /// `Dropbox` or `Remote`, used as `<label> path: ...`.
    pub path_label: &'static str,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadEvent {
    pub fn subject(&self) -> &'static str {
        "New TestStock CSV uploaded"
    }

    /// Plain-text body shared by the email and Slack channels.
    pub fn body(&self) -> String {
        format!(
            "A new TestStock CSV file has been uploaded.\n\nFile name: {}\n{} path: {}\nTime: {}\n",
            self.file_name,
            self.path_label,
            self.path,
            self.uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, event: &UploadEvent) -> Result<(), NotifyError>;
}

#[derive(Default)]
pub struct Notifier {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl Notifier {
    pub fn from_config(config: &UploadConfig, http: &reqwest::Client) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        match EmailNotifier::from_config(&config.smtp) {
            Some(email) => channels.push(Box::new(email)),
            None => warn!("Email notification not configured (missing SMTP_* or EMAIL_* env vars)."),
        }
        match SlackNotifier::from_config(&config.slack, http.clone()) {
            Some(slack) => channels.push(Box::new(slack)),
            None => warn!("Slack notification not configured (SLACK_WEBHOOK_URL not set)."),
        }

        Self { channels }
    }

    pub fn with_channel(mut self, channel: Box<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Send on every channel, one after the other. Each result is logged and
    /// returned for inspection; none of them is an error for the caller.
    pub async fn notify(&self, event: &UploadEvent) -> Vec<(&'static str, Result<(), NotifyError>)> {
        let mut results = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let result = channel.send(event).await;
            match &result {
                Ok(()) => info!(channel = channel.name(), path = %event.path, "notification sent"),
                Err(err) => error!(channel = channel.name(), error = %err, "Failed to send notification"),
            }
            results.push((channel.name(), result));
        }
        results
    }

    /// Fire and forget: the upload response does not wait for this.
    pub fn spawn(self, event: UploadEvent) -> JoinHandle<()> {
        tokio::spawn(
            async move {
                self.notify(&event).await;
            }
            .in_current_span(),
        )
    }
}

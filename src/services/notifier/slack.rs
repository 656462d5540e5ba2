use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{NotificationChannel, UploadEvent};
use crate::{config::SlackConfig, errors::NotifyError};

#[derive(Debug, Serialize)]
struct SlackPayload<'a> {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

/// Slack incoming-webhook notifier. `channel` and `username` override the
/// webhook's own defaults when set.
pub struct SlackNotifier {
    webhook_url: String,
    channel: Option<String>,
    username: Option<String>,
    client: Client,
}

impl SlackNotifier {
    pub fn from_config(config: &SlackConfig, client: Client) -> Option<Self> {
        Some(Self {
            webhook_url: config.webhook_url.clone()?,
            channel: config.channel.clone(),
            username: config.username.clone(),
            client,
        })
    }

    fn text(event: &UploadEvent) -> String {
        format!("*{}*\n{}", event.subject(), event.body())
    }
}

#[async_trait]
impl NotificationChannel for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, event: &UploadEvent) -> Result<(), NotifyError> {
        let payload = SlackPayload {
            text: Self::text(event),
            channel: self.channel.as_deref(),
            username: self.username.as_deref(),
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::SlackConnection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(NotifyError::SlackRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

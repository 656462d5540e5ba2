//! RelayService: runs one upload (extract, name, transfer, notify).
//!
//! Steps run strictly in sequence. Configuration is loaded fresh for every
//! call; nothing is shared between requests except the HTTP connection
//! pool.

use crate::{
    config::{ConfigSource, UploadConfig},
    errors::UploadError,
    models::{payload::UploadRequest, target::UploadOutcome},
    services::{
        destinations::DestinationAdapter,
        extractor::ExtractMode,
        notifier::{Notifier, UploadEvent},
    },
};
use chrono::Utc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct RelayService {
    config: ConfigSource,
    http: reqwest::Client,
}

impl RelayService {
    pub fn new(config: ConfigSource) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Run one upload with the adapter produced by `build`.
    ///
    /// The adapter is only built once the payload is known to be valid, and
    /// building it is where missing credentials are reported.
    pub async fn upload<F>(
        &self,
        extraction: ExtractMode,
        request: &UploadRequest,
        build: F,
    ) -> Result<UploadOutcome, UploadError>
    where
        F: FnOnce(&UploadConfig) -> Result<Box<dyn DestinationAdapter>, UploadError>,
    {
        let config = self.config.load();

        let payload = extraction.extract(request).await?;
        debug!(
            bytes = payload.content.len(),
            original_name = ?payload.original_name,
            "payload extracted"
        );

        let adapter = build(&config)?;
        let now = Utc::now();
        let target = adapter.target(&payload, now);
        info!(
            adapter = adapter.name(),
            path = %target.remote_path,
            policy = ?target.overwrite_policy,
            "starting transfer"
        );

        let outcome = adapter.transfer(&payload, &target).await?;

        let notifier = Notifier::from_config(&config, &self.http);
        if !notifier.is_empty() {
            // Result only matters for logs; the response does not wait on it.
            let _notification = notifier.spawn(UploadEvent {
                file_name: outcome.name.clone(),
                path: outcome.path.clone(),
                path_label: adapter.path_label(),
                uploaded_at: now,
            });
        }

        Ok(outcome)
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::{fmt::Debug, time::Duration};

use crate::{config::NotificationMethod, error::NotificationError};

/// Delivery channel for a finished report.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    async fn send_notification(&self, subject: &str, body: &str) -> Result<(), NotificationError>;
}

/// Writes the report to the log.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_notification(&self, subject: &str, body: &str) -> Result<(), NotificationError> {
        tracing::info!(%subject, "\n{body}");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    body: &'a str,
}

/// POSTs `{"subject": .., "body": ..}` as JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    http: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotificationError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { url: url.into(), http })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_notification(&self, subject: &str, body: &str) -> Result<(), NotificationError> {
        let res = self
            .http
            .post(&self.url)
            .json(&WebhookPayload { subject, body })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected { status: status.as_u16(), body });
        }

        tracing::debug!(url = %self.url, "webhook notification delivered");
        Ok(())
    }
}

/// Fans a notification out to every channel.
///
/// All channels are attempted even when an earlier one fails.
#[derive(Debug, Default)]
pub struct MultiNotifier {
    channels: Vec<Box<dyn Notifier>>,
}

impl MultiNotifier {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[async_trait]
impl Notifier for MultiNotifier {
    async fn send_notification(&self, subject: &str, body: &str) -> Result<(), NotificationError> {
        let mut failed = 0;

        for channel in &self.channels {
            if let Err(err) = channel.send_notification(subject, body).await {
                tracing::error!(?channel, error = %err, "notification channel failed");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(NotificationError::Partial { failed, total: self.channels.len() });
        }
        Ok(())
    }
}

/// Build the composite notifier described by `notification_methods`.
pub fn notifier_from_config(
    methods: &[NotificationMethod],
) -> Result<MultiNotifier, NotificationError> {
    let channels = methods
        .iter()
        .map(|method| {
            let channel: Box<dyn Notifier> = match method {
                NotificationMethod::Console => Box::new(ConsoleNotifier),
                NotificationMethod::Webhook { url } => Box::new(WebhookNotifier::new(url.clone())?),
            };
            Ok::<_, NotificationError>(channel)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MultiNotifier::new(channels))
}

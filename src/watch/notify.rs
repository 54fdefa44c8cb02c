//! Outbound delivery of price alerts.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use wreq::Client;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Transport(#[from] wreq::Error),
    #[error("notification endpoint answered {0}")]
    Status(u16),
}

/// Delivery seam for price alerts - enables recording fakes for tests.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

/// Sends alerts through the Telegram Bot API.
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Creates a notifier against the production Telegram API.
    pub fn new(bot_token: String, chat_id: String) -> Result<Self> {
        Self::with_base_url(bot_token, chat_id, "https://api.telegram.org".to_string())
    }

    /// Creates a notifier with a custom API base URL (for testing).
    pub fn with_base_url(bot_token: String, chat_id: String, base_url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { client, base_url, bot_token, chat_id })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let url = format!(
            "{}/bot{}/sendMessage?chat_id={}&text={}&disable_web_page_preview=true",
            self.base_url,
            self.bot_token,
            self.chat_id,
            urlencoding::encode(message)
        );

        debug!("POST {}/bot<token>/sendMessage", self.base_url);
        let response = self.client.post(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        info!("Sent notification to chat {}", self.chat_id);
        Ok(())
    }
}

/// Logs alerts instead of delivering them. Stands in when Telegram is
/// unconfigured so the watch cycle still runs end to end.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        info!("Notification (not delivered): {}", message);
        Ok(())
    }
}

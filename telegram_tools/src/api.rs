use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::Client;
use serde::Deserialize;

use crate::{config::TelegramConfig, error::TelegramApiError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bot API client. Messages use HTML parse mode, matching the markup produced by the alert formatters.
#[derive(Clone)]
pub struct TelegramApi {
    config: TelegramConfig,
    client: Arc<Client>,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramApi {
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TelegramApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.config.api_url, self.config.bot_token.reveal())
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramApiError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        let response = self
            .client
            .post(self.url())
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramApiError::SendError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(TelegramApiError::QueryError { status, message });
        }
        let result =
            response.json::<SendMessageResponse>().await.map_err(|e| TelegramApiError::SendError(e.to_string()))?;
        if !result.ok {
            return Err(TelegramApiError::SendError(result.description.unwrap_or_else(|| "unknown error".to_string())));
        }
        trace!("📨️ Message delivered to chat {chat_id}");
        Ok(())
    }

    /// Delivery is fire-and-forget per recipient. A failure for one chat id is logged and must never block
    /// delivery to the remaining recipients.
    pub async fn broadcast(&self, chat_ids: &[String], text: &str) {
        debug!("📨️ Broadcasting message to {} recipient(s)", chat_ids.len());
        for chat_id in chat_ids {
            match self.send_message(chat_id, text).await {
                Ok(()) => debug!("📨️ Message sent to chat {chat_id}"),
                Err(e) => error!("📨️ Failed to send message to chat {chat_id}: {e}"),
            }
        }
    }
}

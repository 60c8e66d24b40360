use log::*;
use telegram_tools::TelegramApi;

use crate::{config::NotificationConfig, errors::ServerError};

/// Where the pipeline's user-visible output goes. The settlement and report workers only ever talk to this
/// trait; the Telegram transport behind it is interchangeable.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Deliver an operator-facing alert to every configured recipient. Per-recipient failures are swallowed.
    async fn broadcast(&self, text: &str);
    /// Best-effort delivery of diagnostic detail to the debug-only recipient.
    async fn debug_alert(&self, text: &str);
}

#[derive(Clone)]
pub struct TelegramNotifier {
    api: TelegramApi,
    chat_ids: Vec<String>,
    debug_chat_id: Option<String>,
}

impl TelegramNotifier {
    pub fn try_new(config: &NotificationConfig) -> Result<Self, ServerError> {
        let api = TelegramApi::new(config.telegram.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api, chat_ids: config.chat_ids.clone(), debug_chat_id: config.debug_chat_id.clone() })
    }
}

impl Notifier for TelegramNotifier {
    async fn broadcast(&self, text: &str) {
        self.api.broadcast(&self.chat_ids, text).await;
    }

    async fn debug_alert(&self, text: &str) {
        match &self.debug_chat_id {
            Some(chat_id) => {
                if let Err(e) = self.api.send_message(chat_id, text).await {
                    error!("🚨️ Could not deliver the diagnostic alert: {e}. Original alert: {text}");
                }
            },
            None => warn!("🚨️ No debug recipient configured. Diagnostic alert: {text}"),
        }
    }
}

use log::*;
use msr_common::Secret;

pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Default)]
pub struct TelegramConfig {
    pub bot_token: Secret<String>,
    pub api_url: String,
}

impl TelegramConfig {
    pub fn new(bot_token: Secret<String>) -> Self {
        Self { bot_token, api_url: DEFAULT_TELEGRAM_API_URL.to_string() }
    }

    pub fn new_from_env_or_default() -> Self {
        let bot_token = Secret::new(std::env::var("MSR_TELEGRAM_BOT_TOKEN").unwrap_or_else(|_| {
            warn!("MSR_TELEGRAM_BOT_TOKEN not set, using (probably useless) default");
            "0000000000:XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX".to_string()
        }));
        let api_url = std::env::var("MSR_TELEGRAM_API_URL").unwrap_or_else(|_| DEFAULT_TELEGRAM_API_URL.to_string());
        Self { bot_token, api_url }
    }
}
